use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub name: Option<String>,
    pub location: Option<String>,
    pub datetime: Option<String>,
    pub content: Option<String>,
    pub longitude: Option<String>,
    pub latitude: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Event fields as submitted by clients; coordinates may arrive as numbers.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NewEvent {
    pub name: Option<String>,
    pub location: Option<String>,
    pub datetime: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub longitude: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub latitude: Option<String>,
}

fn string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(de)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}
