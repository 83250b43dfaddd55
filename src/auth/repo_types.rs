use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    #[serde(skip_serializing)]
    pub session_token: String,
    pub session_expiration: OffsetDateTime,
    #[serde(skip_serializing)]
    pub update_token: String,
    pub created_at: OffsetDateTime,
}

/// A freshly issued session/update token pair with the session's expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub session_token: String,
    pub update_token: String,
    pub session_expiration: OffsetDateTime,
}

/// Fields needed to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub tokens: IssuedTokens,
}

impl User {
    pub fn tokens(&self) -> IssuedTokens {
        IssuedTokens {
            session_token: self.session_token.clone(),
            update_token: self.update_token.clone(),
            session_expiration: self.session_expiration,
        }
    }
}
