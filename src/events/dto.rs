use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::repo_types::NewEvent;

/// `{"success": true, "data": ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkEventsRequest {
    pub data: Vec<NewEvent>,
}

#[derive(Debug, Deserialize)]
pub struct AttachEventRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
}
