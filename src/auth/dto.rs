use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;

use crate::auth::repo_types::IssuedTokens;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned after register, login or renewal.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_token: String,
    pub session_expiration: String,
    pub update_token: String,
}

impl From<IssuedTokens> for SessionResponse {
    fn from(t: IssuedTokens) -> Self {
        let session_expiration = t
            .session_expiration
            .format(&Rfc3339)
            .unwrap_or_else(|_| t.session_expiration.to_string());
        Self {
            session_token: t.session_token,
            session_expiration,
            update_token: t.update_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SecretResponse {
    pub message: String,
    pub username: Option<String>,
}
