use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::error::AuthError;

/// Single-field failure body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Missing authorization header.")]
    MissingAuthHeader,
    #[error("Invalid authorization header.")]
    InvalidAuthHeader,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("No food offered in event!")]
    NoFood,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::InvalidInput) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Auth(AuthError::AlreadyExists) => StatusCode::CONFLICT,
            ApiError::Auth(AuthError::InvalidCredentials | AuthError::InvalidToken)
            | ApiError::MissingAuthHeader
            | ApiError::InvalidAuthHeader => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NoFood => StatusCode::NOT_ACCEPTABLE,
            ApiError::Auth(AuthError::Internal(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Extractor rejections carry axum's own text; reshape them into the error body.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(e) | ApiError::Auth(AuthError::Internal(e)) = &self {
            error!(error = %e, "request failed");
        }
        // Internal details stay in the logs.
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
