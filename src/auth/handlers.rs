use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, SecretResponse, SessionResponse},
        extractors::{AuthUser, BearerToken},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/login/", post(login))
        .route("/session/", post(renew_session))
        .route("/secret/", get(secret))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<Json<SessionResponse>, ApiError> {
    let tokens = state
        .auth
        .register(
            payload.email.as_deref(),
            payload.password.as_deref(),
            payload.username.as_deref(),
        )
        .await?;
    Ok(Json(tokens.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<SessionResponse>, ApiError> {
    let tokens = state
        .auth
        .login(payload.email.as_deref(), payload.password.as_deref())
        .await?;
    Ok(Json(tokens.into()))
}

/// The update token travels in the `Authorization` header.
#[instrument(skip(state, update_token))]
pub async fn renew_session(
    State(state): State<AppState>,
    BearerToken(update_token): BearerToken,
) -> Result<Json<SessionResponse>, ApiError> {
    let tokens = state.auth.renew(&update_token).await?;
    Ok(Json(tokens.into()))
}

#[instrument(skip(user))]
pub async fn secret(AuthUser(user): AuthUser) -> Json<SecretResponse> {
    Json(SecretResponse {
        message: "You have successfully implemented sessions.".into(),
        username: user.username,
    })
}
