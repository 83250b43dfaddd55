use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::auth::{repo_types::User, services::AuthService};
use crate::error::ApiError;

/// Pulls `<token>` out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| ApiError::InvalidAuthHeader)?;

    let token = raw.trim_start().strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(ApiError::InvalidAuthHeader);
    }
    Ok(token.to_owned())
}

/// Raw bearer token, not yet checked against the store.
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers).map(BearerToken)
    }
}

/// The user owning a currently valid session token.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = AuthService::from_ref(state).authenticate(&token).await?;
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn strips_bearer_prefix_and_whitespace() {
        assert_eq!(bearer_token(&headers("Bearer abc123")).unwrap(), "abc123");
        assert_eq!(bearer_token(&headers("Bearer   abc123  ")).unwrap(), "abc123");
    }

    #[test]
    fn bare_token_is_accepted() {
        assert_eq!(bearer_token(&headers("abc123")).unwrap(), "abc123");
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(ApiError::MissingAuthHeader)
        ));
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            bearer_token(&headers("Bearer    ")),
            Err(ApiError::InvalidAuthHeader)
        ));
        assert!(matches!(bearer_token(&headers("")), Err(ApiError::InvalidAuthHeader)));
    }
}
