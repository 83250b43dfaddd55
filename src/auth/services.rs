use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::auth::{
    error::AuthError,
    password::{hash_password, verify_password},
    repo::{StoreError, UserStore},
    repo_types::{IssuedTokens, NewUser, User},
    session::{self, SessionStatus},
    tokens::TokenIssuer,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Treats missing and blank values alike.
fn required(value: Option<&str>) -> Result<&str, AuthError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AuthError::InvalidInput),
    }
}

/// Facade over the credential store, token issuer and session validator.
/// This is the only entry point the HTTP layer uses for authentication.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    issuer: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, issuer: TokenIssuer) -> Self {
        Self { store, issuer }
    }

    pub async fn register(
        &self,
        email: Option<&str>,
        password: Option<&str>,
        username: Option<&str>,
    ) -> Result<IssuedTokens, AuthError> {
        let email = normalize_email(required(email)?);
        let password = required(password)?;
        if !is_valid_email(&email) {
            warn!(email = %email, "register with malformed email");
            return Err(AuthError::InvalidInput);
        }

        let password_hash = hash_password(password)?;
        let new_user = NewUser {
            email,
            username: username.map(str::to_owned),
            password_hash,
            tokens: self.issuer.issue()?,
        };

        match self.store.create(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "user registered");
                Ok(user.tokens())
            }
            Err(StoreError::Conflict) => {
                warn!("email already registered");
                Err(AuthError::AlreadyExists)
            }
            Err(StoreError::Backend(e)) => {
                error!(error = %e, "create user failed");
                Err(AuthError::Internal(e))
            }
        }
    }

    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<IssuedTokens, AuthError> {
        let email = normalize_email(required(email)?);
        let password = required(password)?;

        let user = match self.store.find_by_email(&email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                // Keeps unknown-email latency close to a real verify.
                let _ = hash_password(password);
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(AuthError::Internal(e));
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issuer.issue()?;
        let user = self
            .store
            .replace_tokens(user.id, &tokens)
            .await
            .map_err(internal)?
            .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("user vanished during login")))?;

        info!(user_id = %user.id, "user logged in");
        Ok(user.tokens())
    }

    /// Exchange the current update token for a fresh triple. The presented
    /// token and the session it was issued with stop working immediately.
    pub async fn renew(&self, update_token: &str) -> Result<IssuedTokens, AuthError> {
        if update_token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let tokens = self.issuer.issue()?;
        match self.store.rotate_tokens(update_token, &tokens).await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "session renewed");
                Ok(user.tokens())
            }
            Ok(None) => {
                warn!("renewal with unknown or consumed update token");
                Err(AuthError::InvalidToken)
            }
            Err(e) => Err(internal(e)),
        }
    }

    pub async fn authenticate(&self, session_token: &str) -> Result<User, AuthError> {
        self.authenticate_at(session_token, OffsetDateTime::now_utc())
            .await
    }

    async fn authenticate_at(
        &self,
        session_token: &str,
        now: OffsetDateTime,
    ) -> Result<User, AuthError> {
        let user = self
            .store
            .find_by_session_token(session_token)
            .await
            .map_err(|e| {
                error!(error = %e, "find_by_session_token failed");
                AuthError::Internal(e)
            })?
            .ok_or(AuthError::InvalidToken)?;

        match session::validate(session_token, &user, now) {
            SessionStatus::Valid => Ok(user),
            status => {
                warn!(user_id = %user.id, ?status, "session rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }
}

fn internal(e: StoreError) -> AuthError {
    error!(error = %e, "user store write failed");
    match e {
        StoreError::Backend(e) => AuthError::Internal(e),
        StoreError::Conflict => AuthError::Internal(anyhow::anyhow!("token collision")),
    }
}
