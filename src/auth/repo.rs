use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{IssuedTokens, NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column (email or one of the tokens) already holds this value.
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence seam for user credentials and their inline token triple.
///
/// `create` and `rotate_tokens` must each be atomic: two concurrent creates for
/// one email yield exactly one success, and two concurrent rotations presenting
/// the same update token yield exactly one `Some`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_session_token(&self, token: &str) -> anyhow::Result<Option<User>>;

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Overwrite the token triple of the user with `user_id`.
    async fn replace_tokens(
        &self,
        user_id: Uuid,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, StoreError>;

    /// Swap the triple of whichever user currently holds `current_update_token`.
    /// `None` when no user holds it, including a token already consumed.
    async fn rotate_tokens(
        &self,
        current_update_token: &str,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, StoreError>;
}

const USER_COLUMNS: &str = "id, email, username, password_hash, session_token, \
                            session_expiration, update_token, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(e: sqlx::Error, what: &'static str) -> StoreError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        other => StoreError::Backend(anyhow::Error::new(other).context(what)),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_session_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE session_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("find user by session token")?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash,
                               session_token, session_expiration, update_token)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.tokens.session_token)
        .bind(new_user.tokens.session_expiration)
        .bind(&new_user.tokens.update_token)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_err(e, "insert user"))?;
        Ok(user)
    }

    async fn replace_tokens(
        &self,
        user_id: Uuid,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET session_token = $2, session_expiration = $3, update_token = $4
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&tokens.session_token)
        .bind(tokens.session_expiration)
        .bind(&tokens.update_token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_err(e, "replace user tokens"))?;
        Ok(user)
    }

    async fn rotate_tokens(
        &self,
        current_update_token: &str,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, StoreError> {
        // Single statement: a concurrent rotation blocks on the row lock and
        // then re-evaluates the WHERE clause against the new token.
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET session_token = $2, session_expiration = $3, update_token = $4
             WHERE update_token = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(current_update_token)
        .bind(&tokens.session_token)
        .bind(tokens.session_expiration)
        .bind(&tokens.update_token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_err(e, "rotate user tokens"))?;
        Ok(user)
    }
}
