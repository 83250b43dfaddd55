// In-memory credential store for dev mode and tests.
// Every mutation holds one write lock across check and write, which gives the
// same atomicity the Postgres unique indexes and single-statement UPDATEs give.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::{StoreError, UserStore};
use crate::auth::repo_types::{IssuedTokens, NewUser, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_session: HashMap<String, Uuid>,
    by_update: HashMap<String, Uuid>,
}

impl Tables {
    fn token_taken(&self, tokens: &IssuedTokens, owner: Option<Uuid>) -> bool {
        let held_by_other = |id: Option<&Uuid>| id.is_some_and(|id| Some(*id) != owner);
        held_by_other(self.by_session.get(&tokens.session_token))
            || held_by_other(self.by_update.get(&tokens.update_token))
    }

    fn swap_tokens(&mut self, id: Uuid, tokens: &IssuedTokens) -> Option<User> {
        let user = self.users.get_mut(&id)?;
        self.by_session.remove(&user.session_token);
        self.by_update.remove(&user.update_token);
        user.session_token = tokens.session_token.clone();
        user.update_token = tokens.update_token.clone();
        user.session_expiration = tokens.session_expiration;
        self.by_session.insert(user.session_token.clone(), id);
        self.by_update.insert(user.update_token.clone(), id);
        Some(user.clone())
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a user's session expiration, e.g. into the past.
    #[cfg(test)]
    pub fn set_session_expiration(&self, user_id: Uuid, at: OffsetDateTime) {
        if let Some(user) = self.tables.write().users.get_mut(&user_id) {
            user.session_expiration = at;
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_session_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .by_session
            .get(token)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write();
        if tables.by_email.contains_key(&new_user.email) || tables.token_taken(&new_user.tokens, None)
        {
            return Err(StoreError::Conflict);
        }

        let id = Uuid::new_v4();
        let user = User {
            id,
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            session_token: new_user.tokens.session_token,
            session_expiration: new_user.tokens.session_expiration,
            update_token: new_user.tokens.update_token,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.by_email.insert(user.email.clone(), id);
        tables.by_session.insert(user.session_token.clone(), id);
        tables.by_update.insert(user.update_token.clone(), id);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn replace_tokens(
        &self,
        user_id: Uuid,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write();
        if tables.token_taken(tokens, Some(user_id)) {
            return Err(StoreError::Conflict);
        }
        Ok(tables.swap_tokens(user_id, tokens))
    }

    async fn rotate_tokens(
        &self,
        current_update_token: &str,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write();
        let Some(&id) = tables.by_update.get(current_update_token) else {
            return Ok(None);
        };
        if tables.token_taken(tokens, Some(id)) {
            return Err(StoreError::Conflict);
        }
        Ok(tables.swap_tokens(id, tokens))
    }
}
