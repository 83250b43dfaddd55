use anyhow::Context;
use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::repo_types::IssuedTokens;
use crate::config::SessionConfig;

/// Random bytes per token; hex encoding doubles this to 64 characters.
pub const TOKEN_BYTES: usize = 32;

/// Mints opaque session/update tokens. Uniqueness rests on the 256-bit random
/// space; the store's unique indexes only back it up.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    session_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(session_ttl: Duration) -> Self {
        Self { session_ttl }
    }

    pub fn issue(&self) -> anyhow::Result<IssuedTokens> {
        self.issue_at(OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, now: OffsetDateTime) -> anyhow::Result<IssuedTokens> {
        let session_expiration = now
            .checked_add(self.session_ttl)
            .context("session expiration out of range")?;
        let tokens = IssuedTokens {
            session_token: generate_token(),
            update_token: generate_token(),
            session_expiration,
        };
        debug!(expires_at = %tokens.session_expiration, "session tokens issued");
        Ok(tokens)
    }
}

impl From<&SessionConfig> for TokenIssuer {
    fn from(cfg: &SessionConfig) -> Self {
        Self::new(Duration::minutes(cfg.ttl_minutes))
    }
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
