use anyhow::Context;
use serde::Deserialize;

/// Ten years. Longer lifetimes overflow the expiration timestamp.
pub const MAX_SESSION_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service against the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let ttl_minutes = parse_ttl_minutes(std::env::var("SESSION_TTL_MINUTES").ok())?;

        Ok(Self {
            database_url,
            max_connections,
            session: SessionConfig { ttl_minutes },
        })
    }
}

fn parse_ttl_minutes(raw: Option<String>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(60);
    };
    let ttl = raw
        .trim()
        .parse::<i64>()
        .context("SESSION_TTL_MINUTES must be an integer")?;
    anyhow::ensure!(
        (0..=MAX_SESSION_TTL_MINUTES).contains(&ttl),
        "SESSION_TTL_MINUTES must be between 0 and {MAX_SESSION_TTL_MINUTES}"
    );
    Ok(ttl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_defaults_to_an_hour() {
        assert_eq!(parse_ttl_minutes(None).unwrap(), 60);
        assert_eq!(parse_ttl_minutes(Some(" 15 ".into())).unwrap(), 15);
        assert_eq!(parse_ttl_minutes(Some("0".into())).unwrap(), 0);
    }

    #[test]
    fn ttl_outside_range_is_rejected() {
        assert!(parse_ttl_minutes(Some("-1".into())).is_err());
        assert!(parse_ttl_minutes(Some("abc".into())).is_err());
        assert!(parse_ttl_minutes(Some("1000000000000".into())).is_err());
        assert!(parse_ttl_minutes(Some((MAX_SESSION_TTL_MINUTES + 1).to_string())).is_err());
        assert_eq!(
            parse_ttl_minutes(Some(MAX_SESSION_TTL_MINUTES.to_string())).unwrap(),
            MAX_SESSION_TTL_MINUTES
        );
    }
}
