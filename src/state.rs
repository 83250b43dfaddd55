use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;

use crate::auth::{
    memory::InMemoryUserStore,
    repo::{PgUserStore, UserStore},
    services::AuthService,
    tokens::TokenIssuer,
};
use crate::config::{AppConfig, SessionConfig};
use crate::events::{
    memory::InMemoryEventStore,
    repo::{EventStore, PgEventStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub events: Arc<dyn EventStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (users, events): (Arc<dyn UserStore>, Arc<dyn EventStore>) =
            match &config.database_url {
                Some(url) => {
                    let db = sqlx::postgres::PgPoolOptions::new()
                        .max_connections(config.max_connections)
                        .connect(url)
                        .await
                        .context("connect to database")?;

                    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                        tracing::warn!(error = %e, "migration failed; continuing");
                    }

                    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db.clone()));
                    let events: Arc<dyn EventStore> = Arc::new(PgEventStore::new(db));
                    (users, events)
                }
                None => {
                    tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
                    let events: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
                    (users, events)
                }
            };

        Ok(Self::from_parts(config, users, events))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        let auth = AuthService::new(users, TokenIssuer::from(&config.session));
        Self {
            config,
            auth,
            events,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            max_connections: 1,
            session: SessionConfig { ttl_minutes: 5 },
        });
        Self::from_parts(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryEventStore::new()),
        )
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
