use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::events::repo_types::{Event, NewEvent};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_all(&self) -> anyhow::Result<Vec<Event>>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Event>>;

    async fn create(&self, event: NewEvent) -> anyhow::Result<Event>;

    /// All-or-nothing insert of several events.
    async fn create_many(&self, events: Vec<NewEvent>) -> anyhow::Result<Vec<Event>>;

    /// Removes the event and every user's link to it.
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Event>>;

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Event>>;

    /// `None` when the event does not exist. Linking twice is a no-op.
    async fn attach(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>>;

    /// `None` when the event does not exist.
    async fn detach(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>>;
}

const EVENT_COLUMNS: &str = "id, name, location, datetime, content, longitude, latitude, created_at";

#[derive(Clone)]
pub struct PgEventStore {
    db: PgPool,
}

impl PgEventStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn insert_event_tx(
    tx: &mut Transaction<'_, Postgres>,
    event: &NewEvent,
) -> anyhow::Result<Event> {
    let row = sqlx::query_as::<_, Event>(&format!(
        r#"
        INSERT INTO events (id, name, location, datetime, content, longitude, latitude)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&event.name)
    .bind(&event.location)
    .bind(&event.datetime)
    .bind(&event.content)
    .bind(&event.longitude)
    .bind(&event.latitude)
    .fetch_one(&mut **tx)
    .await
    .context("insert event")?;
    Ok(row)
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn list_all(&self) -> anyhow::Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list events")?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get event")?;
        Ok(row)
    }

    async fn create(&self, event: NewEvent) -> anyhow::Result<Event> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let row = insert_event_tx(&mut tx, &event).await?;
        tx.commit().await.context("commit tx")?;
        Ok(row)
    }

    async fn create_many(&self, events: Vec<NewEvent>) -> anyhow::Result<Vec<Event>> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let mut rows = Vec::with_capacity(events.len());
        for event in &events {
            rows.push(insert_event_tx(&mut tx, event).await?);
        }
        tx.commit().await.context("commit tx")?;
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        // user_events rows go with it via ON DELETE CASCADE
        let row = sqlx::query_as::<_, Event>(&format!(
            "DELETE FROM events WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete event")?;
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.name, e.location, e.datetime, e.content,
                   e.longitude, e.latitude, e.created_at
              FROM events e
              JOIN user_events ue ON ue.event_id = e.id
             WHERE ue.user_id = $1
             ORDER BY ue.attached_at ASC, e.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list events for user")?;
        Ok(rows)
    }

    async fn attach(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>> {
        let Some(event) = self.get(event_id).await? else {
            return Ok(None);
        };
        sqlx::query(
            r#"
            INSERT INTO user_events (user_id, event_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, event_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.db)
        .await
        .context("attach event to user")?;
        Ok(Some(event))
    }

    async fn detach(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>> {
        let Some(event) = self.get(event_id).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM user_events WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.db)
            .await
            .context("detach event from user")?;
        Ok(Some(event))
    }
}
