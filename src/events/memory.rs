use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::events::repo::EventStore;
use crate::events::repo_types::{Event, NewEvent};

#[derive(Default)]
struct Tables {
    // insertion order
    events: Vec<Event>,
    // user id -> event ids in attach order
    links: HashMap<Uuid, Vec<Uuid>>,
}

impl Tables {
    fn find(&self, id: Uuid) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    fn insert(&mut self, new: NewEvent) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            name: new.name,
            location: new.location,
            datetime: new.datetime,
            content: new.content,
            longitude: new.longitude,
            latitude: new.latitude,
            created_at: OffsetDateTime::now_utc(),
        };
        self.events.push(event.clone());
        event
    }
}

/// Event store backed by process memory, for dev mode and tests.
#[derive(Default)]
pub struct InMemoryEventStore {
    tables: RwLock<Tables>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn list_all(&self) -> anyhow::Result<Vec<Event>> {
        Ok(self.tables.read().events.clone())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        Ok(self.tables.read().find(id).cloned())
    }

    async fn create(&self, event: NewEvent) -> anyhow::Result<Event> {
        Ok(self.tables.write().insert(event))
    }

    async fn create_many(&self, events: Vec<NewEvent>) -> anyhow::Result<Vec<Event>> {
        let mut tables = self.tables.write();
        Ok(events.into_iter().map(|e| tables.insert(e)).collect())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        let mut tables = self.tables.write();
        let Some(pos) = tables.events.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let event = tables.events.remove(pos);
        for ids in tables.links.values_mut() {
            ids.retain(|linked| *linked != id);
        }
        Ok(Some(event))
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Event>> {
        let tables = self.tables.read();
        let Some(ids) = tables.links.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().filter_map(|id| tables.find(*id).cloned()).collect())
    }

    async fn attach(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>> {
        let mut tables = self.tables.write();
        let Some(event) = tables.find(event_id).cloned() else {
            return Ok(None);
        };
        let ids = tables.links.entry(user_id).or_default();
        if !ids.contains(&event_id) {
            ids.push(event_id);
        }
        Ok(Some(event))
    }

    async fn detach(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>> {
        let mut tables = self.tables.write();
        let Some(event) = tables.find(event_id).cloned() else {
            return Ok(None);
        };
        if let Some(ids) = tables.links.get_mut(&user_id) {
            ids.retain(|id| *id != event_id);
        }
        Ok(Some(event))
    }
}
