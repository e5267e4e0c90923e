//! Process-lifetime event store.

use crate::domain::error::StoreError;
use crate::domain::event::{Event, EventId};
use crate::ports::outbound::EventStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Event store backed by a `HashMap`. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventStore for InMemoryEventStore {
    fn put(&self, event: &Event) -> Result<(), StoreError> {
        self.events.write().insert(event.id().clone(), event.clone());
        Ok(())
    }

    fn get(&self, id: &EventId) -> Result<Event, StoreError> {
        self.events
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }

    fn list_all(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.events.read().values().cloned().collect())
    }
}
