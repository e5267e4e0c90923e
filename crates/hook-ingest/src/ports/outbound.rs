//! Outbound ports for the ingestion service.

use crate::domain::error::StoreError;
use crate::domain::event::{Event, EventId};
use std::sync::Arc;

/// Keyed collection of events.
///
/// Backs both the primary store and the dead-letter queue. Calls are
/// synchronous; async callers run them on the blocking pool.
pub trait EventStore: Send + Sync {
    /// Insert or overwrite the record keyed by `event.id()`.
    fn put(&self, event: &Event) -> Result<(), StoreError>;

    /// Fetch one record; `StoreError::NotFound` when absent.
    fn get(&self, id: &EventId) -> Result<Event, StoreError>;

    /// Every stored record, in no particular order.
    fn list_all(&self) -> Result<Vec<Event>, StoreError>;
}

impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    fn put(&self, event: &Event) -> Result<(), StoreError> {
        (**self).put(event)
    }

    fn get(&self, id: &EventId) -> Result<Event, StoreError> {
        (**self).get(id)
    }

    fn list_all(&self) -> Result<Vec<Event>, StoreError> {
        (**self).list_all()
    }
}

/// Sort events by `receivedAt`, then id, for stable listings.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.received_at()
            .cmp(&b.received_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}
