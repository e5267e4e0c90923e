//! DLQ replay.
//!
//! Replay copies a dead-lettered event into the primary store. The DLQ entry
//! stays, so the same id can be replayed again; downstream consumers dedupe on
//! id. No signature or rate-limit checks run on replay.

use crate::domain::error::ReplayError;
use crate::domain::event::{Event, EventId};
use crate::ports::outbound::EventStore;
use std::sync::Arc;
use tracing::info;

pub struct ReplayOrchestrator {
    primary: Arc<dyn EventStore>,
    dlq: Arc<dyn EventStore>,
}

impl ReplayOrchestrator {
    pub fn new(primary: Arc<dyn EventStore>, dlq: Arc<dyn EventStore>) -> Self {
        Self { primary, dlq }
    }

    /// Copy event `id` from the DLQ into the primary store.
    ///
    /// Returns the replayed record. Replaying twice overwrites the primary
    /// entry with the same content.
    pub fn replay(&self, id: &EventId) -> Result<Event, ReplayError> {
        let event = self.dlq.get(id)?;
        self.primary.put(&event).map_err(ReplayError::Storage)?;
        info!(event_id = %id, "Replayed event from DLQ");
        Ok(event)
    }
}
