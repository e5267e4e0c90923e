//! Adapters for the ingestion service.
//!
//! Store implementations behind [`EventStore`](crate::ports::EventStore).

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryEventStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteEventStore};
