//! Ports (interfaces) for the ingestion service.

pub mod outbound;

pub use outbound::EventStore;
