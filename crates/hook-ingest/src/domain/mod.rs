//! Domain types for the ingestion service.
//!
//! Configuration, errors, the event record and the two request gates
//! (signature verification and rate limiting). Nothing here touches I/O.

pub mod config;
pub mod error;
pub mod event;
pub mod rate_limit;
pub mod signature;

// Re-exports for convenience
pub use config::{IngestConfig, RateLimitConfig, StorageBackend};
pub use error::{ApiError, ApiResult, IngestError, ReplayError, ServiceError, StoreError};
pub use event::{Event, EventId, HeaderMap};
pub use rate_limit::FixedWindowLimiter;
pub use signature::{SignatureError, SignatureVerifier};
