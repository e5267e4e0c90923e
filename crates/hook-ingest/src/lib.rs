// Allow missing docs for internal items
#![allow(missing_docs)]

//! Hook Ingest - signed webhook ingestion with a dead-letter queue.
//!
//! Accepts HMAC-signed webhook callbacks, rate-limits them per client and
//! records each one in either the primary store or the DLQ. DLQ entries can be
//! replayed into the primary store on demand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        HOOK INGEST                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │   POST /webhook                  /admin/*                     │
//! │        │                            │                         │
//! │  ┌─────┴────────────────────────────┴─────┐                   │
//! │  │  Recovery → Tracing → Timeout → Limit   │                   │
//! │  └─────┬────────────────────────────┬─────┘                   │
//! │        │                            │                         │
//! │  ┌─────┴──────────────┐    ┌────────┴─────────┐               │
//! │  │   IngestPipeline   │    │ ReplayOrchestrator│              │
//! │  │ verify → limit →   │    │   DLQ → primary   │              │
//! │  │ classify → persist │    └────────┬─────────┘               │
//! │  └─────┬─────────┬────┘             │                         │
//! │        ▼         ▼                  ▼                         │
//! │    primary      DLQ  ◄──────────────┘                         │
//! │   (events)     (dlq)      EventStore: memory | SQLite         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use hook_ingest::{IngestConfig, IngestService, Stores};
//!
//! let config = IngestConfig::default();
//! let stores = Stores::open(&config.storage)?;
//! let service = IngestService::new(config, stores)?;
//! let listener = service.bind().await?;
//! service.serve(listener, shutdown_signal()).await?;
//! ```
//!
//! # Security
//!
//! - `sha256=` HMAC signatures compared in constant time
//! - Fixed-window rate limiting per client identity, after authentication
//! - Request body size limit and whole-request timeout
//! - The rate-limit identity trusts `X-Forwarded-For`; run behind a proxy that sets it

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod pipeline;
pub mod ports;
pub mod replay;
pub mod service;

// Re-exports for public API
pub use adapters::InMemoryEventStore;
#[cfg(feature = "sqlite")]
pub use adapters::{SqliteDatabase, SqliteEventStore};
pub use domain::config::IngestConfig;
pub use domain::error::{ApiError, ApiResult, IngestError, ReplayError, ServiceError, StoreError};
pub use domain::event::{Event, EventId, HeaderMap};
pub use domain::rate_limit::FixedWindowLimiter;
pub use domain::signature::{compute_signature, verify_signature, SignatureVerifier};
pub use middleware::IngestMetrics;
pub use pipeline::{InboundWebhook, IngestOutcome, IngestPipeline};
pub use ports::EventStore;
pub use replay::ReplayOrchestrator;
pub use service::{IngestService, Stores};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
