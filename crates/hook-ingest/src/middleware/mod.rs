//! Middleware for the ingestion service.
//!
//! Layer order (outermost first): Recovery → Tracing → Timeout → BodyLimit → Handler.
//!
//! Signature verification and rate limiting are not layers; they run inside
//! [`IngestPipeline`](crate::pipeline::IngestPipeline) so their ordering is
//! testable without HTTP.

pub mod identity;
pub mod metrics;
pub mod recovery;
pub mod tracing;

pub use identity::client_identity;
pub use metrics::IngestMetrics;
pub use recovery::panic_response;
pub use self::tracing::TracingLayer;
