//! Per-request ingestion: verify, rate-limit, record, classify, persist.
//!
//! Each request ends in the first applicable state:
//!
//! 1. signature missing or wrong: [`IngestError::Unauthenticated`]
//! 2. identity over quota: [`IngestError::RateLimited`]
//! 3. body contains the failure marker: written to the DLQ,
//!    [`IngestOutcome::DeadLettered`]
//! 4. otherwise written to the primary store, [`IngestOutcome::Stored`]
//!
//! A failed write surfaces as [`IngestError::Storage`] and is not retried.

use crate::domain::config::IngestConfig;
use crate::domain::error::IngestError;
use crate::domain::event::{Event, EventId, HeaderMap};
use crate::domain::rate_limit::FixedWindowLimiter;
use crate::domain::signature::SignatureVerifier;
use crate::ports::outbound::EventStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A webhook as it arrives, before any checks.
#[derive(Debug, Clone)]
pub struct InboundWebhook {
    /// Resolved client identity used for rate limiting.
    pub identity: String,
    /// Lower-case header names, first value only.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Vec<u8>,
}

/// Where an accepted webhook ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Processed and written to the primary store.
    Stored { id: EventId },
    /// Simulated processing failure; written to the DLQ for replay.
    DeadLettered { id: EventId },
}

impl IngestOutcome {
    pub fn id(&self) -> &EventId {
        match self {
            IngestOutcome::Stored { id } | IngestOutcome::DeadLettered { id } => id,
        }
    }
}

/// Composes the signature gate, the limiter and both stores.
pub struct IngestPipeline {
    verifier: SignatureVerifier,
    signature_header: String,
    limiter: Arc<FixedWindowLimiter>,
    failure_marker: String,
    primary: Arc<dyn EventStore>,
    dlq: Arc<dyn EventStore>,
}

impl IngestPipeline {
    pub fn new(
        config: &IngestConfig,
        limiter: Arc<FixedWindowLimiter>,
        primary: Arc<dyn EventStore>,
        dlq: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            verifier: SignatureVerifier::new(config.signature.secret.as_bytes()),
            signature_header: config.signature.header.to_ascii_lowercase(),
            limiter,
            failure_marker: config.classification.failure_marker.clone(),
            primary,
            dlq,
        }
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }

    /// Ingest using the wall clock.
    pub fn ingest(&self, request: InboundWebhook) -> Result<IngestOutcome, IngestError> {
        self.ingest_at(request, Instant::now(), Utc::now())
    }

    /// Ingest with explicit clocks: `now` drives the limiter, `received_at`
    /// is stamped on the record.
    pub fn ingest_at(
        &self,
        request: InboundWebhook,
        now: Instant,
        received_at: DateTime<Utc>,
    ) -> Result<IngestOutcome, IngestError> {
        let presented = request.headers.get(&self.signature_header).map(String::as_str);
        if let Err(reason) = self.verifier.check(&request.body, presented) {
            warn!(identity = %request.identity, %reason, "Rejected webhook signature");
            return Err(IngestError::Unauthenticated(reason));
        }

        if !self.limiter.admit(&request.identity, now) {
            let retry_after = self.limiter.retry_after(&request.identity, now);
            debug!(
                identity = %request.identity,
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            return Err(IngestError::RateLimited {
                identity: request.identity,
                retry_after,
            });
        }

        let body = String::from_utf8_lossy(&request.body).into_owned();
        let failed = body.contains(&self.failure_marker);
        let event = Event::new(body, request.headers, received_at);
        let id = event.id().clone();

        if failed {
            self.dlq.put(&event).map_err(|source| {
                warn!(event_id = %id, error = %source, "DLQ write failed");
                IngestError::Storage {
                    id: id.clone(),
                    source,
                }
            })?;
            info!(event_id = %id, identity = %request.identity, "Webhook processing failed, sent to DLQ");
            Ok(IngestOutcome::DeadLettered { id })
        } else {
            self.primary.put(&event).map_err(|source| {
                warn!(event_id = %id, error = %source, "Event write failed");
                IngestError::Storage {
                    id: id.clone(),
                    source,
                }
            })?;
            info!(event_id = %id, identity = %request.identity, "Webhook stored");
            Ok(IngestOutcome::Stored { id })
        }
    }
}
