//! Prometheus metrics for the ingestion service.

use crate::domain::error::IngestError;
use crate::pipeline::IngestOutcome;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion service metrics
#[derive(Debug, Default)]
pub struct IngestMetrics {
    // Request counters
    pub requests_total: AtomicU64,
    pub requests_server_error: AtomicU64,

    // Pipeline outcomes
    pub events_stored: AtomicU64,
    pub events_dead_lettered: AtomicU64,
    pub auth_rejected: AtomicU64,
    pub rate_limit_rejected: AtomicU64,
    pub storage_errors: AtomicU64,

    // Replay
    pub replays_total: AtomicU64,
    pub replays_not_found: AtomicU64,

    // Latency tracking (simplified - no histogram)
    pub total_latency_ms: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished HTTP request
    pub fn record_request(&self, server_error: bool, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if server_error {
            self.requests_server_error.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    /// Record the result of one ingestion attempt
    pub fn record_ingest(&self, result: &Result<IngestOutcome, IngestError>) {
        let counter = match result {
            Ok(IngestOutcome::Stored { .. }) => &self.events_stored,
            Ok(IngestOutcome::DeadLettered { .. }) => &self.events_dead_lettered,
            Err(IngestError::Unauthenticated(_)) => &self.auth_rejected,
            Err(IngestError::RateLimited { .. }) => &self.rate_limit_rejected,
            Err(IngestError::Storage { .. }) => &self.storage_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a replay attempt
    pub fn record_replay(&self, found: bool) {
        if found {
            self.replays_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.replays_not_found.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.requests_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics in Prometheus text format
    pub fn to_prometheus(&self, tracked_identities: usize) -> String {
        let counters: [(&str, &str, &AtomicU64); 9] = [
            ("hook_http_requests_total", "Total HTTP requests", &self.requests_total),
            ("hook_http_server_errors_total", "Requests answered with 5xx", &self.requests_server_error),
            ("hook_events_stored_total", "Events written to the primary store", &self.events_stored),
            ("hook_events_dead_lettered_total", "Events written to the DLQ", &self.events_dead_lettered),
            ("hook_auth_rejected_total", "Webhooks rejected for bad signatures", &self.auth_rejected),
            ("hook_rate_limit_rejected_total", "Rate limited webhooks", &self.rate_limit_rejected),
            ("hook_storage_errors_total", "Failed store writes", &self.storage_errors),
            ("hook_replays_total", "Events replayed from the DLQ", &self.replays_total),
            ("hook_replays_not_found_total", "Replay requests for unknown ids", &self.replays_not_found),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            let _ = write!(
                output,
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                value.load(Ordering::Relaxed)
            );
        }

        let _ = write!(
            output,
            "# HELP hook_rate_limit_tracked_identities Identities held by the rate limiter\n\
             # TYPE hook_rate_limit_tracked_identities gauge\n\
             hook_rate_limit_tracked_identities {}\n",
            tracked_identities
        );
        let _ = write!(
            output,
            "# HELP hook_average_latency_ms Average request latency\n\
             # TYPE hook_average_latency_ms gauge\n\
             hook_average_latency_ms {:.2}\n",
            self.average_latency_ms()
        );

        output
    }
}
