//! # Hook Telemetry
//!
//! Structured logging bootstrap for the Secure-Hook service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hook_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // Logs now go to stdout (fmt or JSON)
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HOOK_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `HOOK_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `HOOK_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `HOOK_SERVICE_NAME` | `secure-hook` | Service name in the startup line |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{build_filter, init_tracing};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize logging.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active. Logs a final line on drop.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
