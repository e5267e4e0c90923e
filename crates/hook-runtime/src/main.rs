//! # Secure-Hook Runtime
//!
//! Entry point for the webhook ingestion service.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load configuration (defaults + `HOOK_*` environment)
//! 3. Warn if the built-in webhook secret is still in use
//! 4. Open the primary and dead-letter stores
//! 5. Serve until SIGINT / SIGTERM, then drain for the grace period

use anyhow::{Context, Result};
use hook_ingest::{IngestService, Stores};
use hook_runtime::{load_config, shutdown_signal};
use hook_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    info!("===========================================");
    info!("  Secure-Hook Runtime v{}", hook_ingest::VERSION);
    info!("===========================================");

    // Load configuration
    let config = load_config();
    config.validate().context("Invalid configuration")?;

    if config.uses_default_secret() {
        warn!("Using the built-in default webhook secret; set HOOK_WEBHOOK_SECRET in production");
    }

    let stores = Stores::open(&config.storage).context("Failed to open event stores")?;
    info!(
        backend = ?config.storage.backend,
        path = %config.storage.path.display(),
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window.as_secs(),
        "Event stores ready"
    );

    let service = IngestService::new(config, stores).context("Failed to build service")?;
    let listener = service.bind().await.context("Failed to bind listener")?;

    info!("Service is running. Press Ctrl+C to stop.");
    service
        .serve(listener, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}
