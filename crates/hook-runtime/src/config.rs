//! Configuration loading from the environment.
//!
//! Starts from [`IngestConfig::default`] and applies `HOOK_*` overrides.
//! Unparseable values are logged and ignored.

use hook_ingest::domain::config::StorageBackend;
use hook_ingest::IngestConfig;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Load configuration from the process environment.
pub fn load_config() -> IngestConfig {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary variable source.
pub fn load_config_from<F>(lookup: F) -> IngestConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = IngestConfig::default();

    // Listen address: "host:port", ":port" or "port"
    if let Some(value) = lookup("HOOK_LISTEN_ADDR") {
        match parse_listen_addr(&value) {
            Some((host, port)) => {
                if let Some(host) = host {
                    config.http.host = host;
                }
                config.http.port = port;
            }
            None => warn!(value = %value, "HOOK_LISTEN_ADDR is not a valid address"),
        }
    }

    if let Some(secret) = lookup("HOOK_WEBHOOK_SECRET") {
        config.signature.secret = secret;
        info!("Loaded webhook secret from environment");
    }

    if let Some(path) = lookup("HOOK_DB_PATH") {
        config.storage.path = PathBuf::from(path);
    }

    if let Some(value) = lookup("HOOK_STORAGE_BACKEND") {
        match value.parse::<StorageBackend>() {
            Ok(backend) => config.storage.backend = backend,
            Err(e) => warn!(error = %e, "Ignoring HOOK_STORAGE_BACKEND"),
        }
    }

    if let Some(value) = lookup("HOOK_RATE_LIMIT_MAX") {
        match value.trim().parse::<u32>() {
            Ok(max) => config.rate_limit.max_requests = max,
            Err(_) => warn!(value = %value, "HOOK_RATE_LIMIT_MAX must be an integer"),
        }
    }

    if let Some(value) = lookup("HOOK_RATE_LIMIT_WINDOW_SECS") {
        match value.trim().parse::<u64>() {
            Ok(secs) => config.rate_limit.window = Duration::from_secs(secs),
            Err(_) => warn!(value = %value, "HOOK_RATE_LIMIT_WINDOW_SECS must be an integer"),
        }
    }

    if let Some(marker) = lookup("HOOK_FAILURE_MARKER") {
        config.classification.failure_marker = marker;
    }

    config
}

fn parse_listen_addr(value: &str) -> Option<(Option<IpAddr>, u16)> {
    let value = value.trim();
    if let Some(port) = value.strip_prefix(':') {
        return port.parse().ok().map(|p| (None, p));
    }
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Some((Some(addr.ip()), addr.port()));
    }
    value.parse().ok().map(|p| (None, p))
}
