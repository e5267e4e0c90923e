//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "secure-hook".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `HOOK_SERVICE_NAME`: Service name (default: secure-hook)
    /// - `HOOK_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `HOOK_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `HOOK_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let defaults = Self::default();

        Self {
            service_name: lookup("HOOK_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("HOOK_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("HOOK_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("HOOK_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }
}
