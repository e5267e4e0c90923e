//! Ingestion service configuration with validation.
//!
//! Every section is `#[serde(default)]` so a partial document (or none at all)
//! yields a runnable configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Shared secret used when nothing else is configured.
///
/// The runtime logs a warning when this value is still in use at startup.
pub const DEFAULT_WEBHOOK_SECRET: &str = "supersecretkey";

/// Literal payload token that routes an event to the dead-letter queue.
pub const DEFAULT_FAILURE_MARKER: &str = r#""fail": true"#;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Webhook signature configuration
    pub signature: SignatureConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
    /// Event store configuration
    pub storage: StorageConfig,
    /// Success / failure classification
    pub classification: ClassificationConfig,
}

impl IngestConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signature.secret.is_empty() {
            return Err(ConfigError::InvalidSecret(
                "webhook secret cannot be empty".into(),
            ));
        }

        if self.signature.header.trim().is_empty() {
            return Err(ConfigError::InvalidSecret(
                "signature header name cannot be empty".into(),
            ));
        }

        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "max_requests cannot be 0".into(),
            ));
        }

        if self.rate_limit.window.is_zero() {
            return Err(ConfigError::InvalidRateLimit("window cannot be 0".into()));
        }

        if self.rate_limit.max_tracked_identities == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "max_tracked_identities cannot be 0".into(),
            ));
        }

        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_bytes cannot be 0".into(),
            ));
        }

        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }

        if self.classification.failure_marker.is_empty() {
            return Err(ConfigError::Invalid(
                "failure_marker cannot be empty".into(),
            ));
        }

        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.path.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid(
                "sqlite backend requires a database path".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// True while the built-in development secret is configured.
    pub fn uses_default_secret(&self) -> bool {
        self.signature.secret == DEFAULT_WEBHOOK_SECRET
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 5000)
    pub port: u16,
    /// Max webhook body size in bytes (default: 1MB)
    pub max_body_bytes: usize,
    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Time allowed for in-flight requests to drain on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5000,
            max_body_bytes: 1024 * 1024, // 1MB
            request_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Webhook signature configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Shared HMAC-SHA256 secret
    pub secret: String,
    /// Header carrying `sha256=<hex>`
    pub header: String,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_WEBHOOK_SECRET.to_string(),
            header: "X-Signature".to_string(),
        }
    }
}

/// Fixed-window rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Admitted requests per identity per window
    pub max_requests: u32,
    /// Trailing window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Upper bound on identities held in memory
    pub max_tracked_identities: usize,
    /// How often idle identities are swept
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 10,
            window: Duration::from_secs(60),
            max_tracked_identities: 100_000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Which store implementation backs the primary and dead-letter stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-lifetime maps (tests, demos)
    Memory,
    /// Single SQLite file with `events` and `dlq` tables
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Invalid(format!(
                "unknown storage backend: {}",
                other
            ))),
        }
    }
}

/// Event store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store implementation
    pub backend: StorageBackend,
    /// SQLite database file
    pub path: PathBuf,
    /// SQLite busy timeout
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("webhooks.db"),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Success / failure classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Substring that marks a payload as a simulated processing failure
    pub failure_marker: String,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            failure_marker: DEFAULT_FAILURE_MARKER.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Missing or unusable signing secret
    #[error("invalid signature settings: {0}")]
    InvalidSecret(String),
    /// Invalid rate limiting configuration
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" must be checked before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
