//! Error types for the ingestion service and their HTTP mapping.
//!
//! | Error                       | Status |
//! |-----------------------------|--------|
//! | `IngestError::Unauthenticated` | 401 |
//! | `IngestError::RateLimited`  | 429    |
//! | `IngestError::Storage`      | 500    |
//! | `ReplayError::NotFound`     | 404    |
//! | `ReplayError::Storage`      | 500    |
//!
//! A simulated failure is an outcome, not an error; see
//! [`IngestOutcome`](crate::pipeline::IngestOutcome).

use crate::domain::event::EventId;
use crate::domain::signature::SignatureError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;

/// Machine-readable error codes carried in error bodies
pub mod codes {
    pub const UNAUTHORIZED: i32 = 4010;
    pub const NOT_FOUND: i32 = 4040;
    pub const PAYLOAD_TOO_LARGE: i32 = 4130;
    pub const BAD_REQUEST: i32 = 4000;
    pub const RATE_LIMITED: i32 = 4290;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORAGE_ERROR: i32 = 5001;
}

/// Event store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record with this id.
    #[error("event not found: {id}")]
    NotFound { id: EventId },

    /// Backend I/O or SQL failure.
    #[error("store backend error: {message}")]
    Backend { message: String },

    /// A stored row could not be decoded.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Reasons the ingestion pipeline refuses or fails a webhook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Missing, malformed or mismatched signature.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] SignatureError),

    /// Identity is over its quota.
    #[error("rate limit exceeded for {identity}")]
    RateLimited {
        identity: String,
        retry_after: Duration,
    },

    /// Primary or DLQ write failed; the event is dropped for this attempt.
    #[error("failed to store event {id}: {source}")]
    Storage {
        id: EventId,
        #[source]
        source: StoreError,
    },
}

/// Replay failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// Id is not in the dead-letter store.
    #[error("event not found in DLQ: {0}")]
    NotFound(EventId),

    /// Reading the DLQ or writing the primary store failed.
    #[error("replay storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ReplayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id } => ReplayError::NotFound(id),
            other => ReplayError::Storage(other),
        }
    }
}

/// Service-level errors (startup, binding, storage bootstrap)
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Store could not be opened
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// HTTP error body: `{"error": {"code": .., "message": ..}}`
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub message: String,
    pub retry_after: Option<Duration>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: i32,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn unauthorized(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            format!("Unauthorized: {}", details.into()),
        )
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                codes::RATE_LIMITED,
                "Too Many Requests",
            )
        }
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, details)
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, details)
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            format!("Payload exceeds {} bytes", limit),
        )
    }

    pub fn storage(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::STORAGE_ERROR,
            details,
        )
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            format!("Internal error: {}", details.into()),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: &self.message,
            },
        };
        let mut response = (self.status, Json(body)).into_response();

        if let Some(wait) = self.retry_after {
            // Round up to whole seconds
            let secs = (wait.as_millis() as u64).div_ceil(1000).max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("HMAC-SHA256"),
            );
        }

        response
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Unauthenticated(reason) => ApiError::unauthorized(reason.to_string()),
            IngestError::RateLimited { retry_after, .. } => ApiError::rate_limited(retry_after),
            IngestError::Storage { .. } => ApiError::storage("Failed to store event"),
        }
    }
}

impl From<ReplayError> for ApiError {
    fn from(e: ReplayError) -> Self {
        match e {
            ReplayError::NotFound(_) => ApiError::not_found("Event not found in DLQ"),
            ReplayError::Storage(_) => ApiError::storage("Failed to replay event"),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id } => ApiError::not_found(format!("Event not found: {}", id)),
            _ => ApiError::storage("Failed to read events"),
        }
    }
}

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;
