//! Panic recovery.
//!
//! Used with `tower_http::catch_panic::CatchPanicLayer::custom`. A panic in one
//! request becomes a 500 for that request and the server keeps serving.

use crate::domain::error::ApiError;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use tracing::error;

/// Turn a caught panic payload into a generic 500 response.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    error!(panic = %detail, "Request handler panicked");
    ApiError::internal("request handler panicked").into_response()
}
