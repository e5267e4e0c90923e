//! Client identity resolution for rate limiting.
//!
//! The first `X-Forwarded-For` entry wins, so a client talking to the service
//! directly can pick its own identity. Only deploy behind a proxy that
//! overwrites the header.

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use std::net::SocketAddr;

/// Identity used when neither a forwarded address nor the peer is known.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Resolve the rate-limit identity for a request.
pub fn client_identity(parts: &Parts) -> String {
    // Take the first hop (original client)
    if let Some(first) = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    // Fall back to connection info
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    UNKNOWN_IDENTITY.to_string()
}
