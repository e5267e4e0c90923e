//! Request tracing and accounting.
//!
//! One span per request carrying method and path; status and latency are
//! recorded when the response is ready, and the request is counted in
//! [`IngestMetrics`].

use crate::middleware::metrics::IngestMetrics;
use axum::{body::Body, http::Request, response::Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{info, info_span, Instrument, Span};

/// Tracing layer that creates spans for each request
#[derive(Clone)]
pub struct TracingLayer {
    metrics: Arc<IngestMetrics>,
}

impl TracingLayer {
    pub fn new(metrics: Arc<IngestMetrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
    metrics: Arc<IngestMetrics>,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let metrics = Arc::clone(&self.metrics);

        let span = info_span!(
            "http_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            http.status_code = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let result = inner.call(req).await;
                let latency_ms = started.elapsed().as_millis() as u64;

                let span = Span::current();
                span.record("latency_ms", latency_ms);
                match &result {
                    Ok(response) => {
                        let status = response.status();
                        span.record("http.status_code", status.as_u16());
                        metrics.record_request(status.is_server_error(), latency_ms);
                        info!(status = status.as_u16(), latency_ms, "Request completed");
                    }
                    Err(_) => {
                        metrics.record_request(true, latency_ms);
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
