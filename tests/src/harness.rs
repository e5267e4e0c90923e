//! In-process client for driving the service router.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use hook_ingest::domain::config::StorageBackend;
use hook_ingest::domain::signature::signature_header_value;
use hook_ingest::{IngestConfig, IngestService, Stores};
use serde_json::Value;
use tower::ServiceExt;

/// Secret every harness service is configured with.
pub const TEST_SECRET: &str = "integration-secret";

/// Config with in-memory storage and the test secret.
pub fn test_config() -> IngestConfig {
    let mut config = IngestConfig::default();
    config.signature.secret = TEST_SECRET.to_string();
    config.storage.backend = StorageBackend::Memory;
    config
}

/// A response with its body already read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `id` field of a webhook or replay response.
    pub fn id(&self) -> String {
        self.json()["id"].as_str().unwrap_or_default().to_string()
    }
}

/// Router plus request helpers.
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(service: &IngestService) -> Self {
        Self {
            router: service.router(),
        }
    }

    /// Service with [`test_config`] and fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::with_config(test_config(), Stores::in_memory())
    }

    pub fn with_config(config: IngestConfig, stores: Stores) -> Self {
        let service = IngestService::new(config, stores).expect("valid test config");
        Self::new(&service)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body")
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// POST /webhook signed with [`TEST_SECRET`], from `identity`.
    pub async fn webhook(&self, body: &str, identity: &str) -> TestResponse {
        let request = Request::post("/webhook")
            .header(
                "X-Signature",
                signature_header_value(body.as_bytes(), TEST_SECRET.as_bytes()),
            )
            .header("X-Forwarded-For", identity)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.send(request).await
    }

    /// POST /webhook with no signature header.
    pub async fn unsigned_webhook(&self, body: &str, identity: &str) -> TestResponse {
        let request = Request::post("/webhook")
            .header("X-Forwarded-For", identity)
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.call(Method::GET, path).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.call(Method::POST, path).await
    }

    async fn call(&self, method: Method, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    /// Ids listed by an admin endpoint, in listing order.
    pub async fn listed_ids(&self, path: &str) -> Vec<String> {
        self.get(path)
            .await
            .json()
            .as_array()
            .map(|events| {
                events
                    .iter()
                    .filter_map(|e| e["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
