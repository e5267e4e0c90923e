//! # Recovery
//!
//! Faults inside one request stay inside that request.

#[cfg(test)]
mod tests {
    use crate::harness::{test_config, TestClient};
    use axum::http::StatusCode;
    use hook_ingest::{Event, EventId, EventStore, InMemoryEventStore, StoreError, Stores};
    use std::sync::Arc;

    /// Store that panics on payloads containing "explode".
    struct VolatileStore {
        inner: InMemoryEventStore,
    }

    impl EventStore for VolatileStore {
        fn put(&self, event: &Event) -> Result<(), StoreError> {
            if event.body().contains("explode") {
                panic!("store blew up");
            }
            self.inner.put(event)
        }

        fn get(&self, id: &EventId) -> Result<Event, StoreError> {
            self.inner.get(id)
        }

        fn list_all(&self) -> Result<Vec<Event>, StoreError> {
            self.inner.list_all()
        }
    }

    /// Store whose writes always fail.
    struct FullDisk;

    impl EventStore for FullDisk {
        fn put(&self, _event: &Event) -> Result<(), StoreError> {
            Err(StoreError::backend("no space left on device"))
        }

        fn get(&self, id: &EventId) -> Result<Event, StoreError> {
            Err(StoreError::NotFound { id: id.clone() })
        }

        fn list_all(&self) -> Result<Vec<Event>, StoreError> {
            Err(StoreError::backend("no space left on device"))
        }
    }

    #[tokio::test]
    async fn test_panic_yields_500_and_service_keeps_serving() {
        let stores = Stores {
            primary: Arc::new(VolatileStore {
                inner: InMemoryEventStore::new(),
            }),
            dlq: Arc::new(InMemoryEventStore::new()),
        };
        let client = TestClient::with_config(test_config(), stores);

        let response = client.webhook(r#"{"explode": 1}"#, "192.0.2.10").await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.json()["error"]["code"].as_i64().is_some());

        let response = client.webhook(r#"{"calm": 1}"#, "192.0.2.10").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(client.listed_ids("/admin/events").await.len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_500_without_id() {
        let stores = Stores {
            primary: Arc::new(FullDisk),
            dlq: Arc::new(FullDisk),
        };
        let client = TestClient::with_config(test_config(), stores);

        for body in ["{}", r#"{"fail": true}"#] {
            let response = client.webhook(body, "192.0.2.11").await;
            assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
            let json = response.json();
            assert!(json.get("error").is_some());
            assert!(json.get("id").is_none());
        }

        let listing = client.get("/admin/events").await;
        assert_eq!(listing.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_unaffected_by_store_faults() {
        let stores = Stores {
            primary: Arc::new(FullDisk),
            dlq: Arc::new(FullDisk),
        };
        let client = TestClient::with_config(test_config(), stores);
        client.webhook("{}", "192.0.2.12").await;

        let health = client.get("/healthz").await;
        assert_eq!(health.status, StatusCode::OK);
        assert_eq!(health.text(), "ok");
    }
}
