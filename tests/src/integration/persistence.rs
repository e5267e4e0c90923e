//! # Persistence
//!
//! SQLite-backed service: records survive a restart and both tables keep
//! their own contents.

#[cfg(test)]
mod tests {
    use crate::harness::{test_config, TestClient};
    use axum::http::StatusCode;
    use hook_ingest::domain::config::StorageBackend;
    use hook_ingest::{IngestConfig, Stores};
    use std::path::Path;
    use tempfile::TempDir;

    fn sqlite_config(path: &Path) -> IngestConfig {
        let mut config = test_config();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = path.to_path_buf();
        config
    }

    fn client_for(path: &Path) -> TestClient {
        let config = sqlite_config(path);
        let stores = Stores::open(&config.storage).unwrap();
        TestClient::with_config(config, stores)
    }

    #[tokio::test]
    async fn test_events_survive_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("webhooks.db");

        let (stored, dead) = {
            let client = client_for(&path);
            let stored = client.webhook(r#"{"ok": 1}"#, "192.0.2.1").await.id();
            let dead = client.webhook(r#"{"fail": true}"#, "192.0.2.1").await.id();
            (stored, dead)
        };

        let client = client_for(&path);
        assert_eq!(client.listed_ids("/admin/events").await, vec![stored]);
        assert_eq!(client.listed_ids("/admin/dlq").await, vec![dead.clone()]);

        // A DLQ entry written before the restart can be replayed after it
        let replay = client.post(&format!("/admin/replay/{}", dead)).await;
        assert_eq!(replay.status, StatusCode::OK);
        assert!(client.listed_ids("/admin/events").await.contains(&dead));
    }

    #[tokio::test]
    async fn test_headers_and_body_round_trip_through_sqlite() {
        let dir = TempDir::new().unwrap();
        let client = client_for(&dir.path().join("webhooks.db"));

        client.webhook(r#"{"unicode": "žluťoučký"}"#, "192.0.2.2").await;

        let events = client.get("/admin/events").await.json();
        let event = &events[0];
        assert_eq!(event["body"], r#"{"unicode": "žluťoučký"}"#);
        assert_eq!(event["headers"]["content-type"], "application/json");
        assert_eq!(event["headers"]["x-forwarded-for"], "192.0.2.2");
        assert!(event["headers"]["x-signature"]
            .as_str()
            .unwrap()
            .starts_with("sha256="));
    }

    #[tokio::test]
    async fn test_open_fails_on_directory_path() {
        let dir = TempDir::new().unwrap();
        let config = sqlite_config(dir.path());
        assert!(Stores::open(&config.storage).is_err());
    }
}
