//! # Webhook Flow
//!
//! Success path, dead-letter path and replay, observed only through HTTP.

#[cfg(test)]
mod tests {
    use crate::harness::TestClient;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_success_lands_in_primary_only() {
        let client = TestClient::in_memory();

        let response = client.webhook(r#"{"order": 42}"#, "198.51.100.1").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["status"], "stored");
        let id = response.id();

        assert_eq!(client.listed_ids("/admin/events").await, vec![id]);
        assert!(client.listed_ids("/admin/dlq").await.is_empty());

        let events = client.get("/admin/events").await.json();
        assert_eq!(events[0]["body"], r#"{"order": 42}"#);
        assert!(events[0]["receivedAt"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_failure_dead_letter_then_replay() {
        let client = TestClient::in_memory();

        // Simulated failure: 500 with the id, stored in the DLQ only
        let response = client.webhook(r#"{"fail": true}"#, "198.51.100.2").await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json()["status"], "dead_lettered");
        let id = response.id();
        assert!(!id.is_empty());

        assert_eq!(client.listed_ids("/admin/dlq").await, vec![id.clone()]);
        assert!(client.listed_ids("/admin/events").await.is_empty());

        // Replay copies it into the primary store
        let replay = client.post(&format!("/admin/replay/{}", id)).await;
        assert_eq!(replay.status, StatusCode::OK);
        assert_eq!(replay.json()["status"], "replayed");
        assert_eq!(replay.id(), id);

        assert_eq!(client.listed_ids("/admin/events").await, vec![id.clone()]);
        assert_eq!(client.listed_ids("/admin/dlq").await, vec![id]);
    }

    #[tokio::test]
    async fn test_replay_twice_keeps_single_primary_record() {
        let client = TestClient::in_memory();
        let id = client
            .webhook(r#"{"fail": true, "n": 1}"#, "198.51.100.3")
            .await
            .id();

        for _ in 0..2 {
            let replay = client.get(&format!("/admin/replay/{}", id)).await;
            assert_eq!(replay.status, StatusCode::OK);
        }

        assert_eq!(client.listed_ids("/admin/events").await, vec![id.clone()]);
        assert_eq!(client.listed_ids("/admin/dlq").await, vec![id.clone()]);

        // Still replayable
        let again = client.post(&format!("/admin/replay/{}", id)).await;
        assert_eq!(again.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_replay_preserves_record() {
        let client = TestClient::in_memory();
        let id = client.webhook(r#"{"fail": true}"#, "198.51.100.4").await.id();
        client.post(&format!("/admin/replay/{}", id)).await;

        let dlq = client.get("/admin/dlq").await.json();
        let primary = client.get("/admin/events").await.json();
        assert_eq!(dlq[0], primary[0]);
    }

    #[tokio::test]
    async fn test_replay_unknown_id() {
        let client = TestClient::in_memory();
        let response = client.post("/admin/replay/no-such-event").await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.json()["error"]["message"].as_str().is_some());
        assert!(client.listed_ids("/admin/events").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_signature_rejected_and_nothing_stored() {
        let client = TestClient::in_memory();

        let response = client.unsigned_webhook("{}", "198.51.100.5").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        assert!(client.listed_ids("/admin/events").await.is_empty());
        assert!(client.listed_ids("/admin/dlq").await.is_empty());
    }

    #[tokio::test]
    async fn test_signature_over_different_body_rejected() {
        let client = TestClient::with_config(
            crate::harness::test_config(),
            hook_ingest::Stores::in_memory(),
        );
        let signature = hook_ingest::domain::signature::signature_header_value(
            b"{\"amount\": 1}",
            crate::harness::TEST_SECRET.as_bytes(),
        );
        let request = axum::http::Request::post("/webhook")
            .header("X-Signature", signature)
            .body(axum::body::Body::from("{\"amount\": 1000}"))
            .unwrap();

        let response = client.send(request).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(client.listed_ids("/admin/events").await.is_empty());
    }

    #[tokio::test]
    async fn test_admin_listing_is_ordered_by_arrival() {
        let client = TestClient::in_memory();
        let mut ids = Vec::new();
        for n in 0..5 {
            let id = client.webhook(&format!("{{\"n\": {}}}", n), "198.51.100.6").await.id();
            ids.push(id);
            // Distinct receivedAt values
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        assert_eq!(client.listed_ids("/admin/events").await, ids);
    }
}
