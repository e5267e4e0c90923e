//! # Rate Limiting
//!
//! Per-identity quota as seen by HTTP clients.

#[cfg(test)]
mod tests {
    use crate::harness::{test_config, TestClient};
    use axum::http::{header, StatusCode};
    use hook_ingest::Stores;

    #[tokio::test]
    async fn test_eleventh_request_is_rejected() {
        let client = TestClient::in_memory();

        for n in 0..10 {
            // Alternate outcomes; both consume quota
            let body = if n % 3 == 0 {
                r#"{"fail": true}"#.to_string()
            } else {
                format!("{{\"n\": {}}}", n)
            };
            let response = client.webhook(&body, "203.0.113.10").await;
            assert!(
                response.status == StatusCode::OK
                    || response.status == StatusCode::INTERNAL_SERVER_ERROR,
                "request {} got {}",
                n,
                response.status
            );
        }

        let response = client.webhook("{}", "203.0.113.10").await;
        assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers.contains_key(header::RETRY_AFTER));

        let stored = client.listed_ids("/admin/events").await.len();
        let dead = client.listed_ids("/admin/dlq").await.len();
        assert_eq!(stored + dead, 10);
    }

    #[tokio::test]
    async fn test_identities_have_separate_quotas() {
        let mut config = test_config();
        config.rate_limit.max_requests = 2;
        let client = TestClient::with_config(config, Stores::in_memory());

        for _ in 0..2 {
            assert_eq!(client.webhook("{}", "203.0.113.20").await.status, StatusCode::OK);
        }
        assert_eq!(
            client.webhook("{}", "203.0.113.20").await.status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(client.webhook("{}", "203.0.113.21").await.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forwarded_for_first_hop_is_the_identity() {
        let mut config = test_config();
        config.rate_limit.max_requests = 1;
        let client = TestClient::with_config(config, Stores::in_memory());

        assert_eq!(
            client.webhook("{}", "203.0.113.30, 10.0.0.1").await.status,
            StatusCode::OK
        );
        // Same client behind a different proxy hop
        assert_eq!(
            client.webhook("{}", "203.0.113.30, 10.0.0.2").await.status,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_requests_do_not_use_quota() {
        let mut config = test_config();
        config.rate_limit.max_requests = 1;
        let client = TestClient::with_config(config, Stores::in_memory());

        for _ in 0..5 {
            assert_eq!(
                client.unsigned_webhook("{}", "203.0.113.40").await.status,
                StatusCode::UNAUTHORIZED
            );
        }
        assert_eq!(client.webhook("{}", "203.0.113.40").await.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_disabled_limiter_admits_everything() {
        let mut config = test_config();
        config.rate_limit.enabled = false;
        let client = TestClient::with_config(config, Stores::in_memory());

        for _ in 0..25 {
            assert_eq!(client.webhook("{}", "203.0.113.50").await.status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_metrics_count_rejections() {
        let mut config = test_config();
        config.rate_limit.max_requests = 1;
        let client = TestClient::with_config(config, Stores::in_memory());

        client.webhook("{}", "203.0.113.60").await;
        client.webhook("{}", "203.0.113.60").await;
        client.unsigned_webhook("{}", "203.0.113.60").await;

        let text = client.get("/metrics").await.text();
        assert!(text.contains("hook_events_stored_total 1\n"));
        assert!(text.contains("hook_rate_limit_rejected_total 1\n"));
        assert!(text.contains("hook_auth_rejected_total 1\n"));
        assert!(text.contains("hook_rate_limit_tracked_identities 1\n"));
    }
}
