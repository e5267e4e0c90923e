//! # Secure-Hook Benchmarks
//!
//! | Component | Operation | Target |
//! |-----------|-----------|--------|
//! | Signature Verifier | HMAC-SHA256 verify, 1 KiB body | < 10µs |
//! | Rate Limiter | admit, warm identity | < 1µs |
//! | Pipeline | verify + admit + in-memory write | < 20µs |

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hook_ingest::domain::config::RateLimitConfig;
use hook_ingest::domain::signature::signature_header_value;
use hook_ingest::{
    FixedWindowLimiter, HeaderMap, InMemoryEventStore, InboundWebhook, IngestConfig,
    IngestPipeline, SignatureVerifier,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SECRET: &[u8] = b"bench-secret";

fn bench_signature_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature-verification");
    let verifier = SignatureVerifier::new(SECRET);

    for size in [64usize, 1024, 16 * 1024] {
        let body = vec![b'a'; size];
        let header = signature_header_value(&body, SECRET);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("verify", size), &body, |b, body| {
            b.iter(|| black_box(verifier.verify(body, &header)))
        });
    }

    group.finish();
}

fn bench_rate_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate-limiter");

    let limiter = FixedWindowLimiter::new(RateLimitConfig {
        max_requests: u32::MAX,
        ..RateLimitConfig::default()
    });
    let start = Instant::now();
    let mut tick = 0u64;
    group.bench_function("admit_warm_identity", |b| {
        b.iter(|| {
            tick += 1;
            // Keep the window short so the deque stays small
            let now = start + Duration::from_secs(tick / 8 * 61);
            black_box(limiter.admit("203.0.113.1", now))
        })
    });

    let many = FixedWindowLimiter::new(RateLimitConfig::default());
    let identities: Vec<String> = (0..10_000).map(|i| format!("10.0.{}.{}", i / 256, i % 256)).collect();
    let mut idx = 0usize;
    group.bench_function("admit_10k_identities", |b| {
        b.iter(|| {
            idx = (idx + 1) % identities.len();
            black_box(many.admit(&identities[idx], start))
        })
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut config = IngestConfig::default();
    config.signature.secret = String::from_utf8_lossy(SECRET).into_owned();
    config.rate_limit.enabled = false;

    let pipeline = IngestPipeline::new(
        &config,
        Arc::new(FixedWindowLimiter::new(config.rate_limit.clone())),
        Arc::new(InMemoryEventStore::new()),
        Arc::new(InMemoryEventStore::new()),
    );

    let body = br#"{"event": "order.created", "id": 1234}"#.to_vec();
    let mut headers = HeaderMap::new();
    headers.insert("x-signature".into(), signature_header_value(&body, SECRET));
    headers.insert("content-type".into(), "application/json".into());

    c.bench_function("pipeline/ingest_stored", |b| {
        b.iter(|| {
            let request = InboundWebhook {
                identity: "203.0.113.1".into(),
                headers: headers.clone(),
                body: body.clone(),
            };
            black_box(pipeline.ingest_at(request, Instant::now(), Utc::now()).is_ok())
        })
    });
}

criterion_group!(
    benches,
    bench_signature_verification,
    bench_rate_limiter,
    bench_pipeline
);
criterion_main!(benches);
