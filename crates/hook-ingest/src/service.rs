//! Ingestion service - HTTP entry point.
//!
//! Routes:
//!
//! | Method     | Path                  | Purpose                        |
//! |------------|-----------------------|--------------------------------|
//! | POST       | `/webhook`            | Ingest a signed webhook        |
//! | GET        | `/admin/events`       | List the primary store         |
//! | GET        | `/admin/dlq`          | List the dead-letter queue     |
//! | GET, POST  | `/admin/replay/{id}`  | Replay a DLQ event             |
//! | GET        | `/healthz`            | Liveness                       |
//! | GET        | `/metrics`            | Prometheus text                |
//!
//! Store and pipeline calls are synchronous and run on the blocking pool.

use crate::domain::config::{IngestConfig, StorageBackend, StorageConfig};
use crate::domain::error::{ApiError, ApiResult, ServiceError, StoreError};
use crate::domain::event::{Event, EventId, HeaderMap};
use crate::domain::rate_limit::{cleanup_task, FixedWindowLimiter};
use crate::middleware::{client_identity, panic_response, IngestMetrics, TracingLayer};
use crate::pipeline::{InboundWebhook, IngestOutcome, IngestPipeline};
use crate::ports::outbound::{sort_events, EventStore};
use crate::replay::ReplayOrchestrator;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Path, Request, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};
use tracing::{error, info, warn};

/// Message returned with a dead-lettered webhook
pub const DEAD_LETTER_MESSAGE: &str = "Webhook processing failed, sent to DLQ";

/// The primary store and the DLQ
#[derive(Clone)]
pub struct Stores {
    pub primary: Arc<dyn EventStore>,
    pub dlq: Arc<dyn EventStore>,
}

impl Stores {
    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        use crate::adapters::memory::InMemoryEventStore;
        Self {
            primary: Arc::new(InMemoryEventStore::new()),
            dlq: Arc::new(InMemoryEventStore::new()),
        }
    }

    /// Both tables of one SQLite database
    #[cfg(feature = "sqlite")]
    pub fn sqlite(db: &crate::adapters::sqlite::SqliteDatabase) -> Self {
        Self {
            primary: Arc::new(db.events()),
            dlq: Arc::new(db.dlq()),
        }
    }

    /// Open the stores selected by `config`
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackend::Memory => {
                warn!("Using in-memory storage; events are lost on restart");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite => {
                let db = crate::adapters::sqlite::SqliteDatabase::open(
                    &config.path,
                    config.busy_timeout,
                )?;
                Ok(Self::sqlite(&db))
            }
            #[cfg(not(feature = "sqlite"))]
            StorageBackend::Sqlite => Err(StoreError::backend(
                "built without the sqlite feature",
            )),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<IngestPipeline>,
    replay: Arc<ReplayOrchestrator>,
    stores: Stores,
    metrics: Arc<IngestMetrics>,
    max_body_bytes: usize,
}

/// Ingestion service
pub struct IngestService {
    config: IngestConfig,
    state: AppState,
}

impl IngestService {
    /// Create a new ingestion service
    pub fn new(config: IngestConfig, stores: Stores) -> Result<Self, ServiceError> {
        config
            .validate()
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        let limiter = Arc::new(FixedWindowLimiter::new(config.rate_limit.clone()));
        let pipeline = Arc::new(IngestPipeline::new(
            &config,
            limiter,
            Arc::clone(&stores.primary),
            Arc::clone(&stores.dlq),
        ));
        let replay = Arc::new(ReplayOrchestrator::new(
            Arc::clone(&stores.primary),
            Arc::clone(&stores.dlq),
        ));

        let state = AppState {
            pipeline,
            replay,
            stores,
            metrics: Arc::new(IngestMetrics::new()),
            max_body_bytes: config.http.max_body_bytes,
        };

        Ok(Self { config, state })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.state.metrics)
    }

    pub fn limiter(&self) -> Arc<FixedWindowLimiter> {
        Arc::clone(self.state.pipeline.limiter())
    }

    /// Build the HTTP router with the full middleware stack
    pub fn router(&self) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TracingLayer::new(Arc::clone(&self.state.metrics)))
            .layer(TimeoutLayer::new(self.config.http.request_timeout))
            .layer(DefaultBodyLimit::max(self.config.http.max_body_bytes));

        Router::new()
            .route("/webhook", post(handle_webhook))
            .route("/admin/events", get(list_events))
            .route("/admin/dlq", get(list_dlq))
            .route("/admin/replay/:id", get(replay_event).post(replay_event))
            .route("/healthz", get(health_check))
            .route("/metrics", get(render_metrics))
            .layer(middleware)
            .with_state(self.state.clone())
    }

    /// Bind the configured listen address
    pub async fn bind(&self) -> Result<TcpListener, ServiceError> {
        let addr = self.config.http_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::Bind(format!("{}: {}", addr, e)))
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests for at
    /// most `http.shutdown_grace`.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Bind(e.to_string()))?;
        let grace = self.config.http.shutdown_grace;

        // Start cleanup tasks
        let sweeper = tokio::spawn(cleanup_task(
            self.limiter(),
            self.config.rate_limit.sweep_interval,
        ));

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let signal = async move {
            shutdown.await;
            info!("Shutdown requested, draining in-flight requests");
            let _ = drain_tx.send(());
        };

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .into_future();
        tokio::pin!(server);

        info!(addr = %local_addr, "Webhook ingestion service listening");

        let result = tokio::select! {
            result = &mut server => result.map_err(|e| ServiceError::Internal(e.to_string())),
            _ = async {
                if drain_rx.await.is_err() {
                    std::future::pending::<()>().await;
                }
                tokio::time::sleep(grace).await;
            } => {
                warn!(grace_ms = grace.as_millis() as u64, "Shutdown grace period elapsed, abandoning in-flight requests");
                Ok(())
            }
        };

        sweeper.abort();
        info!("Webhook ingestion service stopped");
        result
    }
}

#[derive(Serialize)]
struct IngestResponse<'a> {
    status: &'static str,
    id: &'a EventId,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Run a blocking closure, turning a panic into a 500.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "Blocking task failed");
        ApiError::internal("request processing failed")
    })
}

fn extract_headers(parts: &Parts) -> HeaderMap {
    parts
        .headers
        .keys()
        .filter_map(|name| {
            // `get` yields the first value of a repeated header
            parts.headers.get(name).map(|value| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
        })
        .collect()
}

/// Handle POST /webhook
async fn handle_webhook(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let identity = client_identity(&parts);
    let headers = extract_headers(&parts);

    // Buffering through `Bytes` honours `DefaultBodyLimit`
    let body = match Bytes::from_request(Request::from_parts(parts, body), &state).await {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(limit = state.max_body_bytes, "Webhook body too large");
            return ApiError::payload_too_large(state.max_body_bytes).into_response();
        }
        Err(rejection) => {
            warn!(error = %rejection, "Failed to read webhook body");
            return ApiError::bad_request("Failed to read request body").into_response();
        }
    };

    let inbound = InboundWebhook {
        identity,
        headers,
        body: body.to_vec(),
    };

    let pipeline = Arc::clone(&state.pipeline);
    let result = match blocking(move || pipeline.ingest(inbound)).await {
        Ok(result) => result,
        Err(e) => return e.into_response(),
    };
    state.metrics.record_ingest(&result);

    match result {
        Ok(IngestOutcome::Stored { id }) => (
            StatusCode::OK,
            Json(IngestResponse {
                status: "stored",
                id: &id,
                message: None,
            }),
        )
            .into_response(),
        Ok(IngestOutcome::DeadLettered { id }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(IngestResponse {
                status: "dead_lettered",
                id: &id,
                message: Some(DEAD_LETTER_MESSAGE),
            }),
        )
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn list_store(store: Arc<dyn EventStore>) -> ApiResult<Json<Vec<Event>>> {
    let mut events = blocking(move || store.list_all()).await??;
    sort_events(&mut events);
    Ok(Json(events))
}

/// Handle GET /admin/events
async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<Event>>> {
    list_store(Arc::clone(&state.stores.primary)).await
}

/// Handle GET /admin/dlq
async fn list_dlq(State(state): State<AppState>) -> ApiResult<Json<Vec<Event>>> {
    list_store(Arc::clone(&state.stores.dlq)).await
}

/// Handle GET|POST /admin/replay/{id}
async fn replay_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = EventId::from(id);
    let replay = Arc::clone(&state.replay);
    let lookup = id.clone();
    let result = blocking(move || replay.replay(&lookup)).await?;
    state.metrics.record_replay(result.is_ok());

    result?;
    Ok(Json(IngestResponse {
        status: "replayed",
        id: &id,
        message: None,
    })
    .into_response())
}

/// Handle GET /healthz
async fn health_check() -> &'static str {
    "ok"
}

/// Handle GET /metrics
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .to_prometheus(state.pipeline.limiter().tracked_identities());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
