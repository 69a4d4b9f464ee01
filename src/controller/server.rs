//! # HTTP Server
//!
//! HTTP server for metrics, health checks, Kubernetes probes and read-only
//! snapshot inspection.
//!
//! Provides endpoints:
//! - `/metrics` - Prometheus metrics in text format
//! - `/healthz` - Liveness probe (always returns 200)
//! - `/readyz` - Readiness probe (returns 200 when controller is ready)
//! - `/snapshots` - Node IDs with a published snapshot
//! - `/snapshots/{node_id}` - Names-only summary of a node's published snapshot
//!
//! The server runs on port 5000 by default (configurable via `METRICS_PORT` environment variable).

use crate::observability::metrics::REGISTRY;
use crate::snapshot::InMemorySnapshotCache;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// State shared between the HTTP handlers and the controller runtime
#[derive(Debug)]
pub struct ServerState {
    pub is_ready: Arc<AtomicBool>,
    pub snapshots: Arc<InMemorySnapshotCache>,
}

impl ServerState {
    #[must_use]
    pub fn new(snapshots: Arc<InMemorySnapshotCache>) -> Self {
        Self {
            is_ready: Arc::new(AtomicBool::new(false)),
            snapshots,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::Relaxed)
    }

    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::Relaxed);
    }
}

/// Build the router; split out so handlers can be exercised without a socket
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/snapshots", get(list_snapshots_handler))
        .route("/snapshots/{node_id}", get(snapshot_handler))
        .with_state(state)
}

/// Bind and serve until the process exits
///
/// Marks the state ready once the listener is bound.
pub async fn start_server(port: u16, state: Arc<ServerState>) -> Result<(), anyhow::Error> {
    let app = router(state.clone());

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    state.set_ready(true);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readyz_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn list_snapshots_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.snapshots.node_ids())
}

async fn snapshot_handler(
    State(state): State<Arc<ServerState>>,
    Path(node_id): Path<String>,
) -> impl IntoResponse {
    match state.snapshots.snapshot(&node_id) {
        Some(snapshot) => Json(snapshot.summary()).into_response(),
        None => {
            debug!(node.id = node_id.as_str(), "No snapshot published for node");
            (
                StatusCode::NOT_FOUND,
                format!("no snapshot published for node '{node_id}'"),
            )
                .into_response()
        }
    }
}
