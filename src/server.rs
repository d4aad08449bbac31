//! Minimal observability surface for the `worker` subcommand (§10.5):
//! `/health` (liveness) and `/stats` (queue cardinalities as JSON). Not a
//! job-ingestion API — it exists purely so an operator can curl a running
//! worker process, reusing the same graceful-shutdown-on-signal shape the
//! reference codebase's own health endpoint uses.

use crate::queue::Queue;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone)]
struct ServerState {
    queue: Arc<Queue>,
}

pub async fn run(
    address: SocketAddr,
    queue: Arc<Queue>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), AnyError> {
    let state = ServerState { queue };
    let app = Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "observability server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn stats(State(state): State<ServerState>) -> impl IntoResponse {
    match state.queue.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// Polls the shared shutdown flag so the observability server stops in
/// lockstep with the worker and reaper tasks it runs alongside.
async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    info!("observability server shutting down");
}
