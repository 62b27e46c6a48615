//! Inbound HTTP surface.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/ask` | Non-streaming; `{ok, final}` or `{error}` |
//! | `POST /api/ask-stream` | Chunked `text/plain` relay of the upstream NDJSON |

mod handlers;

pub use handlers::AskRequest;

use crate::orchestrator::Orchestrator;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Capacity of the per-request relay channel.
pub const RELAY_CHANNEL_SIZE: usize = 128;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/api/ask", post(handlers::ask))
        .route("/api/ask-stream", post(handlers::ask_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { orchestrator })
}
