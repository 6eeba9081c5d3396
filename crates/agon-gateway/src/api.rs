//! HTTP API for the Agon gateway.
//!
//! Serves the health endpoint and the event ingest endpoint used by chain
//! indexers, and mounts the real-time WebSocket routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::bridge::RealtimeBridge;
use agon_types::GameEvent;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bridge between the dispatcher and live connections.
    pub bridge: Arc<RealtimeBridge>,
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Event ingest for trusted producers
        .route("/api/events", post(publish_event))
        // WebSocket endpoint and realtime introspection
        .merge(crate::ws::realtime_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Accepts an event from a producer and fans it out to subscribers.
async fn publish_event(
    State(state): State<AppState>,
    Json(event): Json<GameEvent>,
) -> impl IntoResponse {
    let kind = event.kind();
    state.bridge.dispatcher().emit(event);

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "accepted",
            "event": kind.as_str(),
        })),
    )
}
