//! REST query surface
//!
//! Thin read-only views over the telemetry store and the drop log; nothing
//! here mutates state. CORS is wide open: observers are browser dashboards
//! on arbitrary origins and there is no authentication (by scope).

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::error;

use droplink_core::{DropRecord, LiveFrame, PeakEvent, RawEntry};

use crate::state::AppState;
use crate::ws;

// ----------------------------------------------------------------------------
// Router
// ----------------------------------------------------------------------------

/// Build the full HTTP surface: REST views, the observer WebSocket, and a
/// liveness endpoint.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .route("/api/status", get(get_status))
        .route("/api/live", get(get_live))
        .route("/api/peak-events", get(get_peak_events))
        .route("/api/raw-data", get(get_raw_data))
        .route("/api/drops", get(get_drops))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ----------------------------------------------------------------------------
// Handlers
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct StatusResponse {
    connected: bool,
}

async fn health() -> impl IntoResponse {
    "OK"
}

/// Device connectivity flag.
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        connected: state.store.connected().await,
    })
}

/// Current live reading with a fresh server timestamp.
async fn get_live(State(state): State<AppState>) -> Json<LiveFrame> {
    Json(state.store.live_frame().await)
}

/// Full bounded peak-event log, newest first.
async fn get_peak_events(State(state): State<AppState>) -> Json<Vec<PeakEvent>> {
    Json(state.store.peak_events().await)
}

/// Full bounded raw-message log in stored order.
async fn get_raw_data(State(state): State<AppState>) -> Json<Vec<RawEntry>> {
    Json(state.store.raw_entries().await)
}

/// Complete durable drop history, newest first. Read failures degrade to an
/// empty list; the log itself is never the caller's problem.
async fn get_drops(State(state): State<AppState>) -> Json<Vec<DropRecord>> {
    let drop_log = state.drop_log.clone();
    match tokio::task::spawn_blocking(move || drop_log.history()).await {
        Ok(Ok(records)) => Json(records),
        Ok(Err(e)) => {
            error!("Error reading drop history: {}", e);
            Json(Vec::new())
        }
        Err(e) => {
            error!("Drop history read task failed: {}", e);
            Json(Vec::new())
        }
    }
}
