//! Axum router construction for the Observer API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /healthz` -- liveness probe
/// - `GET /ws/stats` -- `WebSocket` stats stream
/// - `GET /api/stats` -- latest stats snapshot
/// - `GET /api/feed` -- recent-activity feed
/// - `POST /api/visibility` -- show or hide the display
///
/// CORS allows any origin so a browser-hosted globe can poll the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/ws/stats", get(ws::ws_stats))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/feed", get(handlers::get_feed))
        .route("/api/visibility", post(handlers::set_visibility))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
