//! REST API endpoint handlers for the Observer server.
//!
//! All reads are served from the latest [`StatsSnapshot`] in the shared
//! [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/healthz` | Liveness probe |
//! | `GET` | `/api/stats` | Latest stats snapshot |
//! | `GET` | `/api/feed` | Recent-activity feed |
//! | `POST` | `/api/visibility` | Show or hide the display |
//!
//! [`StatsSnapshot`]: orbital_types::StatsSnapshot

use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use orbital_core::runner::Inbound;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Body of `POST /api/visibility`.
#[derive(Debug, serde::Deserialize)]
pub struct VisibilityRequest {
    /// `true` to resume rendering, `false` to suspend it.
    pub visible: bool,
}

/// Serve a minimal HTML status page with live counters.
///
/// # Route
///
/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;

    let mut feed = String::new();
    for entry in &snapshot.feed {
        let color = entry.category.color();
        let _ = writeln!(
            feed,
            r#"        <li><span style="color: rgb({}, {}, {})">{}</span> {}</li>"#,
            color.r, color.g, color.b, entry.category, entry.coordinates
        );
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Orbital Observer</title>
    <style>
        body {{
            background: #05070d;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #0d1117;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.2rem 0; }}
    </style>
</head>
<body>
    <h1>Orbital Observer</h1>
    <p class="subtitle">Live telemetry globe -- frame {frame}</p>

    <div>
        <div class="metric"><div class="label">Events</div><div class="value">{total}</div></div>
        <div class="metric"><div class="label">Per second</div><div class="value">{rate:.1}</div></div>
        <div class="metric"><div class="label">Live entities</div><div class="value">{entities}</div></div>
        <div class="metric"><div class="label">Live dots</div><div class="value">{dots}</div></div>
        <div class="metric"><div class="label">Dropped</div><div class="value">{dropped}</div></div>
        <div class="metric"><div class="label">Indicator</div><div class="value">{indicator:?}</div></div>
        <div class="metric"><div class="label">Visible</div><div class="value">{visible}</div></div>
    </div>

    <h2>Recent activity</h2>
    <ul>
{feed}    </ul>
</body>
</html>"#,
        frame = snapshot.frame,
        total = snapshot.total_events,
        rate = snapshot.rate_per_second,
        entities = snapshot.live_entities,
        dots = snapshot.live_dots,
        dropped = snapshot.dropped_events,
        indicator = snapshot.indicator,
        visible = snapshot.visible,
    ))
}

/// Liveness probe.
///
/// # Route
///
/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}

/// Return the latest stats snapshot.
///
/// # Route
///
/// `GET /api/stats`
pub async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.clone())
}

/// Return the recent-activity feed, newest first.
///
/// # Route
///
/// `GET /api/feed`
pub async fn get_feed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(serde_json::json!({
        "count": snapshot.feed.len(),
        "feed": snapshot.feed,
    }))
}

/// Forward a visibility change to the frame driver.
///
/// # Route
///
/// `POST /api/visibility`
pub async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisibilityRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let control = state
        .control
        .as_ref()
        .ok_or(ObserverError::ControlUnavailable)?;

    control
        .send(Inbound::Visibility(request.visible))
        .await
        .map_err(|e| ObserverError::ControlClosed(e.to_string()))?;

    info!(visible = request.visible, "Visibility change requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "visible": request.visible })),
    ))
}
