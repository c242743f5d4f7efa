//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use orbital_core::runner::Inbound;
use orbital_observer::router::build_router;
use orbital_observer::state::AppState;
use orbital_types::{Category, FeedEntry, IndicatorPhase, StatsSnapshot};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn sample_snapshot() -> StatsSnapshot {
    StatsSnapshot {
        frame: 42,
        total_events: 1234,
        rate_per_second: 18.4,
        live_entities: 96,
        live_dots: 24,
        dropped_events: 7,
        malformed_events: 1,
        stale_events: 3,
        suppressed_events: 2,
        indicator: IndicatorPhase::Active,
        visible: true,
        feed: vec![
            FeedEntry {
                category: Category::Ruby,
                coordinates: "35.68N 139.69E".to_owned(),
                timestamp_ms: 1_700_000_000_500,
            },
            FeedEntry {
                category: Category::Java,
                coordinates: "40.70N 74.00W".to_owned(),
                timestamp_ms: 1_700_000_000_000,
            },
        ],
    }
}

async fn make_test_state(control: Option<mpsc::Sender<Inbound>>) -> Arc<AppState> {
    let state = control.map_or_else(AppState::new, AppState::with_control);
    *state.snapshot.write().await = sample_snapshot();
    Arc::new(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn index_returns_html() {
    let app = build_router(make_test_state(None).await);

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(content_type.contains("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Orbital Observer"));
    assert!(html.contains("1234"));
    assert!(html.contains("35.68N 139.69E"));
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = build_router(make_test_state(None).await);

    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stats_returns_published_snapshot() {
    let app = build_router(make_test_state(None).await);

    let response = app
        .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["frame"], 42);
    assert_eq!(json["total_events"], 1234);
    assert_eq!(json["live_dots"], 24);
    assert_eq!(json["stale_events"], 3);
    assert_eq!(json["suppressed_events"], 2);
    assert_eq!(json["indicator"], "active");
    assert_eq!(json["feed"][0]["category"], "ruby");
}

#[tokio::test]
async fn feed_is_newest_first() {
    let app = build_router(make_test_state(None).await);

    let response = app
        .oneshot(Request::get("/api/feed").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["feed"][0]["coordinates"], "35.68N 139.69E");
    assert_eq!(json["feed"][1]["category"], "java");
}

#[tokio::test]
async fn visibility_post_forwards_control_message() {
    let (tx, mut rx) = mpsc::channel(4);
    let app = build_router(make_test_state(Some(tx)).await);

    let response = app
        .oneshot(
            Request::post("/api/visibility")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"visible": false}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(rx.recv().await, Some(Inbound::Visibility(false)));
}

#[tokio::test]
async fn visibility_without_control_is_unavailable() {
    let app = build_router(make_test_state(None).await);

    let response = app
        .oneshot(
            Request::post("/api/visibility")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"visible": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], 503);
}

#[tokio::test]
async fn visibility_rejects_bad_body() {
    let (tx, _rx) = mpsc::channel(4);
    let app = build_router(make_test_state(Some(tx)).await);

    let response = app
        .oneshot(
            Request::post("/api/visibility")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"shown": 1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn broadcast_reaches_subscribers() {
    let state = make_test_state(None).await;
    let mut rx = state.subscribe();

    assert_eq!(state.broadcast(&sample_snapshot()), 1);
    let received = rx.recv().await.unwrap();
    assert_eq!(received.total_events, 1234);
}
