//! Server-Sent-Events endpoint fanning sampled datagrams out to clients.
//!
//! Every client gets its own broadcast receiver. A client that falls
//! behind skips the payloads it missed; the relay never buffers per
//! client beyond the broadcast capacity.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use futures::stream::{self, Stream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Capacity of the payload broadcast channel.
pub const BROADCAST_CAPACITY: usize = 1024;

/// Shared state for the relay's HTTP side.
#[derive(Clone)]
pub struct RelayState {
    /// Sampled payloads from the UDP listener.
    pub tx: broadcast::Sender<String>,
    /// Reconnect delay advertised to each client via `retry:` on its first
    /// event.
    pub retry: Duration,
}

impl RelayState {
    /// Create state with a fresh broadcast channel.
    pub fn new(retry: Duration) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx, retry }
    }
}

/// Build the relay router.
///
/// - `GET /stream` -- `text/event-stream` of raw event tuples
/// - `GET /healthz` -- liveness probe
pub fn build_router(state: Arc<RelayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/stream", get(stream_events))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn stream_events(
    State(state): State<Arc<RelayState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(clients = state.tx.receiver_count(), "Stream client connected");

    let payloads = stream::unfold(
        (state.tx.subscribe(), Some(state.retry)),
        |(mut rx, mut retry)| async move {
            loop {
                match rx.recv().await {
                    Ok(payload) if payload.contains('\r') => {
                        debug!("Dropping payload with a carriage return");
                    }
                    Ok(payload) => {
                        // Decoders discard events without data, so the hint rides on the first one.
                        let event = retry
                            .take()
                            .map_or_else(Event::default, |after| Event::default().retry(after));
                        return Some((Ok(event.data(payload)), (rx, retry)));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Stream client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        },
    );

    Sse::new(payloads).keep_alive(KeepAlive::default())
}
