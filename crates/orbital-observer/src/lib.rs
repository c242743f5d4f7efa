//! Observer API server for the Orbital telemetry globe.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/stats`) streaming every published
//!   [`StatsSnapshot`] via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the latest counters and the activity feed
//! - **Visibility control** (`POST /api/visibility`) forwarded to the frame
//!   driver as an [`Inbound`] message
//! - **Minimal HTML status page** (`GET /`) and a liveness probe
//!   (`GET /healthz`)
//!
//! # Architecture
//!
//! The observer never touches the engine. It reads the most recent
//! snapshot published by the frame driver and sends control messages back
//! through the same bounded channel the stream transport uses.
//!
//! [`StatsSnapshot`]: orbital_types::StatsSnapshot
//! [`Inbound`]: orbital_core::runner::Inbound

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
