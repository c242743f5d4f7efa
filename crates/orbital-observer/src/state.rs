//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for stats snapshots, the most
//! recent snapshot served by the REST endpoints, and the optional control
//! channel into the frame driver.

use std::sync::Arc;

use orbital_core::runner::Inbound;
use orbital_types::StatsSnapshot;
use tokio::sync::{RwLock, broadcast, mpsc};

/// Capacity of the broadcast channel for stats snapshots.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 64;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for stats snapshots.
    pub tx: broadcast::Sender<StatsSnapshot>,
    /// The latest published snapshot.
    pub snapshot: Arc<RwLock<StatsSnapshot>>,
    /// Control channel into the frame driver (absent in read-only setups).
    pub control: Option<mpsc::Sender<Inbound>>,
}

impl AppState {
    /// Create a read-only application state with an empty snapshot.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(StatsSnapshot::default())),
            control: None,
        }
    }

    /// Create an application state that can forward control messages.
    pub fn with_control(control: mpsc::Sender<Inbound>) -> Self {
        Self {
            control: Some(control),
            ..Self::new()
        }
    }

    /// Subscribe to the stats broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<StatsSnapshot> {
        self.tx.subscribe()
    }

    /// Publish a snapshot to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, stats: &StatsSnapshot) -> usize {
        self.tx.send(stats.clone()).unwrap_or(0)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
