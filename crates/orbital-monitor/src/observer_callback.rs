//! Frame callback that publishes snapshots to the Observer API.
//!
//! Each due [`StatsSnapshot`] is broadcast to `WebSocket` clients and
//! written into the shared snapshot served by the REST endpoints.

use std::sync::Arc;

use orbital_core::engine::FrameReport;
use orbital_core::runner::FrameCallback;
use orbital_observer::state::AppState;
use orbital_types::StatsSnapshot;
use tracing::debug;

/// Callback that bridges the frame loop to the Observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl FrameCallback for ObserverCallback {
    fn on_stats(&mut self, stats: &StatsSnapshot) {
        let receivers = self.state.broadcast(stats);
        debug!(frame = stats.frame, receivers, "Stats broadcast sent");

        // try_write keeps the frame loop from blocking on a slow reader;
        // the next snapshot catches up.
        if let Ok(mut snap) = self.state.snapshot.try_write() {
            snap.clone_from(stats);
        }
    }

    fn on_frame(&mut self, report: &FrameReport) {
        if let Some(phase) = report.transition {
            debug!(frame = report.frame, ?phase, "Indicator transition");
        }
        if report.expired.total() > 0 {
            debug!(
                frame = report.frame,
                bursts = report.expired.bursts,
                dots = report.expired.dots,
                "Entities expired"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn on_stats_updates_snapshot_and_broadcasts() {
        let state = Arc::new(AppState::new());
        let mut rx = state.subscribe();
        let mut callback = ObserverCallback::new(Arc::clone(&state));

        let stats = StatsSnapshot {
            frame: 9,
            total_events: 5,
            ..StatsSnapshot::default()
        };
        callback.on_stats(&stats);

        assert_eq!(state.snapshot.read().await.total_events, 5);
        assert_eq!(rx.recv().await.ok().map(|s| s.frame), Some(9));
    }
}
