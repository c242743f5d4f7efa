//! Frame loop driver.
//!
//! [`run_frames`] owns the engine for its whole lifetime. Payloads and
//! visibility changes arrive over a bounded channel and are applied
//! between frames, so no lock ever guards engine state.

use std::time::Duration;

use orbital_types::StatsSnapshot;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::clock::{ClockError, FrameClock};
use crate::diagnostics::DiagnosticSink;
use crate::engine::{FrameReport, IngestOutcome, OrbitalEngine};
use crate::surface::RenderSurface;

/// Errors that can stop the frame loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The frame clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Messages delivered to the frame driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One raw stream payload.
    Message(String),
    /// The display became visible (`true`) or hidden (`false`).
    Visibility(bool),
    /// Stop the loop after the current step.
    Shutdown,
}

/// Why the frame loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An [`Inbound::Shutdown`] was received.
    Shutdown,
    /// Every sender was dropped.
    ChannelClosed,
}

/// Totals from one run of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop ended.
    pub reason: StopReason,
    /// Frames the clock advanced through.
    pub frames: u64,
    /// Payloads handed to the engine.
    pub messages: u64,
    /// Payloads that materialized markers.
    pub admitted: u64,
}

/// Callback invoked from the frame loop.
///
/// Implementations publish snapshots to the observer, log, or record for
/// tests.
pub trait FrameCallback: Send {
    /// Called whenever a stats snapshot is due, and on every visibility
    /// change.
    fn on_stats(&mut self, stats: &StatsSnapshot);

    /// Called after every visible frame.
    fn on_frame(&mut self, _report: &FrameReport) {}
}

/// A no-op frame callback for testing.
pub struct NoOpCallback;

impl FrameCallback for NoOpCallback {
    fn on_stats(&mut self, _stats: &StatsSnapshot) {}
}

/// Drive the engine until shutdown or until every sender is gone.
///
/// Frames fire every `frame_interval`; late frames are skipped rather than
/// replayed in a burst.
///
/// # Errors
///
/// Returns [`RunnerError`] if the frame clock overflows.
pub async fn run_frames<S, D>(
    engine: &mut OrbitalEngine<S, D>,
    clock: &mut FrameClock,
    inbound: &mut mpsc::Receiver<Inbound>,
    frame_interval: Duration,
    callback: &mut dyn FrameCallback,
) -> Result<RunSummary, RunnerError>
where
    S: RenderSurface,
    D: DiagnosticSink,
{
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut summary = RunSummary {
        reason: StopReason::ChannelClosed,
        frames: 0,
        messages: 0,
        admitted: 0,
    };

    info!(
        frame_interval_ms = u64::try_from(frame_interval.as_millis()).unwrap_or(u64::MAX),
        "Frame loop starting"
    );

    loop {
        tokio::select! {
            message = inbound.recv() => match message {
                Some(Inbound::Message(payload)) => {
                    let now = clock.now();
                    summary.messages = summary.messages.saturating_add(1);
                    if engine.ingest(&payload, now.now_ms, now.wall_ms) == IngestOutcome::Admitted {
                        summary.admitted = summary.admitted.saturating_add(1);
                    }
                }
                Some(Inbound::Visibility(visible)) => {
                    let now_ms = clock.elapsed_ms();
                    engine.set_visible(visible, now_ms);
                    callback.on_stats(&engine.stats(now_ms));
                }
                Some(Inbound::Shutdown) => {
                    summary.reason = StopReason::Shutdown;
                    break;
                }
                None => {
                    warn!("Inbound channel closed");
                    break;
                }
            },
            _ = ticker.tick() => {
                let time = clock.advance()?;
                summary.frames = summary.frames.saturating_add(1);
                if let Some(report) = engine.tick(time) {
                    if let Some(stats) = &report.stats {
                        callback.on_stats(stats);
                    }
                    callback.on_frame(&report);
                }
            }
        }
    }

    info!(
        reason = ?summary.reason,
        frames = summary.frames,
        messages = summary.messages,
        admitted = summary.admitted,
        dropped = engine.dropped(),
        "Frame loop ended"
    );
    Ok(summary)
}
