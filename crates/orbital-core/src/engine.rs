//! The Orbital engine: one owner for every piece of per-frame state.
//!
//! Message arrival is a plain [`OrbitalEngine::ingest`] call and frame
//! progression is a plain [`OrbitalEngine::tick`] call. Scheduling both is
//! the job of [`crate::runner::run_frames`]; the engine itself never
//! touches a timer or a socket.

use orbital_types::{Event, IndicatorPhase, StatsSnapshot};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::admission::AdmissionController;
use crate::clock::FrameTime;
use crate::config::{ConfigError, OrbitalConfig};
use crate::diagnostics::DiagnosticSink;
use crate::indicator::{IndicatorMachine, IndicatorPose};
use crate::lifecycle::{EntityManager, ExpiryReport};
use crate::reporter::Reporter;
use crate::stream::{Consumed, StreamConsumer};
use crate::surface::RenderSurface;
use crate::visibility::VisibilityGate;

/// What happened to one inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Counted and rendered.
    Admitted,
    /// Counted but refused by the admission controller.
    Rejected,
    /// Failed to decode.
    Malformed,
    /// Outside the skew tolerance.
    Stale,
    /// Decoded while hidden and discarded.
    Suppressed,
}

/// Everything that changed during one visible frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Frame number.
    pub frame: u64,
    /// Entities removed this frame.
    pub expired: ExpiryReport,
    /// Indicator phase entered this frame, if any.
    pub transition: Option<IndicatorPhase>,
    /// Indicator pose, if the indicator is on screen.
    pub indicator: Option<IndicatorPose>,
    /// Stats snapshot, when one is due this frame.
    pub stats: Option<StatsSnapshot>,
}

/// Stream-driven marker engine.
///
/// Generic over the render surface and the diagnostic sink so the same
/// engine runs headless in the monitor and against recorders in tests.
#[derive(Debug)]
pub struct OrbitalEngine<S, D> {
    consumer: StreamConsumer,
    admission: AdmissionController,
    entities: EntityManager,
    indicator: IndicatorMachine,
    reporter: Reporter,
    gate: VisibilityGate,
    rng: SmallRng,
    surface: S,
    sink: D,
    radius: f64,
    frame: u64,
}

impl<S: RenderSurface, D: DiagnosticSink> OrbitalEngine<S, D> {
    /// Build an engine from validated configuration.
    ///
    /// The admission sampler is seeded from `engine.seed` when present and
    /// from the OS otherwise.
    pub fn new(config: &OrbitalConfig, surface: S, sink: D, now_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = config
            .engine
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);

        info!(
            seed = ?config.engine.seed,
            soft_limit = config.admission.soft_limit,
            hard_limit = config.admission.hard_limit,
            stale_threshold_ms = config.stream.stale_threshold_ms,
            "Engine initialized"
        );

        Ok(Self {
            consumer: StreamConsumer::new(config.stream.stale_threshold_ms),
            admission: AdmissionController::new(&config.admission),
            entities: EntityManager::new(config.entities.clone()),
            indicator: IndicatorMachine::new(
                config.indicator.clone(),
                config.engine.globe_radius,
                now_ms,
            ),
            reporter: Reporter::new(config.reporter.clone()),
            gate: VisibilityGate::new(),
            rng,
            surface,
            sink,
            radius: config.engine.globe_radius,
            frame: 0,
        })
    }

    /// Handle one raw stream payload.
    ///
    /// `now_ms` is the monotonic frame time; `wall_ms` is the wall clock
    /// used for the staleness check.
    pub fn ingest(&mut self, payload: &str, now_ms: u64, wall_ms: i64) -> IngestOutcome {
        let visible = self.gate.is_visible();
        match self.consumer.consume(payload, wall_ms, visible, &mut self.sink) {
            Consumed::Accepted(event) => self.ingest_event(&event, now_ms),
            Consumed::Malformed => IngestOutcome::Malformed,
            Consumed::Stale { skew_ms } => {
                debug!(skew_ms, "Stale event discarded");
                IngestOutcome::Stale
            }
            Consumed::Suppressed => IngestOutcome::Suppressed,
        }
    }

    /// Handle one already validated event.
    ///
    /// Every event is counted and offered to the indicator; only the
    /// visual materialization is subject to admission.
    pub fn ingest_event(&mut self, event: &Event, now_ms: u64) -> IngestOutcome {
        self.reporter.record_event(event, now_ms);
        self.indicator.record(event.location);

        let live = self.entities.live_dots();
        if !self.admission.should_admit(live, &mut self.rng, &mut self.sink) {
            return IngestOutcome::Rejected;
        }

        let position = event.location.to_globe(self.radius);
        self.entities
            .spawn(position, event.category.color(), now_ms, &mut self.surface);
        IngestOutcome::Admitted
    }

    /// Advance one frame.
    ///
    /// Returns `None` without doing any work while the display is hidden.
    pub fn tick(&mut self, time: FrameTime) -> Option<FrameReport> {
        if !self.gate.is_visible() {
            return None;
        }
        self.frame = time.frame;

        let expired = self.entities.update(time.now_ms, &mut self.surface);
        let transition = self.indicator.tick(time.now_ms);
        if let Some(phase) = transition {
            debug!(frame = time.frame, ?phase, "Indicator transition");
        }
        let indicator = self.indicator.pose(time.now_ms);
        let stats = self
            .reporter
            .snapshot_due(time.now_ms)
            .then(|| self.stats(time.now_ms));

        Some(FrameReport {
            frame: time.frame,
            expired,
            transition,
            indicator,
            stats,
        })
    }

    /// Show or hide the display.
    ///
    /// On resume the indicator's deadlines are shifted forward by the
    /// hidden duration. Entities are left alone and expire in one batch on
    /// the next visible frame.
    pub fn set_visible(&mut self, visible: bool, now_ms: u64) {
        if let Some(hidden_ms) = self.gate.set(visible, now_ms) {
            self.indicator.shift(hidden_ms);
            info!(hidden_ms, "Display resumed");
        } else if !visible {
            info!("Display hidden");
        }
    }

    /// Build a stats snapshot as of `now_ms`.
    pub fn stats(&mut self, now_ms: u64) -> StatsSnapshot {
        StatsSnapshot {
            frame: self.frame,
            total_events: self.reporter.total(),
            rate_per_second: self.reporter.rate(now_ms),
            live_entities: u32::try_from(self.entities.len()).unwrap_or(u32::MAX),
            live_dots: self.entities.live_dots(),
            dropped_events: self.admission.dropped(),
            malformed_events: self.consumer.malformed(),
            stale_events: self.consumer.stale(),
            suppressed_events: self.consumer.suppressed(),
            indicator: self.indicator.phase(),
            visible: self.gate.is_visible(),
            feed: self.reporter.feed(),
        }
    }

    /// Live entities of both kinds.
    pub fn live_entities(&self) -> usize {
        self.entities.len()
    }

    /// Live persistent dots.
    pub const fn live_dots(&self) -> u32 {
        self.entities.live_dots()
    }

    /// Events refused by admission.
    pub const fn dropped(&self) -> u64 {
        self.admission.dropped()
    }

    /// Cumulative validated events.
    pub const fn total_events(&self) -> u64 {
        self.reporter.total()
    }

    /// Current indicator phase.
    pub const fn indicator_phase(&self) -> IndicatorPhase {
        self.indicator.phase()
    }

    /// Whether the display is visible.
    pub const fn is_visible(&self) -> bool {
        self.gate.is_visible()
    }

    /// The render surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The diagnostic sink.
    pub const fn sink(&self) -> &D {
        &self.sink
    }
}
