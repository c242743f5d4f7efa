//! Periodic highlight of the most recent event location.
//!
//! The indicator cycles `Hidden -> FadingIn -> Active -> FadingOut -> Hidden`.
//! It only appears once a location has been recorded and the cycle delay
//! has passed. The hover target is captured when the fade-in starts, so
//! later events do not move an indicator that is already on screen.

use orbital_types::{GeoPoint, IndicatorPhase, Vec3};

use crate::config::IndicatorConfig;

/// Renderable state of a visible indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPose {
    /// Current phase.
    pub phase: IndicatorPhase,
    /// Position including the bobbing offset.
    pub position: Vec3,
    /// Unit vector from the indicator toward the globe origin.
    pub facing: Vec3,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// State machine driving the indicator cycle.
#[derive(Debug, Clone)]
pub struct IndicatorMachine {
    phase: IndicatorPhase,
    entered_at_ms: u64,
    next_appear_ms: u64,
    last_location: Option<GeoPoint>,
    target: Option<Vec3>,
    config: IndicatorConfig,
    radius: f64,
}

impl IndicatorMachine {
    /// Create a hidden indicator whose first appearance is one cycle after
    /// `now_ms`.
    pub fn new(config: IndicatorConfig, radius: f64, now_ms: u64) -> Self {
        Self {
            phase: IndicatorPhase::Hidden,
            entered_at_ms: now_ms,
            next_appear_ms: now_ms.saturating_add(config.cycle_ms),
            last_location: None,
            target: None,
            config,
            radius,
        }
    }

    /// Remember the most recent event location as the next hover candidate.
    pub const fn record(&mut self, location: GeoPoint) {
        self.last_location = Some(location);
    }

    /// Advance the machine, performing at most one transition.
    ///
    /// Returns the phase entered, if any. Entry timestamps advance by the
    /// exact phase duration so frame jitter does not accumulate.
    pub fn tick(&mut self, now_ms: u64) -> Option<IndicatorPhase> {
        let elapsed = now_ms.saturating_sub(self.entered_at_ms);
        match self.phase {
            IndicatorPhase::Hidden => {
                if now_ms < self.next_appear_ms {
                    return None;
                }
                let location = self.last_location?;
                let lift = 1.0 + self.config.hover_lift;
                self.target = Some(location.to_globe(self.radius).scale(lift));
                self.entered_at_ms = now_ms;
            }
            IndicatorPhase::FadingIn => {
                if elapsed < self.config.fade_ms {
                    return None;
                }
                self.entered_at_ms = self.entered_at_ms.saturating_add(self.config.fade_ms);
            }
            IndicatorPhase::Active => {
                if elapsed < self.config.hover_ms {
                    return None;
                }
                self.entered_at_ms = self.entered_at_ms.saturating_add(self.config.hover_ms);
            }
            IndicatorPhase::FadingOut => {
                if elapsed < self.config.fade_ms {
                    return None;
                }
                let hidden_at = self.entered_at_ms.saturating_add(self.config.fade_ms);
                self.entered_at_ms = hidden_at;
                self.next_appear_ms = hidden_at.saturating_add(self.config.cycle_ms);
                self.target = None;
            }
        }
        self.phase = self.phase.next();
        Some(self.phase)
    }

    /// Opacity at `now_ms` for the current phase.
    pub fn opacity(&self, now_ms: u64) -> f64 {
        let fraction = || {
            let elapsed = now_ms.saturating_sub(self.entered_at_ms);
            #[allow(clippy::cast_precision_loss)]
            let t = elapsed as f64 / self.config.fade_ms.max(1) as f64;
            t.clamp(0.0, 1.0)
        };
        match self.phase {
            IndicatorPhase::Hidden => 0.0,
            IndicatorPhase::FadingIn => fraction(),
            IndicatorPhase::Active => 1.0,
            IndicatorPhase::FadingOut => 1.0 - fraction(),
        }
    }

    /// Renderable pose, or `None` while hidden.
    pub fn pose(&self, now_ms: u64) -> Option<IndicatorPose> {
        let target = self.target?;
        if self.phase == IndicatorPhase::Hidden {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let cycle = (now_ms % self.config.bob_period_ms.max(1)) as f64
            / self.config.bob_period_ms.max(1) as f64;
        let bob = (cycle * std::f64::consts::TAU).sin() * self.config.bob_amplitude;
        let direction = target.normalized();
        let position = target.translate(direction.scale(bob));

        Some(IndicatorPose {
            phase: self.phase,
            position,
            facing: position.scale(-1.0).normalized(),
            opacity: self.opacity(now_ms),
        })
    }

    /// Move every pending deadline forward by `delta_ms`.
    ///
    /// Used after the display resumes so the cycle continues where it left
    /// off instead of firing immediately.
    pub const fn shift(&mut self, delta_ms: u64) {
        self.entered_at_ms = self.entered_at_ms.saturating_add(delta_ms);
        self.next_appear_ms = self.next_appear_ms.saturating_add(delta_ms);
    }

    /// Current phase.
    pub const fn phase(&self) -> IndicatorPhase {
        self.phase
    }

    /// Monotonic time the next appearance becomes possible.
    pub const fn next_appear_ms(&self) -> u64 {
        self.next_appear_ms
    }

    /// Time the current phase was entered.
    pub const fn entered_at_ms(&self) -> u64 {
        self.entered_at_ms
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn machine() -> IndicatorMachine {
        IndicatorMachine::new(IndicatorConfig::default(), 100.0, 0)
    }

    #[test]
    fn stays_hidden_without_a_location() {
        let mut m = machine();
        for now in (0..60_000).step_by(16) {
            assert_eq!(m.tick(now), None);
        }
        assert_eq!(m.phase(), IndicatorPhase::Hidden);
    }

    #[test]
    fn full_cycle_takes_fade_hover_fade() {
        let mut m = machine();
        m.record(GeoPoint::new(40.7, -74.0));

        let mut transitions = Vec::new();
        for now in 0..=20_000 {
            if let Some(phase) = m.tick(now) {
                transitions.push((now, phase));
            }
            if transitions.len() == 4 {
                break;
            }
        }

        assert_eq!(
            transitions,
            vec![
                (10_000, IndicatorPhase::FadingIn),
                (11_200, IndicatorPhase::Active),
                (15_200, IndicatorPhase::FadingOut),
                (16_400, IndicatorPhase::Hidden),
            ]
        );
        assert_eq!(m.next_appear_ms(), 26_400);
    }

    #[test]
    fn at_most_one_transition_per_tick() {
        let mut m = machine();
        m.record(GeoPoint::new(0.0, 0.0));

        // A single very late tick only enters FadingIn.
        assert_eq!(m.tick(50_000), Some(IndicatorPhase::FadingIn));
        assert_eq!(m.tick(50_000), None);
        assert_eq!(m.tick(51_200), Some(IndicatorPhase::Active));
    }

    #[test]
    fn late_ticks_do_not_accumulate_drift() {
        let mut m = machine();
        m.record(GeoPoint::new(0.0, 0.0));
        m.tick(10_000);
        // Frame lands 50 ms late.
        assert_eq!(m.tick(11_250), Some(IndicatorPhase::Active));
        assert_eq!(m.entered_at_ms(), 11_200);
        assert_eq!(m.tick(15_200), Some(IndicatorPhase::FadingOut));
    }

    #[test]
    fn target_is_frozen_while_visible() {
        let mut m = machine();
        m.record(GeoPoint::new(0.0, 0.0));
        m.tick(10_000);
        let before = m.pose(10_000).unwrap().position;

        m.record(GeoPoint::new(60.0, 120.0));
        let after = m.pose(10_000).unwrap().position;
        assert_eq!(before, after);
    }

    #[test]
    fn pose_hovers_above_surface_and_faces_origin() {
        let mut m = machine();
        m.record(GeoPoint::new(0.0, 0.0));
        m.tick(10_000);

        // Bob phase is zero at multiples of the period.
        let pose = m.pose(12_000).unwrap();
        assert!((pose.position.x - 108.0).abs() < 1e-9);
        assert!((pose.facing.x + 1.0).abs() < 1e-9);

        // Quarter period is the peak of the bob.
        let peak = m.pose(12_500).unwrap();
        assert!((peak.position.length() - 109.5).abs() < 1e-9);
    }

    #[test]
    fn opacity_ramps_in_and_out() {
        let mut m = machine();
        m.record(GeoPoint::new(0.0, 0.0));
        assert!(m.opacity(10_000).abs() < f64::EPSILON);
        m.tick(10_000);
        assert!((m.opacity(10_600) - 0.5).abs() < 1e-9);
        m.tick(11_200);
        assert!((m.opacity(12_000) - 1.0).abs() < f64::EPSILON);
        m.tick(15_200);
        assert!((m.opacity(15_500) - 0.75).abs() < 1e-9);
        m.tick(16_400);
        assert!(m.pose(16_400).is_none());
    }

    #[test]
    fn shift_moves_deadlines() {
        let mut m = machine();
        m.record(GeoPoint::new(0.0, 0.0));
        m.shift(5000);
        assert_eq!(m.tick(10_000), None);
        assert_eq!(m.tick(15_000), Some(IndicatorPhase::FadingIn));
    }
}
