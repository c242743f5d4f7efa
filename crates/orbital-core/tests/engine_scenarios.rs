//! End-to-end engine scenarios driven through `ingest` and `tick` only.
//!
//! These tests exercise the engine the way the frame driver does, with an
//! in-memory surface and a recording diagnostic sink standing in for the
//! renderer and the error tracker.

#![allow(clippy::unwrap_used)]

use orbital_core::clock::FrameTime;
use orbital_core::config::OrbitalConfig;
use orbital_core::diagnostics::RecordingSink;
use orbital_core::engine::{IngestOutcome, OrbitalEngine};
use orbital_core::surface::SceneSurface;
use orbital_types::{Category, Event, GeoPoint, IndicatorPhase};

const WALL: i64 = 1_700_000_000_000;

type TestEngine = OrbitalEngine<SceneSurface, RecordingSink>;

fn engine_with(config: &OrbitalConfig) -> TestEngine {
    OrbitalEngine::new(config, SceneSurface::new(), RecordingSink::new(), 0).unwrap()
}

fn seeded() -> OrbitalConfig {
    let mut config = OrbitalConfig::default();
    config.engine.seed = Some(2024);
    config
}

fn event(lat: f64, lng: f64) -> Event {
    Event {
        location: GeoPoint::new(lat, lng),
        timestamp_ms: WALL,
        category: Category::Javascript,
    }
}

fn frame(n: u64, now_ms: u64) -> FrameTime {
    FrameTime::new(n, now_ms, WALL)
}

#[test]
fn saturated_engine_drops_everything() {
    // Soft limit just below hard so the fill phase admits deterministically.
    let mut config = seeded();
    config.admission.soft_limit = 399;
    let mut engine = engine_with(&config);

    for _ in 0..400 {
        assert_eq!(engine.ingest_event(&event(1.0, 2.0), 0), IngestOutcome::Admitted);
    }
    assert_eq!(engine.live_dots(), 400);
    let entities = engine.live_entities();

    for _ in 0..1000 {
        assert_eq!(engine.ingest_event(&event(1.0, 2.0), 10), IngestOutcome::Rejected);
    }

    assert_eq!(engine.dropped(), 1000);
    assert_eq!(engine.live_dots(), 400);
    assert_eq!(engine.live_entities(), entities);
    // Counting is independent of admission.
    assert_eq!(engine.total_events(), 1400);
    // One throttle warning per hundred drops.
    assert_eq!(engine.sink().warnings(), 10);
}

#[test]
fn default_limits_shed_load_gradually() {
    let mut engine = engine_with(&seeded());

    for _ in 0..5000 {
        engine.ingest_event(&event(-33.9, 151.2), 0);
    }

    let live = engine.live_dots();
    assert!(live >= 100, "live = {live}");
    assert!(live <= 400, "live = {live}");
    assert!(engine.dropped() > 0);
    assert_eq!(u64::from(live) + engine.dropped(), 5000);
}

#[test]
fn entities_expire_in_one_batch_after_resume() {
    let mut engine = engine_with(&seeded());
    for i in 0..20 {
        engine.ingest_event(&event(48.85, 2.35), i * 10);
    }
    assert_eq!(engine.live_entities(), 80);

    engine.set_visible(false, 500);
    assert!(engine.tick(frame(1, 10_000)).is_none());
    assert_eq!(engine.live_entities(), 80);

    engine.set_visible(true, 30_000);
    let report = engine.tick(frame(2, 30_016)).unwrap();
    assert_eq!(report.expired.dots, 20);
    assert_eq!(report.expired.bursts, 60);
    assert_eq!(engine.live_entities(), 0);
    assert_eq!(engine.live_dots(), 0);
    assert!(engine.surface().is_empty());
}

#[test]
fn staleness_boundaries_through_ingest() {
    let mut engine = engine_with(&seeded());
    let tuple = |ts: i64| format!("[0.0,0.0,{ts},\"php\"]");

    assert_eq!(engine.ingest(&tuple(WALL - 4999), 0, WALL), IngestOutcome::Admitted);
    assert_eq!(engine.ingest(&tuple(WALL - 5000), 0, WALL), IngestOutcome::Admitted);
    assert_eq!(engine.ingest(&tuple(WALL - 5001), 0, WALL), IngestOutcome::Stale);
    assert_eq!(engine.total_events(), 2);
}

#[test]
fn indicator_cycles_at_frame_cadence() {
    let mut engine = engine_with(&seeded());
    engine.ingest_event(&event(40.7, -74.0), 0);

    let mut transitions = Vec::new();
    let mut n = 0;
    let mut now = 0;
    while now <= 20_000 {
        n += 1;
        now += 16;
        if let Some(phase) = engine.tick(frame(n, now)).and_then(|r| r.transition) {
            transitions.push((now, phase));
        }
    }

    let phases: Vec<_> = transitions.iter().map(|(_, p)| *p).collect();
    assert_eq!(
        phases,
        vec![
            IndicatorPhase::FadingIn,
            IndicatorPhase::Active,
            IndicatorPhase::FadingOut,
            IndicatorPhase::Hidden,
        ]
    );
    let first = transitions[0].0;
    let last = transitions[3].0;
    assert!(first >= 10_000 && first < 10_016);
    // Entry times advance by exact durations, so only frame quantization
    // separates the observed span from 6400 ms.
    assert!(last - first >= 6400 && last - first < 6416 + 16);
}

#[test]
fn hidden_time_does_not_count_toward_indicator_cycle() {
    let mut engine = engine_with(&seeded());
    engine.ingest_event(&event(0.0, 0.0), 0);

    engine.set_visible(false, 5000);
    engine.set_visible(true, 25_000);

    // Without the shift the indicator would appear at 10 s.
    let early = engine.tick(frame(1, 26_000)).unwrap();
    assert_eq!(early.transition, None);
    let due = engine.tick(frame(2, 30_000)).unwrap();
    assert_eq!(due.transition, Some(IndicatorPhase::FadingIn));
    assert!(due.indicator.is_some());
}
