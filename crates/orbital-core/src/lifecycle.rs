//! Marker lifecycle: spawning, animating, and expiring visual entities.
//!
//! Each admitted event produces one long-lived persistent dot and a short
//! train of staggered expanding bursts. Every frame the manager advances
//! each entity's progress, pushes the new opacity and scale to the render
//! surface, and removes finished entities in one compaction pass.

use orbital_types::{EntityKind, Rgb, Vec3};

use crate::config::EntityConfig;
use crate::surface::{DrawableHandle, DrawableSpec, RenderSurface, Shape};

/// One live marker on the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEntity {
    /// Burst or persistent dot.
    pub kind: EntityKind,
    /// Position in globe space.
    pub position: Vec3,
    /// Category color.
    pub color: Rgb,
    /// Monotonic start time; may lie in the future for staggered bursts.
    pub start_ms: u64,
    /// Lifetime from `start_ms`.
    pub duration_ms: u64,
    /// Terminal scale for bursts; 1 for dots.
    pub target_scale: f64,
    /// Surface drawable backing this entity.
    pub handle: DrawableHandle,
}

impl VisualEntity {
    /// Normalized progress at `now_ms`, or `None` before the start time.
    ///
    /// Values at or above 1 mean the entity has expired.
    pub fn progress(&self, now_ms: u64) -> Option<f64> {
        let elapsed = now_ms.checked_sub(self.start_ms)?;
        #[allow(clippy::cast_precision_loss)]
        let progress = elapsed as f64 / self.duration_ms.max(1) as f64;
        Some(progress)
    }

    /// Opacity and scale at the given progress.
    fn appearance(&self, progress: f64, config: &EntityConfig) -> (f64, f64) {
        match self.kind {
            EntityKind::PersistentDot => (dot_opacity(progress, config), 1.0),
            EntityKind::Burst => (
                burst_opacity(progress, config),
                burst_scale(progress, self.target_scale, config),
            ),
        }
    }
}

/// Counts from one [`EntityManager::update`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryReport {
    /// Bursts removed this pass.
    pub bursts: u32,
    /// Persistent dots removed this pass.
    pub dots: u32,
}

impl ExpiryReport {
    /// Total entities removed.
    pub const fn total(&self) -> u32 {
        self.bursts.saturating_add(self.dots)
    }
}

/// Owner of every live visual entity.
#[derive(Debug, Clone)]
pub struct EntityManager {
    entities: Vec<VisualEntity>,
    live_dots: u32,
    config: EntityConfig,
}

impl EntityManager {
    /// Create an empty manager.
    pub const fn new(config: EntityConfig) -> Self {
        Self {
            entities: Vec::new(),
            live_dots: 0,
            config,
        }
    }

    /// Materialize one admitted event at `position`.
    ///
    /// Creates a persistent dot starting now and `burst_count` bursts whose
    /// start times are staggered. Bursts that have not started yet are added
    /// to the surface fully transparent.
    pub fn spawn(
        &mut self,
        position: Vec3,
        color: Rgb,
        now_ms: u64,
        surface: &mut impl RenderSurface,
    ) {
        let handle = surface.add(DrawableSpec {
            position,
            color,
            shape: Shape::Dot,
            opacity: dot_opacity(0.0, &self.config),
            scale: 1.0,
        });
        self.entities.push(VisualEntity {
            kind: EntityKind::PersistentDot,
            position,
            color,
            start_ms: now_ms,
            duration_ms: self.config.dot_duration_ms,
            target_scale: 1.0,
            handle,
        });
        self.live_dots = self.live_dots.saturating_add(1);

        for wave in 0..self.config.burst_count {
            let offset = self.config.burst_stagger_ms.saturating_mul(u64::from(wave));
            let start_ms = now_ms.saturating_add(offset);
            let target_scale =
                f64::from(wave).mul_add(self.config.burst_scale_step, self.config.burst_base_scale);
            let (opacity, scale) = if start_ms > now_ms {
                (0.0, 0.0)
            } else {
                (
                    burst_opacity(0.0, &self.config),
                    burst_scale(0.0, target_scale, &self.config),
                )
            };
            let handle = surface.add(DrawableSpec {
                position,
                color,
                shape: Shape::Ring,
                opacity,
                scale,
            });
            self.entities.push(VisualEntity {
                kind: EntityKind::Burst,
                position,
                color,
                start_ms,
                duration_ms: self.config.burst_duration_ms,
                target_scale,
                handle,
            });
        }
    }

    /// Advance every entity to `now_ms`.
    ///
    /// Expired entities are removed from the surface and dropped from the
    /// live set in a single pass. Entities that have not started are left
    /// untouched.
    pub fn update(&mut self, now_ms: u64, surface: &mut impl RenderSurface) -> ExpiryReport {
        let mut report = ExpiryReport::default();
        let config = &self.config;

        self.entities.retain(|entity| {
            let Some(progress) = entity.progress(now_ms) else {
                return true;
            };
            if progress >= 1.0 {
                surface.remove(entity.handle);
                match entity.kind {
                    EntityKind::Burst => report.bursts = report.bursts.saturating_add(1),
                    EntityKind::PersistentDot => report.dots = report.dots.saturating_add(1),
                }
                return false;
            }
            let (opacity, scale) = entity.appearance(progress, config);
            surface.update(entity.handle, opacity, scale);
            true
        });

        self.live_dots = self.live_dots.saturating_sub(report.dots);
        report
    }

    /// Live entities of both kinds.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entities are live.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live persistent dots, the count admission is keyed on.
    pub const fn live_dots(&self) -> u32 {
        self.live_dots
    }

    /// Live entities in spawn order.
    pub fn entities(&self) -> &[VisualEntity] {
        &self.entities
    }
}

/// Persistent-dot opacity: `peak * (1 - p^exponent)`.
pub fn dot_opacity(progress: f64, config: &EntityConfig) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    config.dot_peak_opacity * (1.0 - p.powf(config.dot_fade_exponent))
}

/// Burst ring scale: `target * (1 - (1 - p)^ease)`.
pub fn burst_scale(progress: f64, target: f64, config: &EntityConfig) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    target * (1.0 - (1.0 - p).powf(config.burst_ease_exponent))
}

/// Burst ring opacity: `(1 - p) * peak`.
pub fn burst_opacity(progress: f64, config: &EntityConfig) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    (1.0 - p) * config.burst_peak_opacity
}
