//! Rendering surface capability consumed by the engine.
//!
//! The engine never assumes a rendering technology. It only adds drawables,
//! updates their opacity and scale, and removes them. [`SceneSurface`] is
//! the in-memory implementation used by the headless monitor and by tests.

use std::collections::BTreeMap;

use orbital_types::{Rgb, Vec3};

/// Opaque handle to a drawable owned by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawableHandle(u64);

impl DrawableHandle {
    /// Wrap a raw surface identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Geometry of a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Flat expanding ring.
    Ring,
    /// Small filled dot.
    Dot,
}

/// Everything a surface needs to create a drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableSpec {
    /// Position in globe space.
    pub position: Vec3,
    /// Fill color.
    pub color: Rgb,
    /// Geometry.
    pub shape: Shape,
    /// Initial opacity in `[0, 1]`.
    pub opacity: f64,
    /// Initial uniform scale.
    pub scale: f64,
}

/// Drawing capability the engine renders through.
pub trait RenderSurface {
    /// Create a drawable and return its handle.
    fn add(&mut self, spec: DrawableSpec) -> DrawableHandle;

    /// Change the opacity and scale of an existing drawable.
    fn update(&mut self, handle: DrawableHandle, opacity: f64, scale: f64);

    /// Release a drawable. Unknown handles are ignored.
    fn remove(&mut self, handle: DrawableHandle);
}

/// In-memory surface that tracks live drawables.
#[derive(Debug, Clone, Default)]
pub struct SceneSurface {
    drawables: BTreeMap<DrawableHandle, DrawableSpec>,
    next_id: u64,
    added: u64,
    removed: u64,
}

impl SceneSurface {
    /// Create an empty surface.
    pub const fn new() -> Self {
        Self {
            drawables: BTreeMap::new(),
            next_id: 0,
            added: 0,
            removed: 0,
        }
    }

    /// Number of live drawables.
    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    /// Whether no drawables are live.
    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Current state of a drawable, if it is live.
    pub fn get(&self, handle: DrawableHandle) -> Option<&DrawableSpec> {
        self.drawables.get(&handle)
    }

    /// Iterate over live drawables in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (DrawableHandle, &DrawableSpec)> {
        self.drawables.iter().map(|(handle, spec)| (*handle, spec))
    }

    /// Total drawables ever added.
    pub const fn added(&self) -> u64 {
        self.added
    }

    /// Total drawables ever removed.
    pub const fn removed(&self) -> u64 {
        self.removed
    }
}

impl RenderSurface for SceneSurface {
    fn add(&mut self, spec: DrawableSpec) -> DrawableHandle {
        let handle = DrawableHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.added = self.added.saturating_add(1);
        self.drawables.insert(handle, spec);
        handle
    }

    fn update(&mut self, handle: DrawableHandle, opacity: f64, scale: f64) {
        if let Some(spec) = self.drawables.get_mut(&handle) {
            spec.opacity = opacity;
            spec.scale = scale;
        }
    }

    fn remove(&mut self, handle: DrawableHandle) {
        if self.drawables.remove(&handle).is_some() {
            self.removed = self.removed.saturating_add(1);
        }
    }
}
