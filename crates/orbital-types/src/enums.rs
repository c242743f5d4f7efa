//! Enumeration types for the Orbital telemetry globe.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::Rgb;

// ---------------------------------------------------------------------------
// Event categories
// ---------------------------------------------------------------------------

/// The platform tag carried by every stream event.
///
/// Tags are matched case-insensitively. Anything outside the known set maps
/// to [`Category::Other`], which renders in the default color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Category {
    /// JVM platforms.
    Java,
    /// Browser and generic `JavaScript`.
    Javascript,
    /// PHP.
    Php,
    /// Python.
    Python,
    /// Ruby.
    Ruby,
    /// Any unrecognized or empty tag.
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::Java,
        Self::Javascript,
        Self::Php,
        Self::Python,
        Self::Ruby,
        Self::Other,
    ];

    /// Map a raw stream tag to a category.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "java" => Self::Java,
            "javascript" => Self::Javascript,
            "php" => Self::Php,
            "python" => Self::Python,
            "ruby" => Self::Ruby,
            _ => Self::Other,
        }
    }

    /// The lowercase tag used on the wire and in the feed.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Javascript => "javascript",
            Self::Php => "php",
            Self::Python => "python",
            Self::Ruby => "ruby",
            Self::Other => "other",
        }
    }

    /// Marker color for this category.
    pub const fn color(self) -> Rgb {
        match self {
            Self::Java => Rgb::new(255, 138, 0),
            Self::Javascript => Rgb::new(248, 220, 60),
            Self::Php => Rgb::new(95, 129, 186),
            Self::Python => Rgb::new(55, 118, 171),
            Self::Ruby => Rgb::new(217, 19, 4),
            Self::Other => Rgb::WHITE,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Visual entities
// ---------------------------------------------------------------------------

/// The visual phase an admitted event is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Short-lived expanding ring. Several staggered bursts render per event.
    Burst,
    /// Long-lived fading dot. The only kind counted against capacity.
    PersistentDot,
}

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// Phase of the periodic last-location indicator.
///
/// The cycle is strictly `Hidden -> FadingIn -> Active -> FadingOut ->
/// Hidden`; no phase is ever skipped.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum IndicatorPhase {
    /// Not drawn. Initial and resting state.
    #[default]
    Hidden,
    /// Opacity ramping from 0 to 1.
    FadingIn,
    /// Fully visible, hovering over the target.
    Active,
    /// Opacity ramping from 1 to 0.
    FadingOut,
}

impl IndicatorPhase {
    /// The phase that follows this one in the cycle.
    pub const fn next(self) -> Self {
        match self {
            Self::Hidden => Self::FadingIn,
            Self::FadingIn => Self::Active,
            Self::Active => Self::FadingOut,
            Self::FadingOut => Self::Hidden,
        }
    }
}
