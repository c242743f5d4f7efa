//! Core value types: events, globe geometry, colors, and display payloads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Category, IndicatorPhase};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new coordinate.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Project onto a sphere of the given radius centered at the origin.
    ///
    /// `y` points at the north pole; longitude 0 lies on `+x` and
    /// longitude 90E on `-z`.
    pub fn to_globe(&self, radius: f64) -> Vec3 {
        let phi = self.lat.to_radians();
        let lambda = self.lng.to_radians();
        Vec3::new(
            radius * phi.cos() * lambda.cos(),
            radius * phi.sin(),
            -radius * phi.cos() * lambda.sin(),
        )
    }
}

/// A point or direction in globe space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component (north).
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y.mul_add(other.y, self.z * other.z))
    }

    /// Multiply every component by `factor`.
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Component-wise sum.
    pub fn translate(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Unit vector in the same direction, or [`Vec3::ZERO`] for a
    /// zero-length input.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f64::EPSILON {
            self.scale(len.recip())
        } else {
            Self::ZERO
        }
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Default marker color for unrecognized categories.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A validated event decoded from the inbound stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Where the event happened.
    pub location: GeoPoint,
    /// Origin wall-clock timestamp in Unix milliseconds.
    pub timestamp_ms: i64,
    /// Platform category.
    pub category: Category,
}

// ---------------------------------------------------------------------------
// Display payloads
// ---------------------------------------------------------------------------

/// One line of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FeedEntry {
    /// Platform category of the event.
    pub category: Category,
    /// Formatted coordinates, e.g. `40.70N 74.00W`.
    pub coordinates: String,
    /// Origin wall-clock timestamp in Unix milliseconds.
    pub timestamp_ms: i64,
}

/// Periodic counters pushed to the display layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatsSnapshot {
    /// Frame number the snapshot was taken on.
    pub frame: u64,
    /// Cumulative count of validated events.
    pub total_events: u64,
    /// Validated events per second over the trailing window.
    pub rate_per_second: f64,
    /// Live visual entities (bursts and dots).
    pub live_entities: u32,
    /// Live persistent dots (the admission counter).
    pub live_dots: u32,
    /// Events refused by the admission controller.
    pub dropped_events: u64,
    /// Payloads that failed to decode.
    pub malformed_events: u64,
    /// Events discarded for clock skew.
    pub stale_events: u64,
    /// Payloads discarded while the display was hidden.
    pub suppressed_events: u64,
    /// Current indicator phase.
    pub indicator: IndicatorPhase,
    /// Whether the display is currently visible.
    pub visible: bool,
    /// Most recent events, newest first.
    pub feed: Vec<FeedEntry>,
}

/// Format a coordinate pair with hemisphere suffixes, two decimals each.
pub fn format_coordinates(point: GeoPoint) -> String {
    let ns = if point.lat < 0.0 { 'S' } else { 'N' };
    let ew = if point.lng < 0.0 { 'W' } else { 'E' };
    format!("{:.2}{ns} {:.2}{ew}", point.lat.abs(), point.lng.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn equator_prime_meridian_projects_to_positive_x() {
        let p = GeoPoint::new(0.0, 0.0).to_globe(100.0);
        assert!(close(p.x, 100.0));
        assert!(close(p.y, 0.0));
        assert!(close(p.z, 0.0));
    }

    #[test]
    fn north_pole_projects_to_positive_y() {
        let p = GeoPoint::new(90.0, 45.0).to_globe(50.0);
        assert!(close(p.y, 50.0));
        assert!(close(p.length(), 50.0));
    }

    #[test]
    fn projection_stays_on_the_sphere() {
        for (lat, lng) in [(40.7, -74.0), (-33.9, 151.2), (64.8, -147.7)] {
            let p = GeoPoint::new(lat, lng).to_globe(100.0);
            assert!(close(p.length(), 100.0));
        }
    }

    #[test]
    fn validity_checks_ranges() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        assert!(close(Vec3::new(3.0, 0.0, 4.0).normalized().length(), 1.0));
    }

    #[test]
    fn coordinates_use_hemisphere_suffixes() {
        assert_eq!(format_coordinates(GeoPoint::new(40.7, -74.0)), "40.70N 74.00W");
        assert_eq!(format_coordinates(GeoPoint::new(-33.9, 151.2)), "33.90S 151.20E");
    }
}
