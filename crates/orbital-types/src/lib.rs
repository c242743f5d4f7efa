//! Shared type definitions for the Orbital telemetry globe.
//!
//! This crate holds the values that cross crate boundaries: the decoded
//! [`Event`], globe geometry, category colors, and the display-facing
//! [`StatsSnapshot`] and [`FeedEntry`] payloads. Display payloads flow to
//! `TypeScript` via `ts-rs` for the dashboard layer.
//!
//! # Modules
//!
//! - [`enums`] -- Event categories, entity kinds, and indicator phases
//! - [`structs`] -- Events, geometry, colors, and display payloads

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Category, EntityKind, IndicatorPhase};
pub use structs::{Event, FeedEntry, GeoPoint, Rgb, StatsSnapshot, Vec3, format_coordinates};
