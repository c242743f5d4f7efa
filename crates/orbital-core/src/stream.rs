//! Stream consumer: payload decoding and staleness filtering.
//!
//! Each inbound message is a JSON 4-tuple `[lat, lng, ts, category]`. The
//! consumer decodes it, applies the visibility gate, and discards events
//! whose origin timestamp is too far from the local wall clock.

use orbital_types::{Category, Event, GeoPoint};
use serde::Deserialize;

use crate::diagnostics::DiagnosticSink;

/// Reasons a payload fails to decode into an [`Event`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not a JSON array of the expected shape.
    #[error("malformed event payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A numeric field was NaN or infinite.
    #[error("non-finite {field} in event payload")]
    NonFinite {
        /// Which field was non-finite.
        field: &'static str,
    },

    /// Latitude or longitude outside the valid range.
    #[error("coordinates out of range: lat={lat}, lng={lng}")]
    OutOfRange {
        /// Decoded latitude.
        lat: f64,
        /// Decoded longitude.
        lng: f64,
    },

    /// Timestamp does not fit in signed milliseconds.
    #[error("timestamp {0} is not representable in milliseconds")]
    Timestamp(f64),
}

#[derive(Deserialize)]
struct WireEvent(f64, f64, f64, Option<String>);

/// Decode one wire payload into a validated [`Event`].
///
/// A `null` category decodes to [`Category::Other`]. Fractional timestamps
/// are truncated toward zero.
pub fn decode_event(payload: &str) -> Result<Event, DecodeError> {
    let WireEvent(lat, lng, ts, tag) = serde_json::from_str(payload)?;

    for (field, value) in [("latitude", lat), ("longitude", lng), ("timestamp", ts)] {
        if !value.is_finite() {
            return Err(DecodeError::NonFinite { field });
        }
    }

    let location = GeoPoint::new(lat, lng);
    if !location.is_valid() {
        return Err(DecodeError::OutOfRange { lat, lng });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let timestamp_ms = if ts.abs() < i64::MAX as f64 {
        ts.trunc() as i64
    } else {
        return Err(DecodeError::Timestamp(ts));
    };

    Ok(Event {
        location,
        timestamp_ms,
        category: tag.as_deref().map_or(Category::Other, Category::from_tag),
    })
}

/// Result of consuming one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Consumed {
    /// Decoded, visible, and fresh.
    Accepted(Event),
    /// Failed to decode.
    Malformed,
    /// Decoded but outside the skew tolerance.
    Stale {
        /// Absolute distance between the local wall clock and the event.
        skew_ms: u64,
    },
    /// Decoded while the display was hidden.
    Suppressed,
}

/// Stateful decoder with staleness detection.
#[derive(Debug, Clone)]
pub struct StreamConsumer {
    stale_threshold_ms: u64,
    stale_streak: bool,
    malformed: u64,
    stale: u64,
    suppressed: u64,
}

impl StreamConsumer {
    /// Create a consumer that discards events skewed by more than
    /// `stale_threshold_ms`.
    pub const fn new(stale_threshold_ms: u64) -> Self {
        Self {
            stale_threshold_ms,
            stale_streak: false,
            malformed: 0,
            stale: 0,
            suppressed: 0,
        }
    }

    /// Decode and filter one payload.
    ///
    /// Malformed payloads are reported through `capture_error`. The first
    /// stale event after a fresh one emits a single warning; the streak
    /// ends at the next fresh event.
    pub fn consume(
        &mut self,
        payload: &str,
        wall_now_ms: i64,
        visible: bool,
        sink: &mut impl DiagnosticSink,
    ) -> Consumed {
        let event = match decode_event(payload) {
            Ok(event) => event,
            Err(e) => {
                self.malformed = self.malformed.saturating_add(1);
                sink.capture_error(&e, &[("payload", truncate(payload, 128))]);
                return Consumed::Malformed;
            }
        };

        if !visible {
            self.suppressed = self.suppressed.saturating_add(1);
            return Consumed::Suppressed;
        }

        let skew_ms = skew(wall_now_ms, event.timestamp_ms);
        if skew_ms > self.stale_threshold_ms {
            self.stale = self.stale.saturating_add(1);
            if !self.stale_streak {
                self.stale_streak = true;
                sink.warn(
                    "discarding stale events",
                    &[
                        ("skew_ms", skew_ms.to_string()),
                        ("threshold_ms", self.stale_threshold_ms.to_string()),
                    ],
                );
            }
            return Consumed::Stale { skew_ms };
        }

        self.stale_streak = false;
        Consumed::Accepted(event)
    }

    /// Payloads that failed to decode.
    pub const fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Events discarded for skew.
    pub const fn stale(&self) -> u64 {
        self.stale
    }

    /// Events discarded while hidden.
    pub const fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

fn skew(wall_now_ms: i64, timestamp_ms: i64) -> u64 {
    wall_now_ms
        .checked_sub(timestamp_ms)
        .map_or(u64::MAX, i64::unsigned_abs)
}

fn truncate(payload: &str, max: usize) -> String {
    payload.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    const NOW: i64 = 1_700_000_000_000;

    fn payload(ts: i64) -> String {
        format!("[40.7,-74.0,{ts},\"python\"]")
    }

    #[test]
    fn decodes_well_formed_tuple() {
        let event = decode_event("[40.7, -74.0, 1700000000000, \"ruby\"]").unwrap();
        assert_eq!(event.category, Category::Ruby);
        assert_eq!(event.timestamp_ms, NOW);
        assert!((event.location.lat - 40.7).abs() < 1e-12);
    }

    #[test]
    fn null_category_is_other() {
        let event = decode_event("[0, 0, 1, null]").unwrap();
        assert_eq!(event.category, Category::Other);
    }

    #[test]
    fn rejects_bad_shapes() {
        for bad in [
            "",
            "not json",
            "{}",
            "[1, 2, 3]",
            "[1, 2, 3, \"php\", 5]",
            "[\"a\", 2, 3, \"php\"]",
        ] {
            assert!(
                matches!(decode_event(bad), Err(DecodeError::Json(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(
            decode_event("[91, 0, 1, \"php\"]"),
            Err(DecodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode_event("[0, -180.5, 1, \"php\"]"),
            Err(DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_unrepresentable_timestamp() {
        assert!(matches!(
            decode_event("[0, 0, 1e30, \"php\"]"),
            Err(DecodeError::Timestamp(_))
        ));
    }

    #[test]
    fn staleness_boundaries() {
        let mut consumer = StreamConsumer::new(5000);
        let mut sink = RecordingSink::new();

        assert!(matches!(
            consumer.consume(&payload(NOW - 4999), NOW, true, &mut sink),
            Consumed::Accepted(_)
        ));
        assert!(matches!(
            consumer.consume(&payload(NOW - 5000), NOW, true, &mut sink),
            Consumed::Accepted(_)
        ));
        assert_eq!(
            consumer.consume(&payload(NOW - 5001), NOW, true, &mut sink),
            Consumed::Stale { skew_ms: 5001 }
        );
        // Future timestamps are skewed too.
        assert_eq!(
            consumer.consume(&payload(NOW + 6000), NOW, true, &mut sink),
            Consumed::Stale { skew_ms: 6000 }
        );
        assert_eq!(consumer.stale(), 2);
    }

    #[test]
    fn stale_warning_is_edge_triggered() {
        let mut consumer = StreamConsumer::new(5000);
        let mut sink = RecordingSink::new();

        for _ in 0..10 {
            consumer.consume(&payload(NOW - 60_000), NOW, true, &mut sink);
        }
        assert_eq!(sink.warnings(), 1);

        consumer.consume(&payload(NOW), NOW, true, &mut sink);
        consumer.consume(&payload(NOW - 60_000), NOW, true, &mut sink);
        assert_eq!(sink.warnings(), 2);
    }

    #[test]
    fn malformed_payload_is_captured() {
        let mut consumer = StreamConsumer::new(5000);
        let mut sink = RecordingSink::new();

        assert_eq!(
            consumer.consume("[oops", NOW, true, &mut sink),
            Consumed::Malformed
        );
        assert_eq!(consumer.malformed(), 1);
        assert_eq!(sink.errors(), 1);
    }

    #[test]
    fn hidden_decodes_then_suppresses() {
        let mut consumer = StreamConsumer::new(5000);
        let mut sink = RecordingSink::new();

        assert_eq!(
            consumer.consume(&payload(NOW), NOW, false, &mut sink),
            Consumed::Suppressed
        );
        // Malformed input is still reported while hidden.
        assert_eq!(
            consumer.consume("garbage", NOW, false, &mut sink),
            Consumed::Malformed
        );
        assert_eq!(consumer.suppressed(), 1);
        assert_eq!(sink.errors(), 1);
    }
}
