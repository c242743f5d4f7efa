//! Frame clock for the Orbital engine.
//!
//! The clock supplies two notions of "now" once per frame: a monotonic
//! millisecond offset from engine start, used for every animation and
//! timer, and the wall clock in Unix milliseconds, used only to measure
//! the skew of inbound event timestamps.

use std::time::Instant;

use chrono::Utc;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Frame counter would overflow.
    #[error("frame counter overflow: cannot advance beyond u64::MAX")]
    FrameOverflow,
}

/// The time values handed to the engine for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTime {
    /// Frame number (0 before the first advance).
    pub frame: u64,
    /// Monotonic milliseconds since the clock was created.
    pub now_ms: u64,
    /// Wall-clock Unix milliseconds.
    pub wall_ms: i64,
}

impl FrameTime {
    /// Build a frame time from explicit values (tests and replays).
    pub const fn new(frame: u64, now_ms: u64, wall_ms: i64) -> Self {
        Self {
            frame,
            now_ms,
            wall_ms,
        }
    }
}

/// Monotonic frame clock.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    frame: u64,
}

impl FrameClock {
    /// Start a clock at frame 0, with "now" anchored to this instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }

    /// Advance to the next frame and return its time values.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::FrameOverflow`] if the frame counter would
    /// exceed `u64::MAX`.
    pub fn advance(&mut self) -> Result<FrameTime, ClockError> {
        self.frame = self.frame.checked_add(1).ok_or(ClockError::FrameOverflow)?;
        Ok(self.now())
    }

    /// Time values for the current frame without advancing it.
    pub fn now(&self) -> FrameTime {
        FrameTime {
            frame: self.frame,
            now_ms: self.elapsed_ms(),
            wall_ms: wall_clock_ms(),
        }
    }

    /// Return the current frame number.
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Monotonic milliseconds since the clock was created.
    ///
    /// Saturates at `u64::MAX` rather than wrapping.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn wall_clock_ms() -> i64 {
    Utc::now().timestamp_millis()
}
