//! Event rate, cumulative totals, and the recent-activity feed.

use std::collections::VecDeque;

use orbital_types::{Event, FeedEntry, format_coordinates};

use crate::config::ReporterConfig;

/// Sliding window of event timestamps.
#[derive(Debug, Clone)]
pub struct RateWindow {
    samples: VecDeque<u64>,
    horizon_ms: u64,
}

impl RateWindow {
    /// Create an empty window covering the trailing `horizon_ms`.
    pub const fn new(horizon_ms: u64) -> Self {
        Self {
            samples: VecDeque::new(),
            horizon_ms,
        }
    }

    /// Record one event at `now_ms`.
    pub fn record(&mut self, now_ms: u64) {
        self.samples.push_back(now_ms);
    }

    /// Events per second over the window ending at `now_ms`.
    ///
    /// Samples older than the horizon are discarded first; a sample exactly
    /// one horizon old still counts.
    pub fn rate(&mut self, now_ms: u64) -> f64 {
        while self
            .samples
            .front()
            .is_some_and(|&ts| now_ms.saturating_sub(ts) > self.horizon_ms)
        {
            self.samples.pop_front();
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.samples.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let seconds = self.horizon_ms.max(1) as f64 / 1000.0;
        count / seconds
    }

    /// Samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Aggregates counters and the feed for the display layer.
#[derive(Debug, Clone)]
pub struct Reporter {
    window: RateWindow,
    total: u64,
    feed: VecDeque<FeedEntry>,
    last_feed_ms: Option<u64>,
    last_snapshot_ms: Option<u64>,
    config: ReporterConfig,
}

impl Reporter {
    /// Create a reporter with empty counters.
    pub fn new(config: ReporterConfig) -> Self {
        Self {
            window: RateWindow::new(config.rate_window_ms),
            total: 0,
            feed: VecDeque::with_capacity(config.feed_capacity),
            last_feed_ms: None,
            last_snapshot_ms: None,
            config,
        }
    }

    /// Count a validated event. Returns whether it also entered the feed.
    pub fn record_event(&mut self, event: &Event, now_ms: u64) -> bool {
        self.total = self.total.saturating_add(1);
        self.window.record(now_ms);

        let spaced = self
            .last_feed_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.config.feed_interval_ms);
        if !spaced {
            return false;
        }

        self.last_feed_ms = Some(now_ms);
        self.feed.push_front(FeedEntry {
            category: event.category,
            coordinates: format_coordinates(event.location),
            timestamp_ms: event.timestamp_ms,
        });
        self.feed.truncate(self.config.feed_capacity);
        true
    }

    /// Whether a stats snapshot should be published at `now_ms`.
    ///
    /// Returns `true` at most once per `stats_interval_ms`.
    pub fn snapshot_due(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_snapshot_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.config.stats_interval_ms);
        if due {
            self.last_snapshot_ms = Some(now_ms);
        }
        due
    }

    /// Events per second over the trailing window.
    pub fn rate(&mut self, now_ms: u64) -> f64 {
        self.window.rate(now_ms)
    }

    /// Cumulative validated events.
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Feed entries, newest first.
    pub fn feed(&self) -> Vec<FeedEntry> {
        self.feed.iter().cloned().collect()
    }
}
