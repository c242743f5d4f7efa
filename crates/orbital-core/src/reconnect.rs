//! Reconnect discipline for the inbound stream.
//!
//! Transient failures (dropped connections, read errors) are retried after
//! the stream's advertised retry interval. Terminal failures (the server
//! rejects the request outright) schedule exactly one manual reconnect
//! after a fixed backoff; further failures reported while that reconnect is
//! pending are ignored.

use crate::config::StreamConfig;

/// Lifecycle of the stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// A connection attempt is in progress or pending.
    Connecting,
    /// Receiving events.
    Open,
    /// Terminally failed; waiting on a scheduled reconnect.
    Closed,
}

/// Classification of a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The transport will retry on its own.
    Transient,
    /// The server rejected the stream; only a manual reconnect helps.
    Terminal,
}

/// What the transport should do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectAction {
    /// Retry after the given delay.
    TransportRetry {
        /// Delay before the retry.
        after_ms: u64,
    },
    /// A manual reconnect was scheduled for the given monotonic time.
    Scheduled {
        /// When the reconnect fires.
        at_ms: u64,
    },
    /// A reconnect is already pending; nothing new was scheduled.
    AlreadyScheduled,
}

/// Tracks connection state and the single pending reconnect.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    state: ConnectionState,
    retry_ms: u64,
    backoff_ms: u64,
    pending_at_ms: Option<u64>,
    scheduled: u64,
}

impl ReconnectPolicy {
    /// Create a policy in the connecting state.
    pub const fn new(config: &StreamConfig) -> Self {
        Self {
            state: ConnectionState::Connecting,
            retry_ms: config.default_retry_ms,
            backoff_ms: config.reconnect_backoff_ms,
            pending_at_ms: None,
            scheduled: 0,
        }
    }

    /// The stream opened successfully; clears any pending reconnect.
    pub const fn on_open(&mut self) {
        self.state = ConnectionState::Open;
        self.pending_at_ms = None;
    }

    /// Record a failure at `now_ms` and decide the next step.
    pub const fn on_failure(&mut self, kind: FailureKind, now_ms: u64) -> ReconnectAction {
        if self.pending_at_ms.is_some() {
            return ReconnectAction::AlreadyScheduled;
        }
        match kind {
            FailureKind::Transient => {
                self.state = ConnectionState::Connecting;
                ReconnectAction::TransportRetry {
                    after_ms: self.retry_ms,
                }
            }
            FailureKind::Terminal => {
                let at_ms = now_ms.saturating_add(self.backoff_ms);
                self.state = ConnectionState::Closed;
                self.pending_at_ms = Some(at_ms);
                self.scheduled = self.scheduled.saturating_add(1);
                ReconnectAction::Scheduled { at_ms }
            }
        }
    }

    /// Adopt a `retry:` hint from the stream.
    pub const fn set_retry_hint(&mut self, retry_ms: u64) {
        self.retry_ms = retry_ms;
    }

    /// Whether the pending reconnect should fire at `now_ms`.
    ///
    /// Returns `true` exactly once per scheduled reconnect.
    pub const fn due(&mut self, now_ms: u64) -> bool {
        match self.pending_at_ms {
            Some(at) if now_ms >= at => {
                self.pending_at_ms = None;
                self.state = ConnectionState::Connecting;
                true
            }
            _ => false,
        }
    }

    /// Current connection state.
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Current transport retry delay.
    pub const fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    /// Monotonic time of the pending reconnect, if any.
    pub const fn pending_at_ms(&self) -> Option<u64> {
        self.pending_at_ms
    }

    /// Manual reconnects scheduled so far.
    pub const fn scheduled(&self) -> u64 {
        self.scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy::new(&StreamConfig::default())
    }

    #[test]
    fn terminal_failure_schedules_once() {
        let mut p = policy();
        assert_eq!(
            p.on_failure(FailureKind::Terminal, 1000),
            ReconnectAction::Scheduled { at_ms: 4000 }
        );
        assert_eq!(p.state(), ConnectionState::Closed);
        assert_eq!(
            p.on_failure(FailureKind::Terminal, 1500),
            ReconnectAction::AlreadyScheduled
        );
        assert_eq!(
            p.on_failure(FailureKind::Transient, 1600),
            ReconnectAction::AlreadyScheduled
        );
        assert_eq!(p.scheduled(), 1);
    }

    #[test]
    fn reconnect_fires_after_backoff_once() {
        let mut p = policy();
        p.on_failure(FailureKind::Terminal, 0);
        assert!(!p.due(2999));
        assert!(p.due(3000));
        assert!(!p.due(3001));
        assert_eq!(p.state(), ConnectionState::Connecting);

        // Retries continue indefinitely.
        assert_eq!(
            p.on_failure(FailureKind::Terminal, 3500),
            ReconnectAction::Scheduled { at_ms: 6500 }
        );
        assert_eq!(p.scheduled(), 2);
    }

    #[test]
    fn open_clears_pending() {
        let mut p = policy();
        p.on_failure(FailureKind::Terminal, 0);
        p.on_open();
        assert_eq!(p.state(), ConnectionState::Open);
        assert_eq!(p.pending_at_ms(), None);
        assert!(!p.due(10_000));
    }

    #[test]
    fn transient_failures_use_retry_hint() {
        let mut p = policy();
        assert_eq!(
            p.on_failure(FailureKind::Transient, 0),
            ReconnectAction::TransportRetry { after_ms: 1000 }
        );
        p.set_retry_hint(250);
        assert_eq!(
            p.on_failure(FailureKind::Transient, 0),
            ReconnectAction::TransportRetry { after_ms: 250 }
        );
    }
}
