//! Server-Sent-Events transport feeding the frame driver.
//!
//! The transport owns the HTTP connection to the relay. The body is
//! decoded with `eventsource-stream`, and every `data:` payload is
//! forwarded untouched to the frame driver as an
//! [`Inbound::Message`]; decoding happens in the engine. Connection
//! failures go through [`ReconnectPolicy`]: dropped streams retry after the
//! advertised `retry:` interval, rejected requests wait for one scheduled
//! reconnect.

use std::time::Duration;

use eventsource_stream::{Event as SseEvent, EventStreamError, Eventsource as _};
use futures::{Stream, StreamExt as _};
use orbital_core::config::StreamConfig;
use orbital_core::diagnostics::{DiagnosticSink, TracingSink};
use orbital_core::reconnect::{FailureKind, ReconnectAction, ReconnectPolicy};
use orbital_core::runner::Inbound;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Log one backpressure warning per this many dropped payloads.
const DROP_LOG_EVERY: u64 = 1000;

/// Longest run of bytes accepted without a line terminator.
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Failure while reading the response body.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The HTTP body failed.
    #[error("stream body error: {0}")]
    Http(#[from] reqwest::Error),

    /// A line grew past [`MAX_LINE_BYTES`] without terminating.
    #[error("stream line exceeds {MAX_LINE_BYTES} bytes")]
    LineTooLong,
}

/// Tracks the length of the unterminated line at the end of the body.
#[derive(Debug, Default)]
struct LineGuard {
    open: usize,
}

impl LineGuard {
    /// Account for one chunk. Returns `false` once the open line is too long.
    fn admit(&mut self, chunk: &[u8]) -> bool {
        self.open = match chunk.iter().rposition(|&b| b == b'\n' || b == b'\r') {
            Some(pos) => chunk.len().saturating_sub(pos).saturating_sub(1),
            None => self.open.saturating_add(chunk.len()),
        };
        self.open <= MAX_LINE_BYTES
    }
}

/// Decode a response body into server-sent events.
///
/// Oversized lines end the stream with [`ChunkError::LineTooLong`].
pub fn sse_events<S, B>(
    body: S,
) -> impl Stream<Item = Result<SseEvent, EventStreamError<ChunkError>>>
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
{
    let mut guard = LineGuard::default();
    body.map(move |chunk| {
        let chunk = chunk?;
        if guard.admit(chunk.as_ref()) {
            Ok(chunk)
        } else {
            Err(ChunkError::LineTooLong)
        }
    })
    .eventsource()
}

/// Classify a stream response.
///
/// Anything other than a successful `text/event-stream` response is a
/// terminal rejection.
pub fn classify(status: StatusCode, content_type: Option<&str>) -> Result<(), FailureKind> {
    let is_stream = content_type.is_some_and(|ct| ct.trim_start().starts_with("text/event-stream"));
    if status.is_success() && is_stream {
        Ok(())
    } else {
        Err(FailureKind::Terminal)
    }
}

/// Forwarding counters reported when the transport stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Payloads handed to the frame driver.
    pub forwarded: u64,
    /// Payloads dropped because the inbound channel was full.
    pub dropped: u64,
    /// Connections opened.
    pub connections: u64,
}

/// Why a connection ended.
enum Disconnect {
    Failed(FailureKind),
    DriverGone,
}

/// SSE client that feeds the frame driver.
pub struct StreamTransport {
    client: reqwest::Client,
    url: String,
    policy: ReconnectPolicy,
    tx: mpsc::Sender<Inbound>,
    sink: TracingSink,
    origin: Instant,
    stats: TransportStats,
}

impl StreamTransport {
    /// Create a transport for the configured stream URL.
    pub fn new(client: reqwest::Client, config: &StreamConfig, tx: mpsc::Sender<Inbound>) -> Self {
        Self {
            client,
            url: config.url.clone(),
            policy: ReconnectPolicy::new(config),
            tx,
            sink: TracingSink,
            origin: Instant::now(),
            stats: TransportStats::default(),
        }
    }

    /// Connect and forward events until the frame driver goes away.
    ///
    /// Never gives up on the relay; retries continue indefinitely.
    pub async fn run(mut self) -> TransportStats {
        info!(url = %self.url, "Stream transport starting");

        loop {
            let kind = match self.connect_once().await {
                Disconnect::DriverGone => break,
                Disconnect::Failed(kind) => kind,
            };

            let now_ms = self.now_ms();
            match self.policy.on_failure(kind, now_ms) {
                ReconnectAction::TransportRetry { after_ms } => {
                    debug!(after_ms, "Retrying stream");
                    tokio::time::sleep(Duration::from_millis(after_ms)).await;
                }
                ReconnectAction::Scheduled { at_ms } => {
                    warn!(
                        delay_ms = at_ms.saturating_sub(self.now_ms()),
                        "Stream rejected, reconnect scheduled"
                    );
                    self.wait_for_reconnect().await;
                }
                ReconnectAction::AlreadyScheduled => self.wait_for_reconnect().await,
            }
        }

        info!(
            forwarded = self.stats.forwarded,
            dropped = self.stats.dropped,
            connections = self.stats.connections,
            "Stream transport stopped"
        );
        self.stats
    }

    async fn wait_for_reconnect(&mut self) {
        if let Some(at_ms) = self.policy.pending_at_ms() {
            let delay = at_ms.saturating_sub(self.now_ms());
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let now_ms = self.now_ms();
        self.policy.due(now_ms);
    }

    async fn connect_once(&mut self) -> Disconnect {
        let response = match self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.sink.capture_error(&e, &[("url", self.url.clone())]);
                return Disconnect::Failed(FailureKind::Transient);
            }
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        if let Err(kind) = classify(response.status(), content_type) {
            self.sink.warn(
                "stream request rejected",
                &[
                    ("status", response.status().to_string()),
                    ("content_type", content_type.unwrap_or("").to_owned()),
                ],
            );
            return Disconnect::Failed(kind);
        }

        self.policy.on_open();
        self.stats.connections = self.stats.connections.saturating_add(1);
        info!(url = %self.url, "Stream connected");

        let mut events = Box::pin(sse_events(response.bytes_stream()));
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    self.sink
                        .warn("stream read failed", &[("error", e.to_string()), ("url", self.url.clone())]);
                    return Disconnect::Failed(FailureKind::Transient);
                }
            };
            if let Some(retry) = event.retry {
                self.policy
                    .set_retry_hint(u64::try_from(retry.as_millis()).unwrap_or(u64::MAX));
            }
            if !event.data.is_empty() && !self.forward(event.data) {
                return Disconnect::DriverGone;
            }
        }

        debug!("Stream ended by server");
        Disconnect::Failed(FailureKind::Transient)
    }

    /// Hand one payload to the frame driver. Returns `false` once the
    /// driver has stopped.
    fn forward(&mut self, payload: String) -> bool {
        match self.tx.try_send(Inbound::Message(payload)) {
            Ok(()) => {
                self.stats.forwarded = self.stats.forwarded.saturating_add(1);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped = self.stats.dropped.saturating_add(1);
                if self.stats.dropped % DROP_LOG_EVERY == 1 {
                    self.sink.warn(
                        "inbound channel full, dropping payloads",
                        &[("dropped", self.stats.dropped.to_string())],
                    );
                }
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
