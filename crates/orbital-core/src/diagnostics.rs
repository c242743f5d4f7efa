//! Diagnostic sink for decode failures, throttle warnings, and transport
//! errors.
//!
//! Components never log directly for conditions an operator may need to
//! see in aggregate; they report through a [`DiagnosticSink`] so the
//! destination (tracing, an error tracker, a test recorder) is chosen by
//! the host.

use tracing::{error, warn};

/// Structured key/value context attached to a diagnostic.
pub type DiagnosticContext<'a> = &'a [(&'static str, String)];

/// Destination for warnings and captured errors.
pub trait DiagnosticSink {
    /// Report a warning with structured context.
    fn warn(&mut self, message: &str, context: DiagnosticContext<'_>);

    /// Report an error value with structured context.
    fn capture_error(&mut self, error: &dyn std::error::Error, context: DiagnosticContext<'_>);
}

/// Sink that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&mut self, message: &str, context: DiagnosticContext<'_>) {
        warn!(target: "orbital::diagnostics", ?context, "{message}");
    }

    fn capture_error(&mut self, err: &dyn std::error::Error, context: DiagnosticContext<'_>) {
        error!(target: "orbital::diagnostics", error = %err, ?context, "captured error");
    }
}

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// Recorded through [`DiagnosticSink::warn`].
    Warning,
    /// Recorded through [`DiagnosticSink::capture_error`].
    Error,
}

/// One diagnostic captured by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Warning or error.
    pub level: DiagnosticLevel,
    /// The warning message, or the error's display text.
    pub message: String,
    /// Context pairs as reported.
    pub context: Vec<(&'static str, String)>,
}

/// Sink that keeps every diagnostic in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Vec<DiagnosticRecord>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Every diagnostic recorded so far, oldest first.
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    /// Number of recorded warnings.
    pub fn warnings(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }

    /// Number of recorded errors.
    pub fn errors(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.records.iter().filter(|r| r.level == level).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&mut self, message: &str, context: DiagnosticContext<'_>) {
        self.records.push(DiagnosticRecord {
            level: DiagnosticLevel::Warning,
            message: message.to_owned(),
            context: context.to_vec(),
        });
    }

    fn capture_error(&mut self, err: &dyn std::error::Error, context: DiagnosticContext<'_>) {
        self.records.push(DiagnosticRecord {
            level: DiagnosticLevel::Error,
            message: err.to_string(),
            context: context.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_separates_levels() {
        let mut sink = RecordingSink::new();
        sink.warn("slow down", &[("live", "120".to_owned())]);
        let err = std::io::Error::other("boom");
        sink.capture_error(&err, &[]);

        assert_eq!(sink.warnings(), 1);
        assert_eq!(sink.errors(), 1);
        assert_eq!(sink.records().len(), 2);
        assert_eq!(sink.records().first().map(|r| r.context.len()), Some(1));
        assert_eq!(sink.records().get(1).map(|r| r.message.as_str()), Some("boom"));
    }
}
