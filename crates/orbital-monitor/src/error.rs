//! Error types for the monitor binary.

/// Top-level error for the monitor binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: orbital_core::config::ConfigError,
    },

    /// The frame loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: orbital_core::runner::RunnerError,
    },

    /// The HTTP client for the event stream could not be built.
    #[error("http client error: {source}")]
    Client {
        /// The underlying client error.
        #[from]
        source: reqwest::Error,
    },
}
