//! Error types for the relay binary.

/// Top-level error for the relay binary.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: orbital_core::config::ConfigError,
    },

    /// A socket operation failed.
    #[error("io error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A listen address could not be parsed.
    #[error("invalid address {addr}: {reason}")]
    Address {
        /// The address as configured.
        addr: String,
        /// Why it failed to parse.
        reason: String,
    },
}
