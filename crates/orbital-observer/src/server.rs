//! Observer HTTP server lifecycle.
//!
//! The monitor spawns [`start_server`] next to the frame loop and resolves
//! the shutdown future once the loop has returned, so in-flight requests
//! and WebSocket handshakes drain before the process exits.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use orbital_core::config::ObserverConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Listen address for the Observer server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port; `0` lets the OS pick one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ObserverConfig::default())
    }
}

impl From<&ObserverConfig> for ServerConfig {
    fn from(config: &ObserverConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Serve the Observer API until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError`] if the address does not parse, the listener
/// cannot bind, or serving fails.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let raw = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = raw.parse().map_err(move |e: std::net::AddrParseError| {
        ServerError::InvalidAddress {
            addr: raw,
            reason: e.to_string(),
        }
    })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let bound = listener.local_addr().map_err(|source| ServerError::Bind { addr, source })?;
    info!(addr = %bound, "Observer server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(addr = %bound, "Observer server stopped");
    Ok(())
}

/// Errors from starting or running the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Host and port do not form a socket address.
    #[error("invalid listen address {addr}: {reason}")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// The listener could not bind.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Serving failed after the listener was up.
    #[error("serve error: {source}")]
    Serve {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> ServerConfig {
        ServerConfig {
            host: host.to_owned(),
            port: 0,
        }
    }

    #[tokio::test]
    async fn returns_once_shutdown_resolves() {
        let result = start_server(
            &config("127.0.0.1"),
            Arc::new(AppState::new()),
            std::future::ready(()),
        )
        .await;
        assert!(result.is_ok(), "{result:?}");
    }

    #[tokio::test]
    async fn rejects_unparseable_host() {
        let result = start_server(
            &config("not a host"),
            Arc::new(AppState::new()),
            std::future::ready(()),
        )
        .await;
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[test]
    fn config_follows_observer_section() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
    }
}
