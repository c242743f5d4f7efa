//! UDP-to-SSE relay for the Orbital telemetry globe.
//!
//! In relay mode, datagrams arriving on the UDP port are sampled and fanned
//! out to every client of `GET /stream`. In synthetic mode the binary
//! instead fires generated events at the UDP port of a running relay.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `orbital-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Synthetic mode: run the generator and stop here
//! 4. Bind the UDP socket and start the sampling listener
//! 5. Serve the SSE endpoint

mod error;
mod sse;
mod synthetic;
mod udp;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use orbital_core::config::{LoggingConfig, OrbitalConfig};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::net::{TcpListener, UdpSocket};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::RelayError;
use crate::sse::RelayState;
use crate::udp::Sampler;

/// Application entry point for the relay.
///
/// # Errors
///
/// Returns an error if configuration is invalid or a socket cannot be
/// bound.
#[tokio::main]
async fn main() -> Result<(), RelayError> {
    // 1. Load configuration.
    let config = load_config()?;
    let relay = &config.relay;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);

    let udp_addr = parse_addr(&relay.host, relay.udp_port)?;

    // 3. Synthetic mode.
    if relay.synthetic {
        info!(target_addr = %udp_addr, "orbital-relay starting in synthetic mode");
        return synthetic::run(udp_addr, Duration::from_micros(relay.synthetic_interval_us)).await;
    }

    info!(
        host = %relay.host,
        http_port = relay.http_port,
        udp_port = relay.udp_port,
        sample_rate = relay.sample_rate,
        "orbital-relay starting"
    );

    // 4. UDP listener.
    let state = Arc::new(RelayState::new(Duration::from_millis(
        config.stream.default_retry_ms,
    )));
    let socket = UdpSocket::bind(udp_addr).await?;
    let sampler = Sampler::new(relay.sample_rate, SmallRng::from_os_rng());
    let udp_tx = state.tx.clone();
    tokio::spawn(async move {
        if let Err(e) = udp::listen(socket, sampler, udp_tx).await {
            error!(error = %e, "UDP listener failed");
        }
    });

    // 5. SSE endpoint.
    let http_addr = parse_addr(&relay.host, relay.http_port)?;
    let listener = TcpListener::bind(http_addr).await?;
    info!(addr = %http_addr, "SSE endpoint listening");
    axum::serve(listener, sse::build_router(state)).await?;

    Ok(())
}

/// Load configuration from `orbital-config.yaml`, or defaults if the file
/// does not exist.
fn load_config() -> Result<OrbitalConfig, RelayError> {
    let config_path = Path::new("orbital-config.yaml");
    if config_path.exists() {
        Ok(OrbitalConfig::from_file(config_path)?)
    } else {
        let mut config = OrbitalConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

fn parse_addr(host: &str, port: u16) -> Result<SocketAddr, RelayError> {
    let addr = format!("{host}:{port}");
    addr.parse().map_err(|e: std::net::AddrParseError| RelayError::Address {
        reason: e.to_string(),
        addr,
    })
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
