//! Headless monitor binary for the Orbital telemetry globe.
//!
//! Connects to the relay's event stream, runs the engine against an
//! in-memory scene, and publishes counters through the Observer API.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `orbital-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the inbound channel feeding the frame driver
//! 4. Start the Observer API server
//! 5. Start the stream transport
//! 6. Install the Ctrl-C shutdown hook
//! 7. Build the engine and run the frame loop
//! 8. Stop the Observer API and log the result

mod error;
mod observer_callback;
mod transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use orbital_core::clock::FrameClock;
use orbital_core::config::{LoggingConfig, OrbitalConfig};
use orbital_core::diagnostics::TracingSink;
use orbital_core::engine::OrbitalEngine;
use orbital_core::runner::{self, Inbound};
use orbital_core::surface::SceneSurface;
use orbital_observer::server::ServerConfig;
use orbital_observer::state::AppState;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::MonitorError;
use crate::observer_callback::ObserverCallback;
use crate::transport::StreamTransport;

/// Application entry point for the monitor.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the frame loop fails.
#[tokio::main]
async fn main() -> Result<(), MonitorError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        stream_url = %config.stream.url,
        observer_port = config.observer.port,
        seed = ?config.engine.seed,
        frame_interval_ms = config.engine.frame_interval_ms,
        "orbital-monitor starting"
    );

    // 3. Inbound channel. The transport and the observer only ever send.
    let (tx, mut rx) = mpsc::channel(config.engine.inbound_capacity);

    // 4. Start Observer API server.
    let app_state = Arc::new(AppState::with_control(tx.clone()));
    let server_config = ServerConfig::from(&config.observer);
    let observer_state = Arc::clone(&app_state);
    let (stop_observer, observer_stopped) = oneshot::channel::<()>();
    let observer = tokio::spawn(async move {
        let shutdown = async move {
            let _ = observer_stopped.await;
        };
        if let Err(e) =
            orbital_observer::start_server(&server_config, observer_state, shutdown).await
        {
            error!(error = %e, "Observer API server failed");
        }
    });

    // 5. Start the stream transport.
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let transport = StreamTransport::new(client, &config.stream, tx.clone());
    tokio::spawn(transport.run());

    // 6. Ctrl-C requests a clean stop.
    let shutdown_tx = tx;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            let _ = shutdown_tx.send(Inbound::Shutdown).await;
        }
    });

    // 7. Build the engine and run the frame loop.
    let mut clock = FrameClock::new();
    let mut engine = OrbitalEngine::new(
        &config,
        SceneSurface::new(),
        TracingSink,
        clock.elapsed_ms(),
    )?;
    let mut callback = ObserverCallback::new(app_state);

    let summary = runner::run_frames(
        &mut engine,
        &mut clock,
        &mut rx,
        Duration::from_millis(config.engine.frame_interval_ms),
        &mut callback,
    )
    .await?;

    // 8. Drain the observer, then log the result.
    let _ = stop_observer.send(());
    if let Err(e) = observer.await {
        error!(error = %e, "Observer task panicked");
    }
    info!(
        reason = ?summary.reason,
        frames = summary.frames,
        messages = summary.messages,
        admitted = summary.admitted,
        total_events = engine.total_events(),
        dropped = engine.dropped(),
        live_entities = engine.live_entities(),
        "orbital-monitor stopped"
    );

    Ok(())
}

/// Load configuration from `orbital-config.yaml`.
///
/// Falls back to defaults (with environment overrides) if the file does
/// not exist.
fn load_config() -> Result<OrbitalConfig, MonitorError> {
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
