//! Synthetic event generator for local development.
//!
//! Emits tuples at real city coordinates with a small jitter, using a
//! platform mix weighted roughly like production traffic.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::net::UdpSocket;
use tracing::info;

use crate::error::RelayError;

/// Platform tags; repeats weight the draw.
const PLATFORMS: &[&str] = &[
    "javascript", "javascript", "javascript", "node", "node", "node", "python", "python", "java",
    "java", "cocoa", "php", "csharp", "ruby", "go", "native", "elixir",
];

/// `(lat, lng)` of populated places.
const CITIES: &[(f64, f64)] = &[
    (40.7, -74.0),   // New York
    (37.8, -122.4),  // San Francisco
    (51.5, -0.1),    // London
    (48.9, 2.3),     // Paris
    (52.5, 13.4),    // Berlin
    (35.7, 139.7),   // Tokyo
    (39.9, 116.4),   // Beijing
    (31.2, 121.5),   // Shanghai
    (-33.9, 151.2),  // Sydney
    (-23.5, -46.6),  // Sao Paulo
    (19.1, 72.9),    // Mumbai
    (12.9, 77.6),    // Bangalore
    (30.0, 31.2),    // Cairo
    (6.5, 3.4),      // Lagos
    (19.4, -99.1),   // Mexico City
    (-34.6, -58.4),  // Buenos Aires
    (55.8, 37.6),    // Moscow
    (41.0, 29.0),    // Istanbul
    (37.6, 127.0),   // Seoul
    (1.3, 103.8),    // Singapore
    (25.2, 55.3),    // Dubai
    (43.7, -79.4),   // Toronto
    (41.9, -87.6),   // Chicago
    (34.1, -118.2),  // Los Angeles
    (47.6, -122.3),  // Seattle
    (52.4, 4.9),     // Amsterdam
    (59.3, 18.1),    // Stockholm
    (40.4, -3.7),    // Madrid
    (22.3, 114.2),   // Hong Kong
    (-6.2, 106.8),   // Jakarta
    (13.8, 100.5),   // Bangkok
    (-1.3, 36.8),    // Nairobi
    (-33.9, 18.4),   // Cape Town
    (4.7, -74.1),    // Bogota
    (-12.0, -77.0),  // Lima
    (50.1, 8.7),     // Frankfurt
    (28.6, 77.2),    // New Delhi
    (14.6, 121.0),   // Manila
    (-26.2, 28.0),   // Johannesburg
    (32.1, 34.8),    // Tel Aviv
    (35.7, 51.4),    // Tehran
    (-36.9, 174.8),  // Auckland
    (-37.8, 145.0),  // Melbourne
    (21.3, -157.8),  // Honolulu
    (61.2, -149.9),  // Anchorage
    (64.8, -147.7),  // Fairbanks
    (49.3, -123.1),  // Vancouver
];

/// Maximum jitter applied to each coordinate, in degrees.
const JITTER_DEG: f64 = 1.0;

/// Build one synthetic payload stamped with `now_ms`.
pub fn synthetic_payload(rng: &mut impl Rng, now_ms: i64) -> String {
    let (lat, lng) = CITIES
        .get(rng.random_range(0..CITIES.len()))
        .copied()
        .unwrap_or_default();
    let platform = PLATFORMS
        .get(rng.random_range(0..PLATFORMS.len()))
        .copied()
        .unwrap_or("javascript");

    let lat = round4((rng.random::<f64>() - 0.5).mul_add(2.0 * JITTER_DEG, lat));
    let lng = round4((rng.random::<f64>() - 0.5).mul_add(2.0 * JITTER_DEG, lng));

    serde_json::json!([lat, lng, now_ms, platform]).to_string()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Fire synthetic events at `target` forever, pausing `interval` between
/// sends.
///
/// # Errors
///
/// Returns [`RelayError::Io`] if the local socket cannot be bound or a
/// send fails.
pub async fn run(target: SocketAddr, interval: Duration) -> Result<(), RelayError> {
    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let mut rng = SmallRng::from_os_rng();
    let mut sent: u64 = 0;

    info!(%target, ?interval, "Synthetic generator started");

    loop {
        let payload = synthetic_payload(&mut rng, Utc::now().timestamp_millis());
        socket.send_to(payload.as_bytes(), target).await?;
        sent = sent.saturating_add(1);
        if sent % 100_000 == 0 {
            info!(sent, "Synthetic events sent");
        }
        tokio::time::sleep(interval).await;
    }
}
