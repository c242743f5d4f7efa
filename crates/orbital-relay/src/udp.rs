//! UDP intake with probabilistic sampling.
//!
//! Producers fire JSON event tuples at the relay over UDP. Only a
//! configurable fraction is forwarded to stream clients; the rest is
//! dropped before it costs anything downstream.

use rand::Rng;
use rand::rngs::SmallRng;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::RelayError;

/// Largest datagram accepted; longer datagrams are truncated by the socket.
pub const MAX_DATAGRAM: usize = 256;

/// Bernoulli sampler deciding which datagrams are forwarded.
#[derive(Debug, Clone)]
pub struct Sampler {
    rate: f64,
    rng: SmallRng,
}

impl Sampler {
    /// Forward each datagram with probability `rate`.
    pub const fn new(rate: f64, rng: SmallRng) -> Self {
        Self { rate, rng }
    }

    /// Draw once. A rate of 0 never forwards; a rate of 1 always does.
    pub fn keep(&mut self) -> bool {
        self.rng.random::<f64>() < self.rate
    }
}

/// Receive datagrams forever, forwarding the sampled ones to `tx`.
///
/// # Errors
///
/// Returns [`RelayError::Io`] if the socket fails.
pub async fn listen(
    socket: UdpSocket,
    mut sampler: Sampler,
    tx: broadcast::Sender<String>,
) -> Result<(), RelayError> {
    info!(addr = %socket.local_addr()?, "UDP listener started");

    let mut buf = [0_u8; MAX_DATAGRAM];
    let mut received: u64 = 0;
    let mut forwarded: u64 = 0;

    loop {
        let (len, _) = socket.recv_from(&mut buf).await?;
        received = received.saturating_add(1);
        if !sampler.keep() {
            continue;
        }

        let payload = String::from_utf8_lossy(buf.get(..len).unwrap_or_default()).into_owned();
        // Zero subscribers is normal between stream clients.
        let _ = tx.send(payload);
        forwarded = forwarded.saturating_add(1);

        if forwarded % 10_000 == 0 {
            debug!(received, forwarded, clients = tx.receiver_count(), "UDP relay progress");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn zero_rate_never_forwards() {
        let mut sampler = Sampler::new(0.0, SmallRng::seed_from_u64(1));
        assert!((0..10_000).all(|_| !sampler.keep()));
    }

    #[test]
    fn full_rate_always_forwards() {
        let mut sampler = Sampler::new(1.0, SmallRng::seed_from_u64(1));
        assert!((0..10_000).all(|_| sampler.keep()));
    }

    #[test]
    fn partial_rate_is_close() {
        let mut sampler = Sampler::new(0.05, SmallRng::seed_from_u64(9));
        let kept = (0..20_000).filter(|_| sampler.keep()).count();
        assert!((800..1200).contains(&kept), "kept = {kept}");
    }

    #[tokio::test]
    async fn forwards_datagrams_to_subscribers() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let (tx, mut rx) = broadcast::channel(8);
        let sampler = Sampler::new(1.0, SmallRng::seed_from_u64(3));
        let handle = tokio::spawn(listen(socket, sampler, tx));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(b"[1.0,2.0,3,\"go\"]", addr)
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), "[1.0,2.0,3,\"go\"]");
        handle.abort();
    }
}
