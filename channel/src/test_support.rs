//! Scripted transport shared by the crate's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout};

use crate::config::{ChannelConfig, TransportKind};
use crate::error::TransportError;
use crate::manager::{SocketManager, StatusCallback};
use crate::transport::{Link, LinkPeer, Transport};

/// Records every `open`, fails the first `failures` of them, and hands the
/// transport side of each successful link to the test.
pub(crate) struct MockTransport {
    opens: Arc<Mutex<Vec<Instant>>>,
    failures: Arc<AtomicUsize>,
    delay: Duration,
    peers: mpsc::UnboundedSender<LinkPeer>,
}

#[async_trait]
impl Transport for MockTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn open(&self, _config: &ChannelConfig) -> Result<Link, TransportError> {
        let n = {
            let mut opens = self.opens.lock().expect("opens lock");
            opens.push(Instant::now());
            opens.len()
        };
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| f.checked_sub(1))
            .is_ok()
        {
            return Err(TransportError::Status(503));
        }
        let (link, peer) = Link::pair(format!("sid-{n}"), TransportKind::WebSocket);
        self.peers.send(peer).expect("test holds peer receiver");
        Ok(link)
    }
}

pub(crate) struct Harness {
    pub manager: SocketManager,
    pub failures: Arc<AtomicUsize>,
    opens: Arc<Mutex<Vec<Instant>>>,
    peers: mpsc::UnboundedReceiver<LinkPeer>,
}

impl Harness {
    pub fn opens(&self) -> Vec<Instant> {
        self.opens.lock().expect("opens lock").clone()
    }

    pub async fn next_peer(&mut self) -> LinkPeer {
        timeout(Duration::from_secs(60), self.peers.recv())
            .await
            .expect("peer timed out")
            .expect("transport dropped")
    }
}

pub(crate) fn harness_with(failures: usize, delay: Duration) -> Harness {
    let opens = Arc::new(Mutex::new(Vec::new()));
    let failures = Arc::new(AtomicUsize::new(failures));
    let (tx, peers) = mpsc::unbounded_channel();
    let transport = MockTransport {
        opens: Arc::clone(&opens),
        failures: Arc::clone(&failures),
        delay,
        peers: tx,
    };
    let manager = SocketManager::with_transports(ChannelConfig::default(), vec![Arc::new(transport)]);
    Harness { manager, failures, opens, peers }
}

pub(crate) fn harness(failures: usize) -> Harness {
    harness_with(failures, Duration::ZERO)
}

/// Let spawned tasks run on the paused clock.
pub(crate) async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

/// Status callback that counts its calls.
pub(crate) fn counter() -> (Arc<AtomicUsize>, StatusCallback) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let callback: StatusCallback = Arc::new(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (count, callback)
}
