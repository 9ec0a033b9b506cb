//! Transports that carry channel envelopes.
//!
//! DESIGN
//! ======
//! A transport only has to complete a handshake and hand back a [`Link`]:
//! the server-assigned session id plus a pair of unbounded queues. Outbound
//! envelopes go in through [`Link::outbound`]; dropping that sender closes
//! the session. Inbound envelopes and the final close reason come out of
//! [`Link::inbound`]. Each transport runs its own background task between
//! the socket and those queues, so the manager never sees wire details.

pub mod polling;
pub mod websocket;

use std::sync::Arc;

use async_trait::async_trait;
use events::Envelope;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::{ChannelConfig, TransportKind};
use crate::error::TransportError;

pub use polling::PollingTransport;
pub use websocket::WebSocketTransport;

/// Close reason when the remote side went away cleanly.
pub const REASON_TRANSPORT_CLOSE: &str = "transport close";
/// Close reason when the connection failed mid-session.
pub const REASON_TRANSPORT_ERROR: &str = "transport error";
/// Close reason when this side released the link.
pub const REASON_CLIENT_DISCONNECT: &str = "io client disconnect";

#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Connect and complete the handshake.
    async fn open(&self, config: &ChannelConfig) -> Result<Link, TransportError>;
}

/// Inbound traffic on an open link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Message(Envelope),
    /// Terminal. Carries the close reason.
    Closed(String),
}

/// Manager-facing end of an open session.
#[derive(Debug)]
pub struct Link {
    pub sid: String,
    pub kind: TransportKind,
    pub outbound: mpsc::UnboundedSender<Envelope>,
    pub inbound: mpsc::UnboundedReceiver<LinkEvent>,
}

/// Transport-facing end of an open session.
#[derive(Debug)]
pub struct LinkPeer {
    pub outbound: mpsc::UnboundedReceiver<Envelope>,
    pub inbound: mpsc::UnboundedSender<LinkEvent>,
}

impl Link {
    /// Create both ends of a session.
    #[must_use]
    pub fn pair(sid: impl Into<String>, kind: TransportKind) -> (Link, LinkPeer) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let link = Link { sid: sid.into(), kind, outbound: out_tx, inbound: in_rx };
        let peer = LinkPeer { outbound: out_rx, inbound: in_tx };
        (link, peer)
    }
}

/// Report a close to the manager side, if it is still listening.
pub(crate) fn report_closed(inbound: &mpsc::UnboundedSender<LinkEvent>, reason: &str) {
    if inbound.send(LinkEvent::Closed(reason.to_owned())).is_err() {
        debug!(reason, "channel: link closed after manager released it");
    }
}

/// Build the stock transports for the given preference order.
#[must_use]
pub fn for_kinds(kinds: &[TransportKind]) -> Vec<Arc<dyn Transport>> {
    kinds
        .iter()
        .map(|kind| -> Arc<dyn Transport> {
            match kind {
                TransportKind::WebSocket => Arc::new(WebSocketTransport),
                TransportKind::Polling => Arc::new(PollingTransport::default()),
            }
        })
        .collect()
}
