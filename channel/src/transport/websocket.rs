//! Websocket transport.

use async_trait::async_trait;
use events::{Envelope, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use super::{
    Link, LinkEvent, LinkPeer, REASON_CLIENT_DISCONNECT, REASON_TRANSPORT_CLOSE, REASON_TRANSPORT_ERROR,
    Transport, report_closed,
};
use crate::config::{ChannelConfig, TransportKind};
use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn open(&self, config: &ChannelConfig) -> Result<Link, TransportError> {
        let url = config.websocket_url()?;
        let (mut stream, _) = connect_async(url.as_str()).await?;
        let sid = await_connected(&mut stream).await?;
        debug!(%sid, %url, "channel: websocket handshake complete");

        let (link, peer) = Link::pair(sid, TransportKind::WebSocket);
        tokio::spawn(pump(stream, peer));
        Ok(link)
    }
}

/// Read until the server's `connected` envelope and return its sid.
async fn await_connected(stream: &mut WsStream) -> Result<String, TransportError> {
    while let Some(frame) = stream.next().await {
        match frame? {
            Message::Text(text) => {
                let envelope = Envelope::decode(text.as_str())?;
                if let ServerEvent::Connected { sid } = ServerEvent::from_envelope(&envelope)? {
                    return Ok(sid);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Err(TransportError::Closed)
}

async fn pump(stream: WsStream, peer: LinkPeer) {
    let LinkPeer { mut outbound, inbound } = peer;
    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            next = outbound.recv() => {
                let Some(envelope) = next else {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(error = %e, "channel: websocket close frame failed");
                    }
                    break REASON_CLIENT_DISCONNECT;
                };
                if let Err(e) = write.send(Message::Text(envelope.encode().into())).await {
                    warn!(error = %e, "channel: websocket send failed");
                    break REASON_TRANSPORT_ERROR;
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match Envelope::decode(text.as_str()) {
                        Ok(envelope) => {
                            if inbound.send(LinkEvent::Message(envelope)).is_err() {
                                break REASON_CLIENT_DISCONNECT;
                            }
                        }
                        Err(e) => warn!(error = %e, "channel: undecodable websocket frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break REASON_TRANSPORT_CLOSE,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "channel: websocket read failed");
                        break REASON_TRANSPORT_ERROR;
                    }
                }
            }
        }
    };

    report_closed(&inbound, reason);
}
