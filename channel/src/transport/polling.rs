//! HTTP long-polling transport.
//!
//! `POST {path}/poll` opens a session and answers with the `connected`
//! envelope. The client then holds one `GET {path}/poll/{sid}` open at a
//! time; the server answers with a JSON array of pending envelopes (possibly
//! empty after its wait window). Outbound envelopes are `POST`ed to the same
//! session URL as an array, and `DELETE` ends the session. A 404 on any of
//! these means the server already dropped the session.

use async_trait::async_trait;
use events::{Envelope, ServerEvent};
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{
    Link, LinkEvent, LinkPeer, REASON_TRANSPORT_CLOSE, REASON_TRANSPORT_ERROR, Transport,
    report_closed,
};
use crate::config::{ChannelConfig, TransportKind};
use crate::error::TransportError;

#[derive(Debug, Clone, Default)]
pub struct PollingTransport {
    client: reqwest::Client,
}

#[async_trait]
impl Transport for PollingTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Polling
    }

    async fn open(&self, config: &ChannelConfig) -> Result<Link, TransportError> {
        let url = config.polling_url()?;
        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        let envelope: Envelope = response.json().await?;
        let ServerEvent::Connected { sid } = ServerEvent::from_envelope(&envelope)? else {
            return Err(TransportError::Decode(format!(
                "expected connected envelope, got {}",
                envelope.event
            )));
        };
        debug!(%sid, %url, "channel: polling session opened");

        let session_url = format!("{url}/{sid}");
        let (link, peer) = Link::pair(sid, TransportKind::Polling);
        let LinkPeer { outbound, inbound } = peer;
        let poller = tokio::spawn(poll_loop(self.client.clone(), session_url.clone(), inbound));
        tokio::spawn(write_loop(self.client.clone(), session_url, outbound, poller));
        Ok(link)
    }
}

async fn poll_loop(client: reqwest::Client, url: String, inbound: mpsc::UnboundedSender<LinkEvent>) {
    let reason = loop {
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "channel: poll request failed");
                break REASON_TRANSPORT_ERROR;
            }
        };
        if response.status() == StatusCode::NOT_FOUND {
            break REASON_TRANSPORT_CLOSE;
        }
        if !response.status().is_success() {
            warn!(status = %response.status(), "channel: poll rejected");
            break REASON_TRANSPORT_ERROR;
        }
        match response.json::<Vec<Envelope>>().await {
            Ok(batch) => {
                for envelope in batch {
                    if inbound.send(LinkEvent::Message(envelope)).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "channel: undecodable poll batch");
                break REASON_TRANSPORT_ERROR;
            }
        }
    };

    report_closed(&inbound, reason);
}

async fn write_loop(
    client: reqwest::Client,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
    poller: JoinHandle<()>,
) {
    while let Some(first) = outbound.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = outbound.try_recv() {
            batch.push(next);
        }
        match client.post(&url).json(&batch).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(status = %response.status(), "channel: poll send rejected"),
            Err(e) => warn!(error = %e, "channel: poll send failed"),
        }
    }

    poller.abort();
    if let Err(e) = client.delete(&url).send().await {
        debug!(error = %e, "channel: polling session close failed");
    }
}
