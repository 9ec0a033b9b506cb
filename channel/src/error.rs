//! Error types for the channel client.
//!
//! Both enums are `Clone` because one connection attempt's outcome is shared
//! by every caller waiting on it.

use std::time::Duration;

/// Failure of a single transport handshake or session.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("websocket failed: {0}")]
    WebSocket(String),
    #[error("http request failed: {0}")]
    Http(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("frame decode failed: {0}")]
    Decode(String),
    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),
    #[error("closed before handshake completed")]
    Closed,
    #[error("no transports configured")]
    NoTransports,
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(err.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<events::CodecError> for TransportError {
    fn from(err: events::CodecError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Failure surfaced by [`crate::SocketManager::get_socket`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelError {
    #[error("connection failed after {attempts} attempts: {last}")]
    ConnectFailed {
        attempts: u32,
        #[source]
        last: TransportError,
    },
    #[error("connection attempt cancelled by disconnect")]
    Cancelled,
    #[error("connection task failed: {0}")]
    Task(String),
}
