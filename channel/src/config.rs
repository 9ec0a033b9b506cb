//! Connection settings for the channel manager.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt;
use std::time::Duration;

use events::DEFAULT_CHANNEL_PATH;

use crate::error::TransportError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_RECONNECT_ATTEMPTS: u32 = 3;
const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;
const DEFAULT_THROTTLE_MS: u64 = 1000;

// =============================================================================
// TRANSPORT KIND
// =============================================================================

/// Wire transport carrying the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Persistent bidirectional socket. Preferred.
    WebSocket,
    /// HTTP long-polling fallback.
    Polling,
}

impl TransportKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebSocket => "websocket",
            Self::Polling => "polling",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// HTTP base URL of the server, e.g. `http://127.0.0.1:3000`.
    pub base_url: String,
    /// Path that identifies the wall's channel on that host.
    pub path: String,
    /// Per-transport handshake deadline.
    pub handshake_timeout: Duration,
    /// Retries after a failed attempt, each preceded by `reconnect_delay`.
    pub reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    /// Minimum spacing between connection attempts.
    pub throttle: Duration,
    /// Transports tried in order on every attempt.
    pub transports: Vec<TransportKind>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            path: DEFAULT_CHANNEL_PATH.to_owned(),
            handshake_timeout: Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS),
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            transports: vec![TransportKind::WebSocket, TransportKind::Polling],
        }
    }
}

impl ChannelConfig {
    /// Defaults with `WALL_BASE_URL` and `WALL_CHANNEL_PATH` applied when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`. Blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(url) = non_empty("WALL_BASE_URL") {
            config.base_url = url;
        }
        if let Some(path) = non_empty("WALL_CHANNEL_PATH") {
            config.path = path;
        }
        config
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_transports(mut self, transports: Vec<TransportKind>) -> Self {
        self.transports = transports;
        self
    }

    /// `ws://` or `wss://` URL of the websocket endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidBaseUrl`] unless the base URL is
    /// `http://` or `https://`.
    pub fn websocket_url(&self) -> Result<String, TransportError> {
        let base = self.base_url.trim_end_matches('/');
        let path = self.normalized_path();

        if let Some(rest) = base.strip_prefix("http://") {
            return Ok(format!("ws://{rest}{path}"));
        }
        if let Some(rest) = base.strip_prefix("https://") {
            return Ok(format!("wss://{rest}{path}"));
        }

        Err(TransportError::InvalidBaseUrl(self.base_url.clone()))
    }

    /// HTTP URL that opens a long-polling session.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidBaseUrl`] unless the base URL is
    /// `http://` or `https://`.
    pub fn polling_url(&self) -> Result<String, TransportError> {
        let base = self.base_url.trim_end_matches('/');
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(TransportError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(format!("{base}{}/poll", self.normalized_path()))
    }

    fn normalized_path(&self) -> String {
        let trimmed = self.path.trim().trim_end_matches('/');
        if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{trimmed}")
        }
    }
}
