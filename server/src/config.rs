//! Server configuration.
//!
//! DESIGN
//! ======
//! Read once at startup from the process environment (after `dotenvy` has
//! loaded any `.env` file). Parsing goes through a lookup function so tests
//! can supply variables without touching the real environment. Unset
//! variables fall back to defaults; set but malformed ones are errors.

use std::time::Duration;

use axum::http::HeaderValue;
use events::DEFAULT_CHANNEL_PATH;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_POLL_WAIT_SECS: u64 = 25;
const DEFAULT_POLL_IDLE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("CHANNEL_PATH must start with '/': {0:?}")]
    InvalidChannelPath(String),
    #[error("CORS_ORIGIN is not a valid header value: {0:?}")]
    InvalidCorsOrigin(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Mount point of the realtime channel, e.g. `/api/socketio`.
    pub channel_path: String,
    /// Allowed browser origin. Any origin when `None`.
    pub cors_origin: Option<String>,
    /// How long a long-poll request waits for the first envelope.
    pub poll_wait: Duration,
    /// Polling sessions idle longer than this are closed.
    pub poll_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            channel_path: DEFAULT_CHANNEL_PATH.to_owned(),
            cors_origin: None,
            poll_wait: Duration::from_secs(DEFAULT_POLL_WAIT_SECS),
            poll_idle_timeout: Duration::from_secs(DEFAULT_POLL_IDLE_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any malformed variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let poll_wait_secs = parse_or("POLL_WAIT_SECS", get("POLL_WAIT_SECS"), DEFAULT_POLL_WAIT_SECS)?;
        let poll_idle_secs = parse_or(
            "POLL_IDLE_TIMEOUT_SECS",
            get("POLL_IDLE_TIMEOUT_SECS"),
            DEFAULT_POLL_IDLE_TIMEOUT_SECS,
        )?;

        let channel_path = match get("CHANNEL_PATH") {
            Some(path) if !path.starts_with('/') => return Err(ConfigError::InvalidChannelPath(path)),
            Some(path) => path.trim_end_matches('/').to_owned(),
            None => DEFAULT_CHANNEL_PATH.to_owned(),
        };

        let cors_origin = get("CORS_ORIGIN");
        if let Some(origin) = &cors_origin {
            if HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::InvalidCorsOrigin(origin.clone()));
            }
        }

        Ok(Self {
            port,
            channel_path,
            cors_origin,
            poll_wait: Duration::from_secs(poll_wait_secs),
            poll_idle_timeout: Duration::from_secs(poll_idle_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
