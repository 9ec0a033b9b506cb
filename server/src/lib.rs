//! Event broadcast server for the message wall.
//!
//! ARCHITECTURE
//! ============
//! Clients hold one channel connection each (websocket, or HTTP long-polling
//! as a fallback) and join the `admin` room or a `board-{id}` room. The HTTP
//! API mutates boards and posts in an in-memory store and fans the resulting
//! notifications out to those rooms.
//!
//! | Module | Role |
//! |--------|------|
//! | [`rooms`] | Connection registry, room membership, best-effort emit |
//! | [`services`] | Broadcasts, session handling, polling sessions, store |
//! | [`routes`] | Axum router: channel transports and the HTTP API |
//! | [`conn_log`] | Rate-limited connection count logging |
//! | [`config`] | Environment configuration |

pub mod config;
pub mod conn_log;
pub mod error;
pub mod rooms;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use state::AppState;
