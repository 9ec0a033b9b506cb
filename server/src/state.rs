//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Every field is a cheap handle over shared interior state, so cloning it
//! per request is free.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::conn_log::ConnectionLog;
use crate::rooms::RoomRegistry;
use crate::services::polling::PollSessions;
use crate::services::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub rooms: RoomRegistry,
    pub store: Store,
    pub conn_log: ConnectionLog,
    pub polls: PollSessions,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            rooms: RoomRegistry::new(),
            store: Store::new(),
            conn_log: ConnectionLog::new(),
            polls: PollSessions::new(),
        }
    }
}
