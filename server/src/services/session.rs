//! Channel session handling shared by the websocket and polling transports.

use events::{ClientEvent, CodecError, Envelope, Room};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::rooms::ConnectionId;
use crate::state::AppState;

/// The client closed the session on purpose.
pub const REASON_CLIENT_DISCONNECT: &str = "client namespace disconnect";
/// The connection ended without a close handshake.
pub const REASON_TRANSPORT_CLOSE: &str = "transport close";
/// The connection failed while reading or writing.
pub const REASON_TRANSPORT_ERROR: &str = "transport error";
/// A polling session went quiet for too long.
pub const REASON_PING_TIMEOUT: &str = "ping timeout";

/// Register a new connection and log it.
pub async fn open(state: &AppState, transport: &str) -> (ConnectionId, mpsc::Receiver<Envelope>) {
    let (id, rx) = state.rooms.connect().await;
    state.conn_log.connected(id, transport);
    (id, rx)
}

/// Drop a connection from every room and log it. Safe to call twice.
pub async fn close(state: &AppState, id: ConnectionId, reason: &str) {
    if state.rooms.disconnect(id).await {
        state.conn_log.disconnected(id, reason);
    }
}

/// Apply one client envelope.
///
/// # Errors
///
/// Returns [`CodecError`] for unknown events or malformed payloads; the
/// connection stays open either way.
pub async fn handle_envelope(state: &AppState, id: ConnectionId, envelope: &Envelope) -> Result<(), CodecError> {
    match ClientEvent::from_envelope(envelope)? {
        ClientEvent::JoinAdmin => join(state, id, Room::Admin).await,
        ClientEvent::JoinBoard(board_id) => join(state, id, Room::Board(board_id)).await,
        ClientEvent::LeaveBoard(board_id) => {
            let room = Room::Board(board_id);
            if state.rooms.leave(id, &room).await {
                info!(connection_id = %id, room = %room, "server: left room");
            }
        }
        ClientEvent::Message(message) => {
            info!(connection_id = %id, kind = ?message.kind, "server: client message");
        }
    }
    Ok(())
}

/// Decode and apply a text frame, logging anything invalid.
pub async fn handle_text(state: &AppState, id: ConnectionId, text: &str) {
    let result = match Envelope::decode(text) {
        Ok(envelope) => handle_envelope(state, id, &envelope).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(connection_id = %id, error = %e, "server: ignoring client envelope");
    }
}

async fn join(state: &AppState, id: ConnectionId, room: Room) {
    if state.rooms.join(id, &room).await {
        info!(connection_id = %id, room = %room, "server: joined room");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
