//! Room broadcasts of moderation notifications.
//!
//! Each call wraps the payload in a `message` envelope and hands it to the
//! room registry. Delivery is best effort; the return value is the number of
//! connections that accepted the envelope, and zero for an empty room.

use events::{BoardId, Room, ServerEvent, WireMessage};
use tracing::info;

use crate::rooms::RoomRegistry;

/// Send to every connection in the `admin` room.
pub async fn emit_to_admin(rooms: &RoomRegistry, message: &WireMessage) -> usize {
    emit_to_room(rooms, &Room::Admin, message).await
}

/// Send to every connection in `board-{board_id}`.
pub async fn emit_to_board(rooms: &RoomRegistry, board_id: BoardId, message: &WireMessage) -> usize {
    emit_to_room(rooms, &Room::Board(board_id), message).await
}

/// Send to every connection regardless of room.
pub async fn emit_to_all(rooms: &RoomRegistry, message: &WireMessage) -> usize {
    let envelope = ServerEvent::Message(message.clone()).to_envelope();
    let delivered = rooms.emit_all(&envelope).await;
    info!(kind = message.kind.as_str(), delivered, "broadcast: sent to all connections");
    delivered
}

async fn emit_to_room(rooms: &RoomRegistry, room: &Room, message: &WireMessage) -> usize {
    let envelope = ServerEvent::Message(message.clone()).to_envelope();
    let delivered = rooms.emit(room, &envelope).await;
    info!(room = %room, kind = message.kind.as_str(), delivered, "broadcast: sent to room");
    delivered
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
