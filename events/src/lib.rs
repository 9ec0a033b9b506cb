//! Shared event model and JSON codec for the message wall's realtime channel.
//!
//! This crate owns the wire representation used by both `server` and the
//! `channel` client. Every transport frame is an [`Envelope`]: an event name
//! plus a JSON payload, the same shape as a socket.io `emit(event, payload)`.
//! Moderation notifications travel inside `message` envelopes as a
//! [`WireMessage`] (`{type, data}`), whose `data` stays opaque to the channel.

mod model;
mod room;

pub use model::{Board, BoardId, BoardType, Post, PostId, PostStatus};
pub use room::{ADMIN_ROOM, Room};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// URL path that distinguishes the wall's event channel from other services
/// on the same host.
pub const DEFAULT_CHANNEL_PATH: &str = "/api/socketio";

/// Event names carried in [`Envelope::event`].
pub mod names {
    /// Server → client, first envelope on every connection.
    pub const CONNECTED: &str = "connected";
    /// Client → server, join the global admin room.
    pub const JOIN_ADMIN: &str = "join-admin";
    /// Client → server, join `board-{id}`.
    pub const JOIN_BOARD: &str = "join-board";
    /// Client → server, leave `board-{id}`.
    pub const LEAVE_BOARD: &str = "leave-board";
    /// Both directions, carries a [`WireMessage`](super::WireMessage).
    pub const MESSAGE: &str = "message";
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned when decoding envelopes or their payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text was not valid JSON for the expected shape.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The envelope named an event this side does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    /// A board id was neither an integer nor a numeric string.
    #[error("invalid board id: {0}")]
    InvalidBoardId(String),
    /// A post status string did not match `PENDING|APPROVED|REJECTED`.
    #[error("invalid post status: {0}")]
    InvalidStatus(String),
    /// A required payload field was absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

// =============================================================================
// WIRE MESSAGE
// =============================================================================

/// Discriminant of a moderation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A visitor submitted a post; sent to the admin room.
    NewPost,
    /// A post changed moderation status; sent to the admin room.
    PostStatusUpdated,
    /// A post was approved; sent to the post's board room.
    NewApprovedPost,
    /// Board settings changed.
    BoardUpdate,
    /// A client asks its peers to refresh their post lists.
    RequestPosts,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewPost => "NEW_POST",
            Self::PostStatusUpdated => "POST_STATUS_UPDATED",
            Self::NewApprovedPost => "NEW_APPROVED_POST",
            Self::BoardUpdate => "BOARD_UPDATE",
            Self::RequestPosts => "REQUEST_POSTS",
        }
    }
}

/// The `{type, data}` payload broadcast to rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl WireMessage {
    #[must_use]
    pub fn new(kind: EventType, data: Value) -> Self {
        Self { kind, data }
    }

    /// Wrap a post record.
    #[must_use]
    pub fn with_post(kind: EventType, post: &Post) -> Self {
        Self::new(kind, serde_json::to_value(post).unwrap_or_default())
    }

    /// Wrap a board record.
    #[must_use]
    pub fn with_board(kind: EventType, board: &Board) -> Self {
        Self::new(kind, serde_json::to_value(board).unwrap_or_default())
    }

    /// Interpret `data` as a post.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if `data` is not a post record.
    pub fn post(&self) -> Result<Post, CodecError> {
        Ok(Post::deserialize(&self.data)?)
    }

    /// Interpret `data` as a board.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if `data` is not a board record.
    pub fn board(&self) -> Result<Board, CodecError> {
        Ok(Board::deserialize(&self.data)?)
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// One transport frame: event name plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self { event: event.into(), data }
    }

    /// Encode as a JSON text frame.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serializing a string key plus a `Value` cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode a single JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for malformed text.
    pub fn decode(text: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode a batch of envelopes as a JSON array (polling transport body).
    #[must_use]
    pub fn encode_batch(batch: &[Self]) -> String {
        serde_json::to_string(batch).unwrap_or_else(|_| "[]".to_owned())
    }

    /// Decode a JSON array of envelopes. A bare object is accepted as a
    /// batch of one.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for malformed text.
    pub fn decode_batch(text: &str) -> Result<Vec<Self>, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        if value.is_array() {
            Ok(Vec::<Self>::deserialize(value)?)
        } else {
            Ok(vec![Self::deserialize(value)?])
        }
    }
}

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// Events a client may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinAdmin,
    JoinBoard(BoardId),
    LeaveBoard(BoardId),
    Message(WireMessage),
}

impl ClientEvent {
    #[must_use]
    pub fn to_envelope(&self) -> Envelope {
        match self {
            Self::JoinAdmin => Envelope::new(names::JOIN_ADMIN, Value::Null),
            Self::JoinBoard(id) => Envelope::new(names::JOIN_BOARD, Value::from(*id)),
            Self::LeaveBoard(id) => Envelope::new(names::LEAVE_BOARD, Value::from(*id)),
            Self::Message(msg) => {
                Envelope::new(names::MESSAGE, serde_json::to_value(msg).unwrap_or_default())
            }
        }
    }

    /// Parse a client envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownEvent`] for unhandled event names,
    /// [`CodecError::InvalidBoardId`] for non-numeric board ids, and
    /// [`CodecError::Json`] for a malformed `message` payload.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, CodecError> {
        match envelope.event.as_str() {
            names::JOIN_ADMIN => Ok(Self::JoinAdmin),
            names::JOIN_BOARD => Ok(Self::JoinBoard(parse_board_id(&envelope.data)?)),
            names::LEAVE_BOARD => Ok(Self::LeaveBoard(parse_board_id(&envelope.data)?)),
            names::MESSAGE => Ok(Self::Message(WireMessage::deserialize(&envelope.data)?)),
            other => Err(CodecError::UnknownEvent(other.to_owned())),
        }
    }
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

/// Events the server sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connected { sid: String },
    Message(WireMessage),
}

impl ServerEvent {
    #[must_use]
    pub fn to_envelope(&self) -> Envelope {
        match self {
            Self::Connected { sid } => {
                Envelope::new(names::CONNECTED, serde_json::json!({ "sid": sid }))
            }
            Self::Message(msg) => {
                Envelope::new(names::MESSAGE, serde_json::to_value(msg).unwrap_or_default())
            }
        }
    }

    /// Parse a server envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownEvent`] for unhandled event names,
    /// [`CodecError::MissingField`] for a `connected` envelope without a
    /// sid, and [`CodecError::Json`] for a malformed `message` payload.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, CodecError> {
        match envelope.event.as_str() {
            names::CONNECTED => {
                let sid = envelope
                    .data
                    .get("sid")
                    .and_then(Value::as_str)
                    .ok_or(CodecError::MissingField("sid"))?;
                Ok(Self::Connected { sid: sid.to_owned() })
            }
            names::MESSAGE => Ok(Self::Message(WireMessage::deserialize(&envelope.data)?)),
            other => Err(CodecError::UnknownEvent(other.to_owned())),
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Read a board id sent either as a JSON integer or a numeric string.
///
/// # Errors
///
/// Returns [`CodecError::InvalidBoardId`] for anything else.
pub fn parse_board_id(value: &Value) -> Result<BoardId, CodecError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CodecError::InvalidBoardId(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<BoardId>()
            .map_err(|_| CodecError::InvalidBoardId(s.clone())),
        other => Err(CodecError::InvalidBoardId(other.to_string())),
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
