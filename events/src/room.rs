//! Room naming shared by client and server. The literal names are part of the
//! wire contract: `"admin"` and `"board-{id}"`.

use std::fmt;

use crate::BoardId;

/// Name of the single global moderation room.
pub const ADMIN_ROOM: &str = "admin";

const BOARD_ROOM_PREFIX: &str = "board-";

/// A named subscription group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Admin,
    Board(BoardId),
}

impl Room {
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Admin => ADMIN_ROOM.to_owned(),
            Self::Board(id) => format!("{BOARD_ROOM_PREFIX}{id}"),
        }
    }

    /// Inverse of [`Room::name`].
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name == ADMIN_ROOM {
            return Some(Self::Admin);
        }
        let id = name.strip_prefix(BOARD_ROOM_PREFIX)?;
        id.parse().ok().map(Self::Board)
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str(ADMIN_ROOM),
            Self::Board(id) => write!(f, "{BOARD_ROOM_PREFIX}{id}"),
        }
    }
}
