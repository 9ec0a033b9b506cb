use std::fmt;
use std::time::Duration;

use events::Post;

use crate::geometry::Position;

/// Rendering key of a displayed entity.
///
/// Keys are issued by the lifecycle from a monotonic counter and never
/// reused, so the same post may be on screen several times at once (for
/// example as a regular card and as a crossing card).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(pub u64);

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// How a card moves while on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationType {
    Float,
    Static,
    /// Traverses the screen horizontally; outside the placement pool.
    Cross,
}

impl AnimationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Static => "static",
            Self::Cross => "cross",
        }
    }
}

/// A post plus its presentation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: EntityKey,
    pub post: Post,
    pub position: Position,
    /// Degrees, positive is clockwise.
    pub rotation: f64,
    pub animation: AnimationType,
    pub enter_delay: Duration,
    pub is_exiting: bool,
}

impl Entity {
    #[must_use]
    pub fn is_crossing(&self) -> bool {
        self.animation == AnimationType::Cross
    }

    /// True when `post` would render as the same card as this one.
    #[must_use]
    pub fn shows(&self, post: &Post) -> bool {
        self.post.same_content(post)
    }
}
