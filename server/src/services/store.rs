//! In-memory board and post store.
//!
//! DESIGN
//! ======
//! Boards and posts live in two maps behind one `RwLock`. Ids are assigned
//! from monotonically increasing counters. Listings are newest first. At
//! most one board is active at a time; activating a board deactivates all
//! others.

use std::collections::BTreeMap;
use std::sync::Arc;

use events::{Board, BoardId, BoardType, Post, PostId, PostStatus};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::ErrorCode;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("post {0} not found")]
    PostNotFound(PostId),
    #[error("board {0} not found")]
    BoardNotFound(BoardId),
    #[error("no active board")]
    NoActiveBoard,
    #[error("a post needs a message or an image")]
    EmptyPost,
    #[error("board title must not be empty")]
    EmptyTitle,
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PostNotFound(_) => "E_POST_NOT_FOUND",
            Self::BoardNotFound(_) => "E_BOARD_NOT_FOUND",
            Self::NoActiveBoard => "E_NO_ACTIVE_BOARD",
            Self::EmptyPost => "E_EMPTY_POST",
            Self::EmptyTitle => "E_EMPTY_TITLE",
        }
    }
}

// =============================================================================
// INPUTS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
    pub board_id: Option<BoardId>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub board_id: Option<BoardId>,
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    pub title: String,
    #[serde(rename = "type", default = "default_board_type")]
    pub kind: BoardType,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub title_color: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub background_img: Option<String>,
}

fn default_board_type() -> BoardType {
    BoardType::FlyingMessages
}

/// Partial board update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<BoardType>,
    pub background_color: Option<String>,
    pub title_color: Option<String>,
    pub font_family: Option<String>,
    pub background_img: Option<String>,
}

/// Result of a moderation status update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub previous: PostStatus,
    pub post: Post,
}

impl StatusChange {
    /// The post was live on its board and no longer is.
    #[must_use]
    pub fn left_approved(&self) -> bool {
        self.previous == PostStatus::Approved && !self.post.is_approved()
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Default)]
struct Tables {
    boards: BTreeMap<BoardId, Board>,
    posts: BTreeMap<PostId, Post>,
    next_board: BoardId,
    next_post: PostId,
}

#[derive(Clone, Default)]
pub struct Store {
    tables: Arc<RwLock<Tables>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts matching `filter`, newest first.
    pub async fn list_posts(&self, filter: &PostFilter) -> Vec<Post> {
        let tables = self.tables.read().await;
        tables
            .posts
            .values()
            .rev()
            .filter(|p| filter.board_id.is_none_or(|id| p.board_id == id))
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .cloned()
            .collect()
    }

    /// Create a pending post on the given board, or the active one.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyPost`] without message or image,
    /// [`StoreError::BoardNotFound`] / [`StoreError::NoActiveBoard`] when no
    /// target board exists.
    pub async fn create_post(&self, input: NewPost) -> Result<Post, StoreError> {
        let message = non_empty(input.message);
        let image_path = non_empty(input.image_path);
        if message.is_none() && image_path.is_none() {
            return Err(StoreError::EmptyPost);
        }

        let mut tables = self.tables.write().await;
        let board_id = match input.board_id {
            Some(id) if tables.boards.contains_key(&id) => id,
            Some(id) => return Err(StoreError::BoardNotFound(id)),
            None => active_id(&tables).ok_or(StoreError::NoActiveBoard)?,
        };

        tables.next_post += 1;
        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: tables.next_post,
            board_id,
            message,
            nickname: non_empty(input.nickname),
            email: non_empty(input.email),
            image_path,
            status: PostStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    /// Set a post's moderation status and report what it was before.
    ///
    /// # Errors
    ///
    /// [`StoreError::PostNotFound`] for unknown ids.
    pub async fn update_post_status(&self, id: PostId, status: PostStatus) -> Result<StatusChange, StoreError> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.get_mut(&id).ok_or(StoreError::PostNotFound(id))?;
        let previous = post.status;
        post.status = status;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(StatusChange { previous, post: post.clone() })
    }

    /// # Errors
    ///
    /// [`StoreError::PostNotFound`] for unknown ids.
    pub async fn delete_post(&self, id: PostId) -> Result<Post, StoreError> {
        let mut tables = self.tables.write().await;
        tables.posts.remove(&id).ok_or(StoreError::PostNotFound(id))
    }

    /// All boards, newest first, without posts.
    pub async fn list_boards(&self) -> Vec<Board> {
        self.tables.read().await.boards.values().rev().cloned().collect()
    }

    /// Create a board. The first board ever created becomes active.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyTitle`] for a blank title.
    pub async fn create_board(&self, input: NewBoard) -> Result<Board, StoreError> {
        let title = input.title.trim().to_owned();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let mut tables = self.tables.write().await;
        tables.next_board += 1;
        let now = OffsetDateTime::now_utc();
        let board = Board {
            id: tables.next_board,
            title,
            kind: input.kind,
            is_active: tables.boards.is_empty(),
            background_color: input.background_color,
            title_color: input.title_color,
            font_family: input.font_family,
            background_img: input.background_img,
            created_at: now,
            updated_at: now,
            posts: None,
        };
        tables.boards.insert(board.id, board.clone());
        Ok(board)
    }

    /// Board with its approved posts, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::BoardNotFound`] for unknown ids.
    pub async fn board(&self, id: BoardId) -> Result<Board, StoreError> {
        let tables = self.tables.read().await;
        with_approved_posts(&tables, id).ok_or(StoreError::BoardNotFound(id))
    }

    /// The active board with its approved posts.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoActiveBoard`] when none is active.
    pub async fn active_board(&self) -> Result<Board, StoreError> {
        let tables = self.tables.read().await;
        let id = active_id(&tables).ok_or(StoreError::NoActiveBoard)?;
        with_approved_posts(&tables, id).ok_or(StoreError::NoActiveBoard)
    }

    /// # Errors
    ///
    /// [`StoreError::BoardNotFound`] for unknown ids and
    /// [`StoreError::EmptyTitle`] for a blank new title.
    pub async fn update_board(&self, id: BoardId, patch: BoardPatch) -> Result<Board, StoreError> {
        let mut tables = self.tables.write().await;
        let board = tables.boards.get_mut(&id).ok_or(StoreError::BoardNotFound(id))?;
        if let Some(title) = patch.title {
            let title = title.trim().to_owned();
            if title.is_empty() {
                return Err(StoreError::EmptyTitle);
            }
            board.title = title;
        }
        if let Some(kind) = patch.kind {
            board.kind = kind;
        }
        if patch.background_color.is_some() {
            board.background_color = patch.background_color;
        }
        if patch.title_color.is_some() {
            board.title_color = patch.title_color;
        }
        if patch.font_family.is_some() {
            board.font_family = patch.font_family;
        }
        if patch.background_img.is_some() {
            board.background_img = patch.background_img;
        }
        board.updated_at = OffsetDateTime::now_utc();
        Ok(board.clone())
    }

    /// Make `id` the single active board.
    ///
    /// # Errors
    ///
    /// [`StoreError::BoardNotFound`] for unknown ids.
    pub async fn activate_board(&self, id: BoardId) -> Result<Board, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.boards.contains_key(&id) {
            return Err(StoreError::BoardNotFound(id));
        }
        let now = OffsetDateTime::now_utc();
        for board in tables.boards.values_mut() {
            let active = board.id == id;
            if board.is_active != active {
                board.is_active = active;
                board.updated_at = now;
            }
        }
        with_approved_posts(&tables, id).ok_or(StoreError::BoardNotFound(id))
    }
}

fn active_id(tables: &Tables) -> Option<BoardId> {
    tables.boards.values().find(|b| b.is_active).map(|b| b.id)
}

fn with_approved_posts(tables: &Tables, id: BoardId) -> Option<Board> {
    let mut board = tables.boards.get(&id)?.clone();
    let posts = tables
        .posts
        .values()
        .rev()
        .filter(|p| p.board_id == id && p.status == PostStatus::Approved)
        .cloned()
        .collect();
    board.posts = Some(posts);
    Some(board)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
