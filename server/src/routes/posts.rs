//! Post endpoints.
//!
//! Every moderation change is mirrored onto the realtime channel. New
//! submissions and status changes go to the admin room. Approvals go to the
//! post's board room as `NEW_APPROVED_POST`. A post that leaves the approved
//! set, by a status change or by deletion, is announced to its board room as
//! `POST_STATUS_UPDATED` so viewers withdraw it. A deleted post is reported
//! there with status `REJECTED`.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use events::{BoardId, CodecError, EventType, Post, PostId, PostStatus, WireMessage};
use serde::Deserialize;

use crate::error::ApiError;
use crate::services::broadcast;
use crate::services::store::{NewPost, PostFilter, StatusChange};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    pub board_id: Option<String>,
    pub status: Option<String>,
}

impl PostQuery {
    fn filter(&self) -> Result<PostFilter, CodecError> {
        let board_id = self
            .board_id
            .as_deref()
            .map(|raw| raw.trim().parse::<BoardId>().map_err(|_| CodecError::InvalidBoardId(raw.to_owned())))
            .transpose()?;
        let status = self.status.as_deref().map(str::parse::<PostStatus>).transpose()?;
        Ok(PostFilter { board_id, status })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: PostStatus,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<PostQuery>) -> Result<Json<Vec<Post>>, ApiError> {
    let filter = query.filter()?;
    Ok(Json(state.store.list_posts(&filter).await))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.store.create_post(input).await?;
    broadcast::emit_to_admin(&state.rooms, &WireMessage::with_post(EventType::NewPost, &post)).await;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Post>, ApiError> {
    let change = state.store.update_post_status(id, update.status).await?;
    let post = &change.post;
    broadcast::emit_to_admin(&state.rooms, &WireMessage::with_post(EventType::PostStatusUpdated, post)).await;
    if let Some(message) = board_notice(&change) {
        broadcast::emit_to_board(&state.rooms, post.board_id, &message).await;
    }
    Ok(Json(change.post))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<PostId>) -> Result<StatusCode, ApiError> {
    let post = state.store.delete_post(id).await?;
    if let Some(message) = withdrawal_notice(&post) {
        broadcast::emit_to_board(&state.rooms, post.board_id, &message).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Board-room message for a status change, if viewers need one.
fn board_notice(change: &StatusChange) -> Option<WireMessage> {
    if change.post.is_approved() {
        Some(WireMessage::with_post(EventType::NewApprovedPost, &change.post))
    } else if change.left_approved() {
        Some(WireMessage::with_post(EventType::PostStatusUpdated, &change.post))
    } else {
        None
    }
}

/// Board-room message for a deleted post. Only approved posts were live.
fn withdrawal_notice(deleted: &Post) -> Option<WireMessage> {
    deleted.is_approved().then(|| {
        let withdrawn = Post { status: PostStatus::Rejected, ..deleted.clone() };
        WireMessage::with_post(EventType::PostStatusUpdated, &withdrawn)
    })
}

#[cfg(test)]
#[path = "posts_test.rs"]
mod tests;
