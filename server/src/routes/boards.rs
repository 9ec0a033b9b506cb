//! Board endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use events::{Board, BoardId, EventType, WireMessage};

use crate::error::ApiError;
use crate::services::broadcast;
use crate::services::store::{BoardPatch, NewBoard};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<Vec<Board>> {
    Json(state.store.list_boards().await)
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewBoard>,
) -> Result<(StatusCode, Json<Board>), ApiError> {
    let board = state.store.create_board(input).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// The active board with its approved posts.
pub async fn active(State(state): State<AppState>) -> Result<Json<Board>, ApiError> {
    Ok(Json(state.store.active_board().await?))
}

/// A board with its approved posts.
pub async fn get(State(state): State<AppState>, Path(id): Path<BoardId>) -> Result<Json<Board>, ApiError> {
    Ok(Json(state.store.board(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<BoardId>,
    Json(patch): Json<BoardPatch>,
) -> Result<Json<Board>, ApiError> {
    let board = state.store.update_board(id, patch).await?;
    let message = WireMessage::with_board(EventType::BoardUpdate, &board);
    broadcast::emit_to_board(&state.rooms, id, &message).await;
    broadcast::emit_to_admin(&state.rooms, &message).await;
    Ok(Json(board))
}

/// Make this the single active board and tell every client.
pub async fn activate(State(state): State<AppState>, Path(id): Path<BoardId>) -> Result<Json<Board>, ApiError> {
    let board = state.store.activate_board(id).await?;
    broadcast::emit_to_all(&state.rooms, &WireMessage::with_board(EventType::BoardUpdate, &board)).await;
    Ok(Json(board))
}
