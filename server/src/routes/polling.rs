//! HTTP long-polling transport for the realtime channel.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use events::{Envelope, ServerEvent};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::polling::{self, PollError};
use crate::services::session::{self, REASON_CLIENT_DISCONNECT, REASON_TRANSPORT_CLOSE};
use crate::state::AppState;

/// `POST {path}/poll`: open a session and return the `connected` envelope.
pub async fn open(State(state): State<AppState>) -> Json<Envelope> {
    let (sid, rx) = session::open(&state, "polling").await;
    state.polls.insert(sid, rx);
    Json(ServerEvent::Connected { sid: sid.to_string() }.to_envelope())
}

/// `GET {path}/poll/{sid}`: wait for queued envelopes.
pub async fn poll(State(state): State<AppState>, Path(sid): Path<Uuid>) -> Result<Json<Vec<Envelope>>, ApiError> {
    let rx = state.polls.touch(sid)?;
    let batch = {
        let mut rx = rx.lock().await;
        polling::next_batch(&mut rx, state.config.poll_wait).await
    };
    if let Some(batch) = batch {
        state.polls.touch(sid)?;
        return Ok(Json(batch));
    }
    state.polls.remove(sid);
    session::close(&state, sid, REASON_TRANSPORT_CLOSE).await;
    Err(PollError::UnknownSession(sid).into())
}

/// `POST {path}/poll/{sid}`: accept a batch of client envelopes.
pub async fn push(State(state): State<AppState>, Path(sid): Path<Uuid>, body: String) -> Result<StatusCode, ApiError> {
    state.polls.touch(sid)?;
    let batch = Envelope::decode_batch(&body)?;
    for envelope in &batch {
        if let Err(e) = session::handle_envelope(&state, sid, envelope).await {
            warn!(connection_id = %sid, error = %e, "polling: ignoring client envelope");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE {path}/poll/{sid}`: close the session.
pub async fn close(State(state): State<AppState>, Path(sid): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if !state.polls.remove(sid) {
        return Err(PollError::UnknownSession(sid).into());
    }
    session::close(&state, sid, REASON_CLIENT_DISCONNECT).await;
    Ok(StatusCode::NO_CONTENT)
}
