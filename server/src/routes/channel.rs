//! WebSocket transport for the realtime channel.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register the connection → send `connected` with its sid
//! 2. `select!` loop: client envelopes → session handling; room broadcasts
//!    queued for this connection → socket
//! 3. Close → leave every room → rate-limited disconnect log

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use events::{Envelope, ServerEvent};
use tokio::sync::mpsc;
use tracing::debug;

use crate::rooms::ConnectionId;
use crate::services::session::{self, REASON_CLIENT_DISCONNECT, REASON_TRANSPORT_CLOSE, REASON_TRANSPORT_ERROR};
use crate::state::AppState;

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let (sid, mut rx) = session::open(&state, "websocket").await;

    let hello = ServerEvent::Connected { sid: sid.to_string() }.to_envelope();
    let reason = if send_envelope(&mut socket, &hello).await.is_err() {
        REASON_TRANSPORT_ERROR
    } else {
        relay(&mut socket, &state, sid, &mut rx).await
    };

    session::close(&state, sid, reason).await;
}

async fn relay(
    socket: &mut WebSocket,
    state: &AppState,
    sid: ConnectionId,
    rx: &mut mpsc::Receiver<Envelope>,
) -> &'static str {
    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => session::handle_text(state, sid, text.as_str()).await,
                Some(Ok(Message::Close(_))) => return REASON_CLIENT_DISCONNECT,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(connection_id = %sid, error = %e, "channel: websocket read failed");
                    return REASON_TRANSPORT_ERROR;
                }
                None => return REASON_TRANSPORT_CLOSE,
            },
            Some(envelope) = rx.recv() => {
                if send_envelope(socket, &envelope).await.is_err() {
                    return REASON_TRANSPORT_ERROR;
                }
            }
        }
    }
}

async fn send_envelope(socket: &mut WebSocket, envelope: &Envelope) -> Result<(), axum::Error> {
    socket.send(Message::Text(envelope.encode().into())).await
}
