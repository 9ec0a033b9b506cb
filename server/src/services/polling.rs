//! Long-polling session bookkeeping.
//!
//! DESIGN
//! ======
//! A polling client has no socket to drain its outbound queue, so the queue
//! receiver is parked here between requests, keyed by session id. Each
//! `GET` locks the receiver, waits up to the configured window for the first
//! envelope, then drains whatever else is already queued. `last_seen` is
//! refreshed at the start and end of every request; the reaper closes
//! sessions that stay quiet past the idle timeout.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use events::Envelope;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::services::session;
use crate::state::AppState;

const MIN_REAP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PollError {
    #[error("unknown polling session {0}")]
    UnknownSession(Uuid),
}

impl ErrorCode for PollError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSession(_) => "E_UNKNOWN_SESSION",
        }
    }
}

pub type SharedReceiver = Arc<AsyncMutex<mpsc::Receiver<Envelope>>>;

struct PollSession {
    rx: SharedReceiver,
    last_seen: Instant,
}

#[derive(Clone, Default)]
pub struct PollSessions {
    inner: Arc<Mutex<HashMap<Uuid, PollSession>>>,
}

impl PollSessions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, rx: mpsc::Receiver<Envelope>) {
        self.lock().insert(id, PollSession { rx: Arc::new(AsyncMutex::new(rx)), last_seen: Instant::now() });
    }

    /// Mark a session as alive and return its queue.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::UnknownSession`] if the session is gone.
    pub fn touch(&self, id: Uuid) -> Result<SharedReceiver, PollError> {
        self.touch_at(id, Instant::now())
    }

    fn touch_at(&self, id: Uuid, now: Instant) -> Result<SharedReceiver, PollError> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id).ok_or(PollError::UnknownSession(id))?;
        session.last_seen = now;
        Ok(Arc::clone(&session.rx))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return sessions idle longer than `idle`.
    pub fn take_expired(&self, idle: Duration) -> Vec<Uuid> {
        self.take_expired_at(idle, Instant::now())
    }

    fn take_expired_at(&self, idle: Duration, now: Instant) -> Vec<Uuid> {
        let mut sessions = self.lock();
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, s)| now.saturating_duration_since(s.last_seen) > idle)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, PollSession>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wait up to `wait` for the first envelope, then drain the queue.
/// Returns `None` once the connection has been closed.
pub async fn next_batch(rx: &mut mpsc::Receiver<Envelope>, wait: Duration) -> Option<Vec<Envelope>> {
    match timeout(wait, rx.recv()).await {
        Err(_) => Some(Vec::new()),
        Ok(None) => None,
        Ok(Some(first)) => {
            let mut batch = vec![first];
            while let Ok(next) = rx.try_recv() {
                batch.push(next);
            }
            Some(batch)
        }
    }
}

/// Spawn the idle-session reaper. Returns a handle for shutdown.
pub fn spawn_reaper(state: AppState) -> JoinHandle<()> {
    let idle = state.config.poll_idle_timeout;
    let period = (idle / 2).max(MIN_REAP_INTERVAL);
    info!(idle = ?idle, period = ?period, "polling: session reaper configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            for id in state.polls.take_expired(idle) {
                session::close(&state, id, session::REASON_PING_TIMEOUT).await;
            }
        }
    })
}

#[cfg(test)]
#[path = "polling_test.rs"]
mod tests;
