//! Rate-limited connection count logging.
//!
//! DESIGN
//! ======
//! Tracks the number of live channel connections and logs changes without
//! flooding the log under churn. A connect is logged when more than
//! [`LOG_INTERVAL`] has passed since the last logged line or when the new
//! count is `1 (mod 20)`. A disconnect is logged under the same interval or
//! when the new count is `0 (mod 20)`, except that transport-level closes
//! are never logged since they are routine page reloads and network blips.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::info;
use uuid::Uuid;

pub const LOG_INTERVAL: Duration = Duration::from_millis(5000);
const LOG_EVERY: usize = 20;

/// Disconnect reasons that are never logged.
pub const QUIET_REASONS: [&str; 2] = ["transport close", "transport error"];

#[derive(Default)]
struct LogInner {
    count: usize,
    last_log: Option<Instant>,
}

#[derive(Clone, Default)]
pub struct ConnectionLog {
    inner: Arc<Mutex<LogInner>>,
}

impl ConnectionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().count
    }

    /// Record a new connection. Returns whether it was logged.
    pub fn connected(&self, id: Uuid, transport: &str) -> bool {
        self.connected_at(id, transport, Instant::now())
    }

    fn connected_at(&self, id: Uuid, transport: &str, now: Instant) -> bool {
        let mut inner = self.lock();
        inner.count += 1;
        let due = interval_elapsed(inner.last_log, now) || inner.count % LOG_EVERY == 1;
        if due {
            inner.last_log = Some(now);
            info!(connection_id = %id, transport, count = inner.count, "server: client connected");
        }
        due
    }

    /// Record a closed connection. Returns whether it was logged.
    pub fn disconnected(&self, id: Uuid, reason: &str) -> bool {
        self.disconnected_at(id, reason, Instant::now())
    }

    fn disconnected_at(&self, id: Uuid, reason: &str, now: Instant) -> bool {
        let mut inner = self.lock();
        inner.count = inner.count.saturating_sub(1);
        if QUIET_REASONS.contains(&reason) {
            return false;
        }
        let due = interval_elapsed(inner.last_log, now) || inner.count % LOG_EVERY == 0;
        if due {
            inner.last_log = Some(now);
            info!(connection_id = %id, reason, count = inner.count, "server: client disconnected");
        }
        due
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn interval_elapsed(last: Option<Instant>, now: Instant) -> bool {
    last.is_none_or(|last| now.saturating_duration_since(last) > LOG_INTERVAL)
}

#[cfg(test)]
#[path = "conn_log_test.rs"]
mod tests;
