//! Process-wide owner of the realtime connection.
//!
//! DESIGN
//! ======
//! A [`SocketManager`] is a cheap `Clone` over shared state, so every
//! subscriber in the process talks to the same connection. At most one
//! connection exists at a time and at most one attempt is in flight:
//! concurrent [`SocketManager::get_socket`] calls all await the same shared
//! future. Attempts are spaced at least `throttle` apart; a failed attempt
//! resets the throttle so the next caller may retry at once.
//!
//! Listener registrations live in the manager, not the connection, so they
//! survive disconnects and reconnects. Callbacks run on the link's reader
//! task against a snapshot of the registry, and a panicking callback is
//! caught and logged without affecting the others.
//!
//! RECONNECT POLICY
//! ================
//! The first attempt makes one try plus `reconnect_attempts` retries spaced
//! by `reconnect_delay`, cycling through the configured transports on every
//! try under `handshake_timeout`. When an established link drops for any
//! reason other than a manual [`SocketManager::disconnect`], the manager
//! schedules `reconnect_attempts` further tries in the background.

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use events::{ClientEvent, Envelope, ServerEvent, WireMessage};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::{ChannelConfig, TransportKind};
use crate::error::{ChannelError, TransportError};
use crate::transport::{self, Link, LinkEvent, REASON_TRANSPORT_CLOSE, Transport};

/// Callback for `message` events.
pub type MessageCallback = Arc<dyn Fn(&WireMessage) + Send + Sync>;
/// Callback for connect and disconnect notifications.
pub type StatusCallback = Arc<dyn Fn() + Send + Sync>;

type PendingConnect = Shared<BoxFuture<'static, Result<SocketHandle, ChannelError>>>;

// =============================================================================
// TYPES
// =============================================================================

/// Identity of the current connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketHandle {
    pub sid: String,
    pub transport: TransportKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    pub transport: Option<TransportKind>,
}

impl ConnectionStatus {
    /// Transport name, or `N/A` while disconnected.
    #[must_use]
    pub fn transport_name(&self) -> &'static str {
        self.transport.map_or("N/A", TransportKind::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Initial,
    Reconnect,
}

#[derive(Debug, Clone, Copy)]
enum StatusKind {
    Connect,
    Disconnect,
}

struct LiveLink {
    sid: String,
    kind: TransportKind,
    outbound: mpsc::UnboundedSender<Envelope>,
    epoch: u64,
    reader: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    link: Option<LiveLink>,
    pending: Option<PendingConnect>,
    last_attempt: Option<Instant>,
    manual: bool,
    /// Bumped by `disconnect`; an attempt started under an older session
    /// discards whatever link it produces.
    session: u64,
    epoch: u64,
}

#[derive(Default)]
struct Listeners {
    messages: HashMap<String, Vec<MessageCallback>>,
    connect: Vec<StatusCallback>,
    disconnect: Vec<StatusCallback>,
}

struct Inner {
    config: ChannelConfig,
    transports: Vec<Arc<dyn Transport>>,
    state: Mutex<State>,
    listeners: Mutex<Listeners>,
}

#[derive(Clone)]
pub struct SocketManager {
    inner: Arc<Inner>,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl SocketManager {
    /// Manager using the stock transports named in `config.transports`.
    #[must_use]
    pub fn new(config: ChannelConfig) -> Self {
        let transports = transport::for_kinds(&config.transports);
        Self::with_transports(config, transports)
    }

    /// Manager using caller-supplied transports, tried in order.
    #[must_use]
    pub fn with_transports(config: ChannelConfig, transports: Vec<Arc<dyn Transport>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transports,
                state: Mutex::new(State::default()),
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.inner.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

impl SocketManager {
    /// Return the live connection, joining or starting an attempt if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::ConnectFailed`] once every try is exhausted and
    /// [`ChannelError::Cancelled`] if [`Self::disconnect`] ran meanwhile.
    pub async fn get_socket(&self) -> Result<SocketHandle, ChannelError> {
        let pending = {
            let mut state = self.state();
            if let Some(link) = &state.link {
                return Ok(SocketHandle { sid: link.sid.clone(), transport: link.kind });
            }
            if let Some(pending) = &state.pending {
                pending.clone()
            } else {
                state.manual = false;
                let pending = self.start_connect(state.session, Schedule::Initial);
                state.pending = Some(pending.clone());
                pending
            }
        };
        pending.await
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().link.is_some()
    }

    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        let state = self.state();
        ConnectionStatus {
            is_connected: state.link.is_some(),
            transport: state.link.as_ref().map(|link| link.kind),
        }
    }

    /// Close the connection without scheduling a reconnect. A later
    /// [`Self::get_socket`] connects again.
    pub fn disconnect(&self) {
        let link = {
            let mut state = self.state();
            state.manual = true;
            state.session += 1;
            state.pending = None;
            state.link.take()
        };
        let Some(link) = link else {
            return;
        };
        info!(sid = %link.sid, "channel: disconnecting");
        link.reader.abort();
        drop(link.outbound);
        self.notify_status(StatusKind::Disconnect);
    }

    /// Remove every listener, then disconnect.
    pub fn cleanup(&self) {
        {
            let mut listeners = self.listeners();
            listeners.messages.clear();
            listeners.connect.clear();
            listeners.disconnect.clear();
        }
        self.disconnect();
    }

    /// Send `event` with `data`, connecting first if needed. Failures are
    /// logged and reported as `false`.
    pub async fn emit(&self, event: &str, data: Value) -> bool {
        if let Err(e) = self.get_socket().await {
            warn!(event, error = %e, "channel: emit failed, no connection");
            return false;
        }
        let envelope = Envelope::new(event, data);
        let sent = self
            .state()
            .link
            .as_ref()
            .is_some_and(|link| link.outbound.send(envelope).is_ok());
        if !sent {
            warn!(event, "channel: emit failed, connection dropped");
        }
        sent
    }

    /// Send a typed client event.
    pub async fn emit_event(&self, event: &ClientEvent) -> bool {
        let envelope = event.to_envelope();
        self.emit(&envelope.event, envelope.data).await
    }

    fn start_connect(&self, session: u64, schedule: Schedule) -> PendingConnect {
        let manager = self.clone();
        let task = tokio::spawn(async move { manager.establish(session, schedule).await });
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(ChannelError::Task(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    async fn establish(self, session: u64, schedule: Schedule) -> Result<SocketHandle, ChannelError> {
        let wait = {
            let state = self.state();
            state
                .last_attempt
                .map(|last| (last + self.inner.config.throttle).saturating_duration_since(Instant::now()))
        };
        if let Some(wait) = wait.filter(|w| !w.is_zero()) {
            info!(wait = ?wait, "channel: throttling connection attempt");
            sleep(wait).await;
        }
        self.state().last_attempt = Some(Instant::now());
        info!(base_url = %self.inner.config.base_url, ?schedule, "channel: connecting");

        let result = self.connect_with_retries(schedule).await;

        let mut state = self.state();
        if state.session != session {
            debug!("channel: discarding connection attempt after disconnect");
            return Err(ChannelError::Cancelled);
        }
        state.pending = None;

        match result {
            Ok(link) => {
                let Link { sid, kind, outbound, inbound } = link;
                state.epoch += 1;
                let epoch = state.epoch;
                let reader = tokio::spawn(self.clone().read_link(inbound, epoch));
                state.link = Some(LiveLink { sid: sid.clone(), kind, outbound, epoch, reader });
                drop(state);

                info!(%sid, transport = %kind, "channel: connected");
                self.notify_status(StatusKind::Connect);
                Ok(SocketHandle { sid, transport: kind })
            }
            Err(e) => {
                state.last_attempt = None;
                drop(state);
                warn!(error = %e, "channel: connection failed");
                Err(e)
            }
        }
    }

    async fn connect_with_retries(&self, schedule: Schedule) -> Result<Link, ChannelError> {
        let config = &self.inner.config;
        let attempts = match schedule {
            Schedule::Initial => config.reconnect_attempts + 1,
            Schedule::Reconnect => config.reconnect_attempts,
        };

        let mut last = TransportError::NoTransports;
        for attempt in 1..=attempts {
            if attempt > 1 || schedule == Schedule::Reconnect {
                sleep(config.reconnect_delay).await;
            }
            match self.try_transports().await {
                Ok(link) => return Ok(link),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "channel: connection attempt failed");
                    last = e;
                }
            }
        }
        Err(ChannelError::ConnectFailed { attempts, last })
    }

    async fn try_transports(&self) -> Result<Link, TransportError> {
        let config = &self.inner.config;
        let mut last = TransportError::NoTransports;
        for transport in &self.inner.transports {
            match timeout(config.handshake_timeout, transport.open(config)).await {
                Ok(Ok(link)) => return Ok(link),
                Ok(Err(e)) => {
                    debug!(transport = %transport.kind(), error = %e, "channel: transport failed");
                    last = e;
                }
                Err(_) => {
                    debug!(transport = %transport.kind(), "channel: transport handshake timed out");
                    last = TransportError::Timeout(config.handshake_timeout);
                }
            }
        }
        Err(last)
    }

    async fn read_link(self, mut inbound: mpsc::UnboundedReceiver<LinkEvent>, epoch: u64) {
        let reason = loop {
            match inbound.recv().await {
                Some(LinkEvent::Message(envelope)) => self.dispatch(&envelope),
                Some(LinkEvent::Closed(reason)) => break reason,
                None => break REASON_TRANSPORT_CLOSE.to_owned(),
            }
        };
        self.handle_closed(epoch, &reason);
    }

    fn handle_closed(&self, epoch: u64, reason: &str) {
        let reconnect = {
            let mut state = self.state();
            if state.link.as_ref().is_none_or(|link| link.epoch != epoch) {
                return;
            }
            state.link = None;
            state.pending = None;
            (!state.manual).then_some(state.session)
        };

        info!(reason, "channel: disconnected");
        self.notify_status(StatusKind::Disconnect);

        if let Some(session) = reconnect {
            self.schedule_reconnect(session);
        }
    }

    fn schedule_reconnect(&self, session: u64) {
        let pending = {
            let mut state = self.state();
            if state.session != session || state.link.is_some() || state.pending.is_some() {
                return;
            }
            let pending = self.start_connect(session, Schedule::Reconnect);
            state.pending = Some(pending.clone());
            pending
        };
        tokio::spawn(async move {
            if let Err(e) = pending.await {
                warn!(error = %e, "channel: gave up reconnecting");
            }
        });
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

impl SocketManager {
    /// Register a `message` callback under a subscriber id.
    pub fn add_message_listener(&self, id: impl Into<String>, callback: MessageCallback) {
        self.listeners().messages.entry(id.into()).or_default().push(callback);
    }

    /// Remove one callback; the id disappears once its last callback goes.
    pub fn remove_message_listener(&self, id: &str, callback: &MessageCallback) {
        let mut listeners = self.listeners();
        let Some(callbacks) = listeners.messages.get_mut(id) else {
            return;
        };
        callbacks.retain(|c| !Arc::ptr_eq(c, callback));
        if callbacks.is_empty() {
            listeners.messages.remove(id);
        }
    }

    /// Register a connect callback. Runs immediately if already connected.
    pub fn add_connection_listener(&self, callback: StatusCallback) {
        self.listeners().connect.push(Arc::clone(&callback));
        if self.is_connected() {
            guarded("connect", || callback());
        }
    }

    pub fn remove_connection_listener(&self, callback: &StatusCallback) {
        self.listeners().connect.retain(|c| !Arc::ptr_eq(c, callback));
    }

    pub fn add_disconnection_listener(&self, callback: StatusCallback) {
        self.listeners().disconnect.push(callback);
    }

    pub fn remove_disconnection_listener(&self, callback: &StatusCallback) {
        self.listeners().disconnect.retain(|c| !Arc::ptr_eq(c, callback));
    }

    /// Number of subscriber ids with at least one message callback.
    #[must_use]
    pub fn message_subscriber_count(&self) -> usize {
        self.listeners().messages.len()
    }

    fn dispatch(&self, envelope: &Envelope) {
        match ServerEvent::from_envelope(envelope) {
            Ok(ServerEvent::Message(message)) => {
                let callbacks: Vec<MessageCallback> =
                    self.listeners().messages.values().flatten().cloned().collect();
                for callback in callbacks {
                    guarded("message", || callback(&message));
                }
            }
            Ok(ServerEvent::Connected { sid }) => {
                debug!(%sid, "channel: ignoring repeated connected envelope");
            }
            Err(e) => warn!(event = %envelope.event, error = %e, "channel: undecodable server event"),
        }
    }

    fn notify_status(&self, kind: StatusKind) {
        let callbacks = {
            let listeners = self.listeners();
            match kind {
                StatusKind::Connect => listeners.connect.clone(),
                StatusKind::Disconnect => listeners.disconnect.clone(),
            }
        };
        let label = match kind {
            StatusKind::Connect => "connect",
            StatusKind::Disconnect => "disconnect",
        };
        for callback in callbacks {
            guarded(label, || callback());
        }
    }
}

fn guarded(listener: &'static str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!(listener, "channel: listener panicked");
    }
}
