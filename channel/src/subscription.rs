//! Per-call-site listener registration.
//!
//! A [`Subscription`] registers its callbacks with the shared
//! [`SocketManager`] under a unique `hook-{uuid}` id and removes exactly
//! those callbacks when dropped. Independent subscribers never share or
//! clobber each other's registrations.

#[cfg(test)]
#[path = "subscription_test.rs"]
mod subscription_test;

use std::sync::Arc;
use std::time::Duration;

use events::{BoardId, ClientEvent, WireMessage};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::manager::{MessageCallback, SocketManager, StatusCallback};

/// Delay before a new subscription triggers the shared connection, so that a
/// burst of subscribers created together only starts one attempt.
pub const CONNECT_DEBOUNCE: Duration = Duration::from_millis(100);

pub struct SubscriptionBuilder {
    manager: SocketManager,
    on_message: Option<MessageCallback>,
    on_connect: Option<StatusCallback>,
    on_disconnect: Option<StatusCallback>,
    auto_connect: bool,
}

impl SubscriptionBuilder {
    #[must_use]
    pub fn on_message(mut self, f: impl Fn(&WireMessage) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_disconnect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    /// Whether to start the shared connection after [`CONNECT_DEBOUNCE`].
    /// Defaults to `true`.
    #[must_use]
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.auto_connect = enabled;
        self
    }

    /// Register the callbacks. Must be called inside a tokio runtime when
    /// `auto_connect` is enabled.
    #[must_use]
    pub fn build(self) -> Subscription {
        let id = format!("hook-{}", Uuid::new_v4().simple());
        let manager = self.manager;

        if let Some(callback) = &self.on_message {
            manager.add_message_listener(id.clone(), Arc::clone(callback));
        }
        if let Some(callback) = &self.on_connect {
            manager.add_connection_listener(Arc::clone(callback));
        }
        if let Some(callback) = &self.on_disconnect {
            manager.add_disconnection_listener(Arc::clone(callback));
        }

        let connect_task = self.auto_connect.then(|| {
            let manager = manager.clone();
            let id = id.clone();
            tokio::spawn(async move {
                sleep(CONNECT_DEBOUNCE).await;
                if let Err(e) = manager.get_socket().await {
                    warn!(%id, error = %e, "channel: subscriber could not connect");
                }
            })
        });

        debug!(%id, "channel: subscriber registered");
        Subscription {
            id,
            manager,
            on_message: self.on_message,
            on_connect: self.on_connect,
            on_disconnect: self.on_disconnect,
            connect_task,
        }
    }
}

/// Listener guard with room and messaging helpers.
pub struct Subscription {
    id: String,
    manager: SocketManager,
    on_message: Option<MessageCallback>,
    on_connect: Option<StatusCallback>,
    on_disconnect: Option<StatusCallback>,
    connect_task: Option<JoinHandle<()>>,
}

impl Subscription {
    #[must_use]
    pub fn builder(manager: &SocketManager) -> SubscriptionBuilder {
        SubscriptionBuilder {
            manager: manager.clone(),
            on_message: None,
            on_connect: None,
            on_disconnect: None,
            auto_connect: true,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn manager(&self) -> &SocketManager {
        &self.manager
    }

    pub async fn join_admin(&self) -> bool {
        self.manager.emit_event(&ClientEvent::JoinAdmin).await
    }

    pub async fn join_board(&self, board_id: BoardId) -> bool {
        self.manager.emit_event(&ClientEvent::JoinBoard(board_id)).await
    }

    pub async fn leave_board(&self, board_id: BoardId) -> bool {
        self.manager.emit_event(&ClientEvent::LeaveBoard(board_id)).await
    }

    pub async fn send_message(&self, message: WireMessage) -> bool {
        self.manager.emit_event(&ClientEvent::Message(message)).await
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// `websocket`, `polling`, or `N/A`.
    #[must_use]
    pub fn transport(&self) -> &'static str {
        self.manager.connection_status().transport_name()
    }

    /// Disconnect the shared connection for every subscriber.
    pub fn disconnect(&self) {
        self.manager.disconnect();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        if let Some(callback) = &self.on_message {
            self.manager.remove_message_listener(&self.id, callback);
        }
        if let Some(callback) = &self.on_connect {
            self.manager.remove_connection_listener(callback);
        }
        if let Some(callback) = &self.on_disconnect {
            self.manager.remove_disconnection_listener(callback);
        }
        debug!(id = %self.id, "channel: subscriber released");
    }
}
