//! Client side of the message wall's realtime channel.
//!
//! A single [`SocketManager`] per process owns the one transport connection
//! to the server and fans inbound events out to any number of independent
//! subscribers. Subscribers register through [`Subscription`] guards that
//! deregister themselves on drop, and board viewers bridge channel events
//! into a [`layout::BoardScheduler`] with a [`BoardFeed`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`manager`] | Connection coalescing, throttle, reconnect, listener registry |
//! | [`transport`] | Websocket and HTTP long-polling transports behind one trait |
//! | [`subscription`] | Per-call-site listener guard with room helpers |
//! | [`feed`] | Routes board events into the lifecycle scheduler |
//! | [`api`] | HTTP client for boards and posts |
//! | [`config`] | Connection settings and environment overrides |
//! | [`error`] | Error types |

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod manager;
pub mod subscription;
pub mod transport;

pub use api::{ApiClient, ApiError, NewPost};
pub use config::{ChannelConfig, TransportKind};
pub use error::{ChannelError, TransportError};
pub use feed::{BoardFeed, FeedAction};
pub use manager::{ConnectionStatus, MessageCallback, SocketHandle, SocketManager, StatusCallback};
pub use subscription::{Subscription, SubscriptionBuilder};

#[cfg(test)]
mod test_support;
