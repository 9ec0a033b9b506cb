//! Bridges a board's channel events into its lifecycle scheduler.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use std::sync::Arc;

use events::{BoardId, ClientEvent, EventType, Post, PostId, WireMessage};
use layout::BoardScheduler;
use tracing::{debug, info, warn};

use crate::manager::SocketManager;
use crate::subscription::Subscription;

/// What a board viewer should do with one channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedAction {
    /// Add or replace a live post.
    Push(Post),
    /// Drop a post that is no longer approved.
    Withdraw(PostId),
    Ignore,
}

/// Decide how a message affects the viewer of `board_id`.
#[must_use]
pub fn route(message: &WireMessage, board_id: BoardId) -> FeedAction {
    let post = match message.kind {
        EventType::NewApprovedPost | EventType::PostStatusUpdated => match message.post() {
            Ok(post) => post,
            Err(e) => {
                warn!(kind = message.kind.as_str(), error = %e, "channel: malformed post payload");
                return FeedAction::Ignore;
            }
        },
        _ => return FeedAction::Ignore,
    };
    if post.board_id != board_id {
        return FeedAction::Ignore;
    }

    match message.kind {
        EventType::NewApprovedPost if post.is_approved() => FeedAction::Push(post),
        EventType::PostStatusUpdated if !post.is_approved() => FeedAction::Withdraw(post.id),
        _ => FeedAction::Ignore,
    }
}

/// Live feed for one board. Joins `board-{id}` on every connect and forwards
/// approvals and withdrawals to the scheduler until dropped.
pub struct BoardFeed {
    board_id: BoardId,
    subscription: Subscription,
}

impl BoardFeed {
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn attach(manager: &SocketManager, board_id: BoardId, scheduler: Arc<BoardScheduler>) -> Self {
        let rejoin = manager.clone();
        let subscription = Subscription::builder(manager)
            .on_message(move |message| match route(message, board_id) {
                FeedAction::Push(post) => {
                    debug!(board_id, post_id = post.id, "channel: approved post arrived");
                    scheduler.push_approved(post);
                }
                FeedAction::Withdraw(post_id) => {
                    debug!(board_id, post_id, "channel: post withdrawn");
                    scheduler.withdraw(post_id);
                }
                FeedAction::Ignore => {}
            })
            .on_connect(move || {
                let manager = rejoin.clone();
                tokio::spawn(async move {
                    if manager.emit_event(&ClientEvent::JoinBoard(board_id)).await {
                        info!(board_id, "channel: joined board room");
                    }
                });
            })
            .build();
        Self { board_id, subscription }
    }

    #[must_use]
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Leave the board room. The feed stops receiving once dropped.
    pub async fn leave(&self) -> bool {
        self.subscription.leave_board(self.board_id).await
    }
}
