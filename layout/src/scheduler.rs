//! Tokio driver for a board's [`Lifecycle`].
//!
//! DESIGN
//! ======
//! One spawned task owns the lifecycle outright. Inputs arrive on an mpsc
//! command queue; the task sleeps until the lifecycle's next deadline or the
//! next command, whichever comes first, and publishes a [`Snapshot`] on a
//! watch channel after every step. Nothing else holds the state, so no locks
//! are needed and every read-modify-write happens on that one task.
//!
//! Dropping the [`BoardScheduler`] aborts the task, which cancels every
//! pending pop, exit, removal, refill and crossing timer at once.

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;

use events::{Post, PostId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::entity::Entity;
use crate::lifecycle::{Lifecycle, LifecycleConfig};
use crate::placement::PlacementOptions;

// =============================================================================
// TYPES
// =============================================================================

/// Read-only view of the board published after every step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// On-screen entities in insertion order.
    pub entities: Vec<Entity>,
    pub live_posts: usize,
    pub queued: usize,
}

enum Command {
    SetPosts(Vec<Post>),
    PushApproved(Post),
    Withdraw(PostId),
    SpawnCrossing(Post),
}

/// Handle to a running board lifecycle task.
pub struct BoardScheduler {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

// =============================================================================
// HANDLE
// =============================================================================

impl BoardScheduler {
    /// Spawn a scheduler seeded from the OS RNG. Must be called inside a
    /// tokio runtime.
    #[must_use]
    pub fn spawn(config: LifecycleConfig, placement: PlacementOptions) -> Self {
        Self::spawn_with_rng(config, placement, StdRng::from_os_rng())
    }

    /// Spawn a scheduler with an explicit RNG.
    #[must_use]
    pub fn spawn_with_rng<R>(config: LifecycleConfig, placement: PlacementOptions, rng: R) -> Self
    where
        R: Rng + Send + 'static,
    {
        let (commands, rx) = mpsc::unbounded_channel();
        let (tx, snapshots) = watch::channel(Snapshot::default());
        let lifecycle = Lifecycle::new(config, placement, rng, Instant::now().into_std());
        info!(display = ?config.display, "layout: board scheduler started");
        let task = tokio::spawn(run(lifecycle, rx, tx));
        Self { commands, snapshots, task }
    }

    /// Replace the live post set.
    pub fn set_posts(&self, posts: Vec<Post>) {
        self.send(Command::SetPosts(posts));
    }

    /// Feed a newly approved post.
    pub fn push_approved(&self, post: Post) {
        self.send(Command::PushApproved(post));
    }

    /// Drop a post that is no longer approved.
    pub fn withdraw(&self, post_id: PostId) {
        self.send(Command::Withdraw(post_id));
    }

    /// Put `post` on screen as a crossing entity right away.
    pub fn spawn_crossing(&self, post: Post) {
        self.send(Command::SpawnCrossing(post));
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("layout: scheduler task gone, command dropped");
        }
    }
}

impl Drop for BoardScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// TASK
// =============================================================================

async fn run<R: Rng>(
    mut lifecycle: Lifecycle<R>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    tx: watch::Sender<Snapshot>,
) {
    loop {
        let deadline = lifecycle.next_deadline();
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                apply(&mut lifecycle, command, Instant::now().into_std());
            }
            () = wait_until(deadline) => {
                for event in lifecycle.advance(Instant::now().into_std()) {
                    debug!(?event, "layout: lifecycle event");
                }
            }
        }
        tx.send_replace(snapshot_of(&lifecycle));
    }
    info!("layout: board scheduler stopped");
}

fn apply<R: Rng>(lifecycle: &mut Lifecycle<R>, command: Command, now: std::time::Instant) {
    match command {
        Command::SetPosts(posts) => {
            info!(count = posts.len(), "layout: live posts replaced");
            lifecycle.set_posts(posts, now);
        }
        Command::PushApproved(post) => {
            let post_id = post.id;
            if lifecycle.push_approved(post, now) {
                info!(post_id, "layout: approved post added");
            } else {
                debug!(post_id, "layout: ignoring post that is not approved");
            }
        }
        Command::Withdraw(post_id) => {
            if lifecycle.withdraw(post_id, now) {
                info!(post_id, "layout: post withdrawn");
            }
        }
        Command::SpawnCrossing(post) => {
            lifecycle.spawn_crossing(post, now);
        }
    }
}

async fn wait_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}

fn snapshot_of<R>(lifecycle: &Lifecycle<R>) -> Snapshot
where
    R: Rng,
{
    Snapshot {
        entities: lifecycle.displayed().to_vec(),
        live_posts: lifecycle.posts().len(),
        queued: lifecycle.queued(),
    }
}
