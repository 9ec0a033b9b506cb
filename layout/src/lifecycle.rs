//! Message lifecycle: queue → displayed → exiting → removed.
//!
//! DESIGN
//! ======
//! `Lifecycle` is a plain state machine. Time is passed in explicitly and
//! every delayed transition is a timer in one min-heap, so the whole pipeline
//! can be stepped deterministically in tests and driven by a single tokio task
//! in production (see [`crate::scheduler`]). All mutations go through
//! [`Lifecycle::set_posts`], [`Lifecycle::push_approved`],
//! [`Lifecycle::withdraw`], [`Lifecycle::spawn_crossing`] and
//! [`Lifecycle::advance`].
//!
//! TIMERS
//! ======
//! - `Pop`: take the queue head, skip it if the same content is already on
//!   screen, otherwise place and display it. At most one pop is pending.
//! - `Refill`: reload an exhausted queue from the live set after a cooldown.
//! - `BeginExit` / `Remove`: per-entity fade and removal.
//! - `CrossTick`: periodic chance to spawn a crossing entity.
//!
//! Pop and refill timers carry the generation they were armed in. Changing
//! the live set bumps the generation, so stale ones fire as no-ops. Entity
//! timers look their key up and do nothing when the entity is already gone.
//! A timer's effects are applied at its own deadline, not at the time
//! `advance` happens to be called.

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::time::{Duration, Instant};

use events::{Post, PostId};
use rand::Rng;
use tracing::{debug, info};

use crate::consts::{
    CROSS_CHANCE, CROSS_INTERVAL_MS, CROSS_LIFETIME_MAX_MS, CROSS_LIFETIME_MIN_MS, CROSS_START_LEFT, DISPLAY_MS,
    FADE_MS, FLOAT_CHANCE, INSET_MIN, INSET_SPAN, MAX_CROSSING, POP_DELAY_JITTER_MS, POP_DELAY_MIN_MS,
    REFILL_COOLDOWN_MS,
};
use crate::entity::{AnimationType, Entity, EntityKey};
use crate::geometry::Position;
use crate::placement::{PlacementOptions, place, random_rotation};

const MIN_REPEAT_DELAY: Duration = Duration::from_millis(1);

// =============================================================================
// CONFIG
// =============================================================================

/// Timing and probability knobs for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleConfig {
    /// Pops happen `pop_delay_min + U[0, pop_delay_jitter)` apart.
    pub pop_delay_min: Duration,
    pub pop_delay_jitter: Duration,
    /// Time on screen before the exit transition.
    pub display: Duration,
    /// Time between exit and removal.
    pub fade: Duration,
    pub refill_cooldown: Duration,
    /// Probability a regular card floats rather than staying static.
    pub float_chance: f64,
    pub cross_interval: Duration,
    pub cross_chance: f64,
    pub max_crossing: usize,
    pub cross_lifetime_min: Duration,
    pub cross_lifetime_max: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            pop_delay_min: Duration::from_millis(POP_DELAY_MIN_MS),
            pop_delay_jitter: Duration::from_millis(POP_DELAY_JITTER_MS),
            display: Duration::from_millis(DISPLAY_MS),
            fade: Duration::from_millis(FADE_MS),
            refill_cooldown: Duration::from_millis(REFILL_COOLDOWN_MS),
            float_chance: FLOAT_CHANCE,
            cross_interval: Duration::from_millis(CROSS_INTERVAL_MS),
            cross_chance: CROSS_CHANCE,
            max_crossing: MAX_CROSSING,
            cross_lifetime_min: Duration::from_millis(CROSS_LIFETIME_MIN_MS),
            cross_lifetime_max: Duration::from_millis(CROSS_LIFETIME_MAX_MS),
        }
    }
}

impl LifecycleConfig {
    /// The same pipeline running `factor` times faster.
    #[must_use]
    pub fn scaled(self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            pop_delay_min: self.pop_delay_min / factor,
            pop_delay_jitter: self.pop_delay_jitter / factor,
            display: self.display / factor,
            fade: self.fade / factor,
            refill_cooldown: self.refill_cooldown / factor,
            cross_interval: self.cross_interval / factor,
            cross_lifetime_min: self.cross_lifetime_min / factor,
            cross_lifetime_max: self.cross_lifetime_max / factor,
            ..self
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Transitions reported by [`Lifecycle::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Displayed { key: EntityKey, post_id: PostId },
    /// The queue head duplicated a card already on screen.
    Skipped { post_id: PostId },
    Exiting { key: EntityKey },
    Removed { key: EntityKey },
    CrossSpawned { key: EntityKey, post_id: PostId },
    Refilled { queued: usize },
}

// =============================================================================
// TIMERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TimerKind {
    Pop { generation: u64 },
    Refill { generation: u64 },
    BeginExit(EntityKey),
    Remove(EntityKey),
    CrossTick,
}

/// Ordered by deadline, then by arming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Timer {
    at: Instant,
    seq: u64,
    kind: TimerKind,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

pub struct Lifecycle<R> {
    config: LifecycleConfig,
    placement: PlacementOptions,
    rng: R,
    /// Live approved posts, newest first.
    posts: Vec<Post>,
    queue: VecDeque<Post>,
    /// On-screen entities in insertion order.
    displayed: Vec<Entity>,
    timers: BinaryHeap<Reverse<Timer>>,
    generation: u64,
    next_key: u64,
    next_seq: u64,
}

impl<R: Rng> Lifecycle<R> {
    /// Create an empty pipeline. The crossing tick starts counting at `now`.
    pub fn new(config: LifecycleConfig, placement: PlacementOptions, rng: R, now: Instant) -> Self {
        let mut lifecycle = Self {
            config,
            placement,
            rng,
            posts: Vec::new(),
            queue: VecDeque::new(),
            displayed: Vec::new(),
            timers: BinaryHeap::new(),
            generation: 0,
            next_key: 1,
            next_seq: 0,
        };
        lifecycle.arm(repeat_at(now, config.cross_interval), TimerKind::CrossTick);
        lifecycle
    }

    // -------------------------------------------------------------------------
    // Inputs
    // -------------------------------------------------------------------------

    /// Replace the live set.
    pub fn set_posts(&mut self, posts: Vec<Post>, now: Instant) {
        self.posts = posts;
        self.reinit(now);
    }

    /// Add a newly approved post at the front of the live set, replacing any
    /// post with the same id. Returns `false` for posts that are not approved.
    pub fn push_approved(&mut self, post: Post, now: Instant) -> bool {
        if !post.is_approved() {
            return false;
        }
        self.posts.retain(|p| p.id != post.id);
        self.posts.insert(0, post);
        self.reinit(now);
        true
    }

    /// Drop a post from the live set. Returns `false` if it was not there.
    pub fn withdraw(&mut self, post_id: PostId, now: Instant) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != post_id);
        if self.posts.len() == before {
            return false;
        }
        self.reinit(now);
        true
    }

    /// Put `post` on screen as a crossing entity. Crossing entities skip
    /// duplicate suppression and collision-aware placement.
    pub fn spawn_crossing(&mut self, post: Post, now: Instant) -> EntityKey {
        let key = self.issue_key();
        let top = INSET_MIN + self.rng.random::<f64>() * INSET_SPAN;
        let rotation = random_rotation(&mut self.rng);
        let span = self
            .config
            .cross_lifetime_max
            .saturating_sub(self.config.cross_lifetime_min);
        let lifetime = self.config.cross_lifetime_min + span.mul_f64(self.rng.random::<f64>());

        info!(%key, post_id = post.id, ?lifetime, "layout: crossing message spawned");
        self.displayed.push(Entity {
            key,
            post,
            position: Position { top, left: CROSS_START_LEFT },
            rotation,
            animation: AnimationType::Cross,
            enter_delay: Duration::ZERO,
            is_exiting: false,
        });
        self.arm(now + lifetime, TimerKind::Remove(key));
        key
    }

    // -------------------------------------------------------------------------
    // Clock
    // -------------------------------------------------------------------------

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn advance(&mut self, now: Instant) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while self.timers.peek().is_some_and(|Reverse(t)| t.at <= now) {
            let Some(Reverse(timer)) = self.timers.pop() else {
                break;
            };
            self.fire(timer, &mut events);
        }
        events
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.peek().map(|Reverse(t)| t.at)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn displayed(&self) -> &[Entity] {
        &self.displayed
    }

    #[must_use]
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.displayed.iter().find(|e| e.key == key)
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn crossing_count(&self) -> usize {
        self.displayed.iter().filter(|e| e.is_crossing()).count()
    }

    /// True when a non-crossing entity already shows the same message and
    /// nickname as `post`.
    #[must_use]
    pub fn is_duplicate(&self, post: &Post) -> bool {
        self.displayed.iter().any(|e| !e.is_crossing() && e.shows(post))
    }

    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    fn reinit(&mut self, now: Instant) {
        self.generation += 1;
        self.queue = self.posts.iter().cloned().collect();
        if self.posts.is_empty() {
            debug!("layout: live set empty, queue cleared");
            return;
        }
        self.displayed.clear();
        debug!(queued = self.queue.len(), "layout: queue reinitialized");
        self.arm_pop(now);
    }

    fn fire(&mut self, timer: Timer, events: &mut Vec<LifecycleEvent>) {
        let now = timer.at;
        match timer.kind {
            TimerKind::Pop { generation } if generation == self.generation => self.pop(now, events),
            TimerKind::Refill { generation } if generation == self.generation => {
                self.queue = self.posts.iter().cloned().collect();
                info!(queued = self.queue.len(), "layout: restarting message queue");
                events.push(LifecycleEvent::Refilled { queued: self.queue.len() });
                self.arm_pop(now);
            }
            TimerKind::Pop { .. } | TimerKind::Refill { .. } => {}
            TimerKind::BeginExit(key) => {
                if let Some(entity) = self.displayed.iter_mut().find(|e| e.key == key) {
                    entity.is_exiting = true;
                    debug!(%key, "layout: message exiting");
                    events.push(LifecycleEvent::Exiting { key });
                }
            }
            TimerKind::Remove(key) => {
                let before = self.displayed.len();
                self.displayed.retain(|e| e.key != key);
                if self.displayed.len() < before {
                    debug!(%key, "layout: message removed");
                    events.push(LifecycleEvent::Removed { key });
                }
            }
            TimerKind::CrossTick => {
                self.arm(repeat_at(now, self.config.cross_interval), TimerKind::CrossTick);
                if let Some(event) = self.maybe_spawn_crossing(now) {
                    events.push(event);
                }
            }
        }
    }

    fn pop(&mut self, now: Instant, events: &mut Vec<LifecycleEvent>) {
        let Some(post) = self.queue.pop_front() else {
            return;
        };

        if self.is_duplicate(&post) {
            info!(
                post_id = post.id,
                message = post.message_text(),
                nickname = post.nickname_text(),
                "layout: skipping duplicate message"
            );
            events.push(LifecycleEvent::Skipped { post_id: post.id });
        } else {
            let post_id = post.id;
            let key = self.display(post, now);
            events.push(LifecycleEvent::Displayed { key, post_id });
        }

        if !self.queue.is_empty() {
            self.arm_pop(now);
        } else if !self.posts.is_empty() {
            self.arm(repeat_at(now, self.config.refill_cooldown), TimerKind::Refill { generation: self.generation });
        }
    }

    fn display(&mut self, post: Post, now: Instant) -> EntityKey {
        let existing: Vec<Position> = self
            .displayed
            .iter()
            .filter(|e| !e.is_crossing())
            .map(|e| e.position)
            .collect();
        let placement = place(&existing, &self.placement, &mut self.rng);
        let rotation = random_rotation(&mut self.rng);
        let animation = if self.rng.random::<f64>() < self.config.float_chance {
            AnimationType::Float
        } else {
            AnimationType::Static
        };
        let key = self.issue_key();

        debug!(
            %key,
            post_id = post.id,
            existing = existing.len(),
            top = placement.position.top,
            left = placement.position.left,
            source = ?placement.source,
            animation = animation.as_str(),
            "layout: message displayed"
        );

        self.displayed.push(Entity {
            key,
            post,
            position: placement.position,
            rotation,
            animation,
            enter_delay: Duration::ZERO,
            is_exiting: false,
        });
        self.arm(now + self.config.display, TimerKind::BeginExit(key));
        self.arm(now + self.config.display + self.config.fade, TimerKind::Remove(key));
        key
    }

    fn maybe_spawn_crossing(&mut self, now: Instant) -> Option<LifecycleEvent> {
        if self.posts.is_empty() || self.crossing_count() >= self.config.max_crossing {
            return None;
        }
        if self.rng.random::<f64>() >= self.config.cross_chance {
            return None;
        }
        let index = self.rng.random_range(0..self.posts.len());
        let post = self.posts[index].clone();
        let post_id = post.id;
        let key = self.spawn_crossing(post, now);
        Some(LifecycleEvent::CrossSpawned { key, post_id })
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn arm_pop(&mut self, now: Instant) {
        let delay = self.config.pop_delay_min + self.config.pop_delay_jitter.mul_f64(self.rng.random::<f64>());
        self.arm(repeat_at(now, delay), TimerKind::Pop { generation: self.generation });
    }

    fn arm(&mut self, at: Instant, kind: TimerKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Reverse(Timer { at, seq, kind }));
    }

    fn issue_key(&mut self) -> EntityKey {
        let key = EntityKey(self.next_key);
        self.next_key += 1;
        key
    }
}

/// Deadline for a self-rearming timer. Zero delays are bumped to one
/// millisecond so `advance` always makes progress.
fn repeat_at(now: Instant, delay: Duration) -> Instant {
    now + delay.max(MIN_REPEAT_DELAY)
}
