//! Shared numeric constants for the layout crate.
//!
//! Positions and sizes are percentages of the viewport. Durations are in
//! milliseconds.

// ── Viewport ────────────────────────────────────────────────────

/// Lowest `top`/`left` a placed card may take.
pub const INSET_MIN: f64 = 10.0;

/// Width of the safe band on each axis; candidates fall in
/// `[INSET_MIN, INSET_MIN + INSET_SPAN)`.
pub const INSET_SPAN: f64 = 70.0;

/// Assumed card footprint used for collision tests.
pub const CARD_WIDTH: f64 = 20.0;
pub const CARD_HEIGHT: f64 = 15.0;

/// Cards are tilted by up to this many degrees either way.
pub const MAX_ROTATION_DEG: f64 = 10.0;

// ── Placement ───────────────────────────────────────────────────

pub const MAX_ATTEMPTS: usize = 50;

/// Minimum center distance while the board is sparse.
pub const MIN_DISTANCE: f64 = 25.0;

/// Relaxed distance once more than [`DENSE_THRESHOLD`] cards are placed.
pub const DENSE_MIN_DISTANCE: f64 = 15.0;
pub const DENSE_THRESHOLD: usize = 8;

pub const GRID_COLS: u32 = 4;
pub const GRID_ROWS: u32 = 3;

/// Fraction of a cell a grid candidate may be nudged by.
pub const GRID_JITTER: f64 = 0.3;

/// Distance a grid cell must keep from every existing card.
pub const GRID_MIN_DISTANCE: f64 = 15.0;

// ── Lifecycle ───────────────────────────────────────────────────

pub const POP_DELAY_MIN_MS: u64 = 3000;
pub const POP_DELAY_JITTER_MS: u64 = 2000;

/// Time on screen before a card starts fading.
pub const DISPLAY_MS: u64 = 20_000;

/// Fade-out window between exit and removal.
pub const FADE_MS: u64 = 1000;

/// Cooldown before an exhausted queue is refilled from the live set.
pub const REFILL_COOLDOWN_MS: u64 = 5000;

pub const FLOAT_CHANCE: f64 = 0.7;

// ── Crossing ────────────────────────────────────────────────────

pub const CROSS_INTERVAL_MS: u64 = 10_000;
pub const CROSS_CHANCE: f64 = 0.25;
pub const MAX_CROSSING: usize = 2;
pub const CROSS_LIFETIME_MIN_MS: u64 = 12_000;
pub const CROSS_LIFETIME_MAX_MS: u64 = 20_000;

/// Crossing cards enter from the left viewport edge.
pub const CROSS_START_LEFT: f64 = 0.0;
