//! Collision-aware card placement.
//!
//! DESIGN
//! ======
//! A placement runs in three bounded phases:
//!
//! 1. Random search. Up to `max_attempts` uniform candidates inside the safe
//!    inset. A candidate is accepted when its center keeps the distance
//!    threshold to every existing card and its box overlaps none of theirs.
//!    The threshold relaxes once the board is dense.
//! 2. Grid fallback. A coarse `cols × rows` grid over the same inset, each
//!    cell nudged by up to `grid_jitter` of its size, scanned row-major. The
//!    first cell whose center keeps `grid_min_distance` from every card wins.
//!    Boxes are not checked here.
//! 3. Unconstrained. One more uniform draw, accepted unconditionally.
//!
//! There is no error path. Under extreme density the result may overlap an
//! existing card, which is an accepted outcome.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use rand::Rng;

use crate::consts::{
    DENSE_MIN_DISTANCE, DENSE_THRESHOLD, GRID_COLS, GRID_JITTER, GRID_MIN_DISTANCE, GRID_ROWS,
    INSET_MIN, INSET_SPAN, MAX_ATTEMPTS, MAX_ROTATION_DEG, MIN_DISTANCE,
};
use crate::geometry::Position;

// =============================================================================
// OPTIONS
// =============================================================================

/// Tuning knobs for [`place`]. Defaults follow the board's standard layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementOptions {
    pub max_attempts: usize,
    pub min_distance: f64,
    pub dense_min_distance: f64,
    /// More than this many existing cards switches to `dense_min_distance`.
    pub dense_threshold: usize,
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub grid_jitter: f64,
    pub grid_min_distance: f64,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            min_distance: MIN_DISTANCE,
            dense_min_distance: DENSE_MIN_DISTANCE,
            dense_threshold: DENSE_THRESHOLD,
            grid_cols: GRID_COLS,
            grid_rows: GRID_ROWS,
            grid_jitter: GRID_JITTER,
            grid_min_distance: GRID_MIN_DISTANCE,
        }
    }
}

impl PlacementOptions {
    /// Distance threshold for the random phase with `existing` cards on screen.
    #[must_use]
    pub fn effective_min_distance(&self, existing: usize) -> f64 {
        if existing > self.dense_threshold {
            self.dense_min_distance
        } else {
            self.min_distance
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Which phase produced a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementSource {
    /// Accepted on the `attempts`-th random candidate (1-based).
    Random { attempts: usize },
    /// Accepted at grid cell `(row, col)`.
    Grid { row: u32, col: u32 },
    /// Every constrained candidate failed.
    Unconstrained,
}

/// A chosen position plus how it was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Position,
    pub source: PlacementSource,
    /// Grid cells examined before the result (0 when the random phase won).
    pub grid_checks: u32,
}

// =============================================================================
// SEARCH
// =============================================================================

/// Find a position for a new card among `existing` ones.
#[must_use]
pub fn find_position<R: Rng + ?Sized>(existing: &[Position], opts: &PlacementOptions, rng: &mut R) -> Position {
    place(existing, opts, rng).position
}

/// Like [`find_position`], but reports which phase produced the result.
#[must_use]
pub fn place<R: Rng + ?Sized>(existing: &[Position], opts: &PlacementOptions, rng: &mut R) -> Placement {
    let threshold = opts.effective_min_distance(existing.len());

    for attempt in 1..=opts.max_attempts {
        let candidate = random_position(rng);
        if is_clear(candidate, existing, threshold) {
            return Placement {
                position: candidate,
                source: PlacementSource::Random { attempts: attempt },
                grid_checks: 0,
            };
        }
    }

    let cell_width = INSET_SPAN / f64::from(opts.grid_cols);
    let cell_height = INSET_SPAN / f64::from(opts.grid_rows);
    let mut grid_checks = 0;

    for row in 0..opts.grid_rows {
        for col in 0..opts.grid_cols {
            grid_checks += 1;
            let left = INSET_MIN + f64::from(col) * cell_width + rng.random::<f64>() * cell_width * opts.grid_jitter;
            let top = INSET_MIN + f64::from(row) * cell_height + rng.random::<f64>() * cell_height * opts.grid_jitter;
            let candidate = Position { top, left };

            let too_close = existing
                .iter()
                .any(|pos| candidate.distance(*pos) < opts.grid_min_distance);
            if !too_close {
                return Placement { position: candidate, source: PlacementSource::Grid { row, col }, grid_checks };
            }
        }
    }

    Placement { position: random_position(rng), source: PlacementSource::Unconstrained, grid_checks }
}

fn is_clear(candidate: Position, existing: &[Position], threshold: f64) -> bool {
    let bounds = candidate.bounds();
    existing
        .iter()
        .all(|pos| candidate.distance(*pos) > threshold && !bounds.overlaps(&pos.bounds()))
}

// =============================================================================
// RANDOM HELPERS
// =============================================================================

/// Uniform position inside the safe inset.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Position {
    let top = INSET_MIN + rng.random::<f64>() * INSET_SPAN;
    let left = INSET_MIN + rng.random::<f64>() * INSET_SPAN;
    Position { top, left }
}

/// Uniform tilt in `[-MAX_ROTATION_DEG, MAX_ROTATION_DEG)`.
pub fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random::<f64>() * 2.0 * MAX_ROTATION_DEG - MAX_ROTATION_DEG
}
