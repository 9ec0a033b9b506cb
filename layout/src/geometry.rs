#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::{CARD_HEIGHT, CARD_WIDTH};

/// Top-left corner of a card, in viewport percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

impl Position {
    #[must_use]
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f64 {
        (self.left - other.left).hypot(self.top - other.top)
    }

    /// Bounding box of a card placed here.
    #[must_use]
    pub fn bounds(self) -> Bounds {
        Bounds {
            top: self.top,
            left: self.left,
            right: self.left + CARD_WIDTH,
            bottom: self.top + CARD_HEIGHT,
        }
    }
}

/// Axis-aligned card box. Only used for collision tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    /// Two boxes are clear of each other when one lies entirely to the
    /// left, right, above, or below the other. Touching edges count as
    /// overlapping.
    #[must_use]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(self.right < other.left
            || other.right < self.left
            || self.bottom < other.top
            || other.bottom < self.top)
    }
}
