//! Error types for the board/ship model.

use crate::board::Coord;
use crate::ship::{Orientation, ShipKind};

/// Errors produced by placement validation and shot resolution.
///
/// These are expected rule violations, not defects: callers branch on them
/// and report the rejection back to the offending client. No state is
/// mutated when one of these is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    /// A coordinate lies outside the 10×10 grid.
    #[error("coordinate ({x}, {y}) is out of bounds")]
    OutOfBounds { x: u8, y: u8 },

    /// A ship cell is already occupied by another ship.
    #[error("cell {0} overlaps an existing ship")]
    Overlap(Coord),

    /// The ship's cell count does not match its declared kind.
    #[error("{kind} requires {expected} cells, got {got}")]
    LengthMismatch {
        kind: ShipKind,
        expected: usize,
        got: usize,
    },

    /// The cells do not form a straight, contiguous line in the
    /// declared orientation.
    #[error("ship cells are not a contiguous {0} line")]
    Misaligned(Orientation),

    /// The target cell has already been shot at. Resolving the same
    /// coordinate twice is rejected so hit counters can never drift.
    #[error("cell {0} was already targeted")]
    AlreadyTargeted(Coord),
}
