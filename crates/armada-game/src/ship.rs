//! Ship kinds, orientations, and placement layouts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Coord;
use crate::error::GameError;

/// The kind of a ship. Each kind has a fixed length; the placement
/// validator rejects a layout whose cell count disagrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipKind {
    /// 1 cell.
    PatrolBoat,
    /// 2 cells.
    Destroyer,
    /// 3 cells.
    Submarine,
    /// 4 cells.
    Carrier,
}

impl ShipKind {
    /// The number of cells a ship of this kind occupies.
    pub fn length(self) -> usize {
        match self {
            Self::PatrolBoat => 1,
            Self::Destroyer => 2,
            Self::Submarine => 3,
            Self::Carrier => 4,
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PatrolBoat => "patrol boat",
            Self::Destroyer => "destroyer",
            Self::Submarine => "submarine",
            Self::Carrier => "carrier",
        };
        write!(f, "{name}")
    }
}

/// The axis a ship lies along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

/// A ship layout as submitted by a client: kind, orientation, and the
/// ordered list of cells it should occupy.
///
/// This is the wire-side shape. [`Board::place_ship`](crate::Board::place_ship)
/// validates it and converts it into a live [`Ship`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub kind: ShipKind,
    pub orientation: Orientation,
    pub cells: Vec<Coord>,
}

impl ShipPlacement {
    /// Checks the layout's own geometry: cell count matches the kind,
    /// and the cells form a straight, contiguous line in the declared
    /// orientation (reading in list order).
    ///
    /// Board-dependent checks (bounds, overlap) happen during placement.
    pub fn validate_geometry(&self) -> Result<(), GameError> {
        let expected = self.kind.length();
        if self.cells.len() != expected {
            return Err(GameError::LengthMismatch {
                kind: self.kind,
                expected,
                got: self.cells.len(),
            });
        }

        for pair in self.cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            // Checked: coordinates come off the wire unvalidated, so a
            // cell at u8::MAX must read as misaligned, not overflow.
            let contiguous = match self.orientation {
                Orientation::Horizontal => b.y == a.y && a.x.checked_add(1) == Some(b.x),
                Orientation::Vertical => b.x == a.x && a.y.checked_add(1) == Some(b.y),
            };
            if !contiguous {
                return Err(GameError::Misaligned(self.orientation));
            }
        }

        Ok(())
    }
}

/// A placed ship: its layout plus the number of hits it has taken.
///
/// `hits_received` is incremented exactly once per distinct shot — the
/// board rejects repeated shots at the same cell before they reach the
/// ship, so the counter can never exceed the ship's length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub kind: ShipKind,
    pub orientation: Orientation,
    pub cells: Vec<Coord>,
    pub hits_received: usize,
}

impl Ship {
    pub(crate) fn from_placement(placement: ShipPlacement) -> Self {
        Self {
            kind: placement.kind,
            orientation: placement.orientation,
            cells: placement.cells,
            hits_received: 0,
        }
    }

    /// The number of cells this ship occupies.
    pub fn length(&self) -> usize {
        self.cells.len()
    }

    /// Sunk iff every cell has been hit.
    pub fn is_sunk(&self) -> bool {
        self.hits_received == self.cells.len()
    }

    /// Whether this ship occupies the given cell.
    pub fn covers(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }
}
