//! The 10×10 board: cell states, placement, and shot resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::ship::{Ship, ShipPlacement};

/// Board side length. Every board is `BOARD_SIZE × BOARD_SIZE`.
pub const BOARD_SIZE: u8 = 10;

/// A position on the board, 0-indexed in both axes.
///
/// [`Coord::new`] enforces bounds, but values arriving from the wire are
/// deserialized unchecked, so the board re-validates on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Column, 0–9.
    pub x: u8,
    /// Row, 0–9.
    pub y: u8,
}

impl Coord {
    pub fn new(x: u8, y: u8) -> Result<Self, GameError> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(GameError::OutOfBounds { x, y });
        }
        Ok(Self { x, y })
    }

    pub fn in_bounds(self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The state of a single board cell.
///
/// Transitions are monotonic and one-directional:
///
/// ```text
/// Empty ──(placement)──→ Occupied ──(shot)──→ HitDamaged ──(last cell)──→ HitSunk
///   │
///   └──(shot)──→ HitEmpty            (terminal)
/// ```
///
/// No other transition is legal; [`Board::apply_shot`] rejects anything
/// that would revisit a hit cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    /// No ship, never shot at.
    Empty,
    /// Part of an un-hit ship.
    Occupied,
    /// Shot at, was empty.
    HitEmpty,
    /// Shot at, ship damaged but still afloat.
    HitDamaged,
    /// Part of a fully sunk ship.
    HitSunk,
}

impl CellState {
    /// Whether a shot has already been resolved at this cell.
    pub fn is_targeted(self) -> bool {
        matches!(self, Self::HitEmpty | Self::HitDamaged | Self::HitSunk)
    }
}

/// What a resolved shot produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    /// The cell was empty.
    Water,
    /// A ship was damaged but not sunk.
    Hit,
    /// The shot sank the ship it hit.
    Sunk,
}

/// One player's grid plus their placed ships and sunk-ship counter.
///
/// Owned exclusively by one match; all mutation goes through
/// [`place_ship`](Self::place_ship) and [`apply_shot`](Self::apply_shot).
#[derive(Debug, Clone)]
pub struct Board {
    cells: [[CellState; BOARD_SIZE as usize]; BOARD_SIZE as usize],
    ships: Vec<Ship>,
    sunk_ships: usize,
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[CellState::Empty; BOARD_SIZE as usize]; BOARD_SIZE as usize],
            ships: Vec::new(),
            sunk_ships: 0,
        }
    }

    /// The state of a single cell. Caller guarantees bounds.
    pub fn cell(&self, coord: Coord) -> CellState {
        self.cells[coord.y as usize][coord.x as usize]
    }

    fn set_cell(&mut self, coord: Coord, state: CellState) {
        self.cells[coord.y as usize][coord.x as usize] = state;
    }

    /// Validates and places one ship, marking its cells `Occupied`.
    ///
    /// Rejects a layout that is out of range, overlaps an existing ship,
    /// or whose geometry disagrees with its declared kind/orientation.
    /// On error the board is unchanged.
    pub fn place_ship(&mut self, placement: ShipPlacement) -> Result<(), GameError> {
        placement.validate_geometry()?;

        for &coord in &placement.cells {
            if !coord.in_bounds() {
                return Err(GameError::OutOfBounds {
                    x: coord.x,
                    y: coord.y,
                });
            }
            if self.cell(coord) != CellState::Empty {
                return Err(GameError::Overlap(coord));
            }
        }

        for &coord in &placement.cells {
            self.set_cell(coord, CellState::Occupied);
        }
        self.ships.push(Ship::from_placement(placement));
        Ok(())
    }

    /// Resolves a shot at `coord`.
    ///
    /// Already-targeted cells are rejected with no side effects, which
    /// keeps repeated shots idempotent and the hit counters exact. A hit
    /// that fills a ship's last cell rewrites the whole ship to `HitSunk`
    /// and bumps the sunk-ship counter.
    pub fn apply_shot(&mut self, coord: Coord) -> Result<ShotOutcome, GameError> {
        if !coord.in_bounds() {
            return Err(GameError::OutOfBounds {
                x: coord.x,
                y: coord.y,
            });
        }

        match self.cell(coord) {
            CellState::HitEmpty | CellState::HitDamaged | CellState::HitSunk => {
                Err(GameError::AlreadyTargeted(coord))
            }
            CellState::Empty => {
                self.set_cell(coord, CellState::HitEmpty);
                Ok(ShotOutcome::Water)
            }
            CellState::Occupied => {
                // Occupied implies exactly one ship covers this cell —
                // place_ship forbids overlap.
                let idx = self
                    .ships
                    .iter()
                    .position(|s| s.covers(coord))
                    .expect("occupied cell belongs to a ship");

                self.ships[idx].hits_received += 1;
                if self.ships[idx].is_sunk() {
                    let cells = self.ships[idx].cells.clone();
                    for cell in cells {
                        self.set_cell(cell, CellState::HitSunk);
                    }
                    self.sunk_ships += 1;
                    Ok(ShotOutcome::Sunk)
                } else {
                    self.set_cell(coord, CellState::HitDamaged);
                    Ok(ShotOutcome::Hit)
                }
            }
        }
    }

    /// True iff every placed ship has been sunk. Only meaningful once
    /// placement is complete.
    pub fn all_ships_sunk(&self) -> bool {
        self.sunk_ships == self.ships.len()
    }

    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    pub fn sunk_ship_count(&self) -> usize {
        self.sunk_ships
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Full-detail snapshot for the board's owner.
    pub fn own_view(&self) -> BoardView {
        BoardView {
            cells: self
                .cells
                .iter()
                .map(|row| row.to_vec())
                .collect(),
        }
    }

    /// Snapshot for the opponent: intact ship cells are masked as
    /// `Empty` so un-hit positions never leak onto the wire.
    pub fn opponent_view(&self) -> BoardView {
        BoardView {
            cells: self
                .cells
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|&cell| match cell {
                            CellState::Occupied => CellState::Empty,
                            other => other,
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// A serializable snapshot of a board, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub cells: Vec<Vec<CellState>>,
}
