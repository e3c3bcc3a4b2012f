//! Board and ship model for Armada.
//!
//! This crate is pure data + validation: the 10×10 grid of cell states,
//! the ship entities that know their cells and hit counts, placement
//! validation, and shot resolution. No I/O, no clocks, no locking —
//! everything concurrent lives a layer up in `armada-match`.
//!
//! # Key types
//!
//! - [`Board`] — one player's grid plus their placed ships
//! - [`Ship`] / [`ShipPlacement`] — a placed ship and its wire-side layout
//! - [`CellState`] — the per-square classification driving win detection
//! - [`ShotOutcome`] — what a resolved shot produced (water, hit, sunk)

mod board;
mod error;
mod ship;

pub use board::{BOARD_SIZE, Board, BoardView, CellState, Coord, ShotOutcome};
pub use error::GameError;
pub use ship::{Orientation, Ship, ShipKind, ShipPlacement};
