//! Connected-player directory for Armada.
//!
//! Tracks who is currently connected (id, name, color, availability),
//! enforces case-insensitive name uniqueness among connected players,
//! holds pending match invitations, and owns each player's outbound
//! push channel.
//!
//! # Concurrency note
//!
//! `PlayerDirectory` is not thread-safe by itself — it is a plain-map
//! registry owned by the server and guarded by a single higher-level
//! mutex. Registration and invitation traffic is rare compared to shot
//! traffic, which is scoped to per-match locks, so registry-wide
//! granularity is fine.

mod directory;
mod error;

pub use directory::{Invitation, Outbound, Player, PlayerDirectory};
pub use error::DirectoryError;
