//! Match lifecycle for Armada: the placement-then-combat state machine,
//! the registry of live matches, and the per-match turn timer.
//!
//! # Key types
//!
//! - [`Match`] — one game between two players; owns both boards, the
//!   turn holder, and the generation-guarded turn timer
//! - [`MatchRegistry`] — creates/looks up/removes matches and maintains
//!   the player→match index
//! - [`MatchConfig`] — turn timeout and fleet composition
//! - [`MatchPhase`] — `Placing → InProgress → Finished`
//!
//! # Concurrency model
//!
//! Each match is guarded by its own `tokio::sync::Mutex`; `place_ships`,
//! `fire_shot`, `force_timeout`, and `forfeit` hold it for their full
//! duration, so a timeout callback and a client-driven shot are strictly
//! ordered by lock acquisition. A timeout callback that was already
//! queued when a shot rescheduled the timer observes a
//! `timer_generation` mismatch under the lock and becomes a no-op.

mod combat;
mod config;
mod error;
mod registry;

pub use combat::{Match, ShotReport};
pub use config::{MatchConfig, MatchPhase};
pub use error::MatchError;
pub use registry::MatchRegistry;
