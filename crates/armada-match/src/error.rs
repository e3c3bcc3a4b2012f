//! Error types for the match layer.

use armada_game::GameError;
use armada_protocol::{MatchId, PlayerId};

use crate::MatchPhase;

/// Errors that can occur during match operations.
///
/// Everything here is an expected rule violation reported back to the
/// offending client; none of these mutate match state.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The player is already indexed to a live match.
    #[error("player {0} is already in a match")]
    AlreadyInMatch(PlayerId),

    /// No live match with this id.
    #[error("no match with id {0}")]
    NotFound(MatchId),

    /// The player is not indexed to any live match.
    #[error("player {0} is not in a match")]
    NotInMatch(PlayerId),

    /// The player is not one of this match's two participants.
    #[error("player {0} is not a participant of match {1}")]
    NotAParticipant(PlayerId, MatchId),

    /// The operation is not legal in the match's current phase.
    #[error("not legal while the match is {0}")]
    WrongPhase(MatchPhase),

    /// Shot attempted by the player who does not hold the turn.
    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The player already submitted a layout for this match.
    #[error("player {0} has already placed their ships")]
    AlreadyPlaced(PlayerId),

    /// A layout with no ships at all.
    #[error("fleet must contain at least one ship")]
    EmptyFleet,

    /// The layout's per-kind ship counts disagree with the configured
    /// fleet (counts indexed by ship length, 1 through 4).
    #[error("fleet composition mismatch: expected {expected:?}, got {got:?}")]
    FleetMismatch { expected: [u8; 4], got: [u8; 4] },

    /// A board-level rejection (bounds, overlap, geometry, duplicate
    /// shot).
    #[error(transparent)]
    Game(#[from] GameError),
}
