//! Error types for the player directory.

use armada_protocol::PlayerId;

/// Errors that can occur during directory operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// Another connected player already uses this name
    /// (case-insensitive).
    #[error("the name \"{0}\" is already taken")]
    NameTaken(String),

    /// The name is empty or whitespace-only.
    #[error("player name cannot be empty")]
    InvalidName,

    /// No connected player has this id.
    #[error("no connected player with id {0}")]
    NotFound(PlayerId),

    /// The invitee is in a match or otherwise unavailable.
    #[error("player {0} is not available")]
    InviteeUnavailable(PlayerId),

    /// The invitee already has a pending invitation. At most one is
    /// allowed per invitee at any time.
    #[error("player {0} already has a pending invitation")]
    InviteeHasPendingInvite(PlayerId),

    /// A player cannot invite themselves.
    #[error("cannot invite yourself")]
    SelfInvite,

    /// Accept/reject with no invitation addressed to this player.
    #[error("no pending invitation for player {0}")]
    NoPendingInvite(PlayerId),
}
