//! Core protocol types for Armada's wire format.
//!
//! Every message on the wire is an [`Envelope`] around either a
//! [`ClientMessage`] (client → server) or a [`ServerMessage`]
//! (server → client). The enums are internally tagged
//! (`#[serde(tag = "type")]`) so the JSON carries an explicit message
//! kind alongside its payload fields.

use serde::{Deserialize, Serialize};

use std::fmt;

use armada_game::{BoardView, Coord, ShipPlacement, ShotOutcome};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a registered player.
///
/// Newtype over `u64`; `#[serde(transparent)]` makes it serialize as a
/// plain number so a `PlayerId(42)` is just `42` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a match (one game between two players).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// Public profile of a registered player, as shown in player listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Register under a display name. Names are unique (case-insensitive)
    /// among currently connected players.
    Register { name: String, color: String },

    /// Ask for the list of available opponents.
    RequestPlayers,

    /// Invite another player to a match.
    ProposeMatch { invitee_id: PlayerId },

    /// Accept the pending invitation addressed to this player.
    AcceptMatch,

    /// Reject the pending invitation addressed to this player.
    RejectMatch,

    /// Submit this player's full ship layout for the current match.
    PlaceShips { ships: Vec<ShipPlacement> },

    /// Fire at the opponent's board. Only legal while holding the turn.
    FireShot { x: u8, y: u8 },

    /// Orderly goodbye. Equivalent to dropping the connection: an
    /// in-progress match is forfeited.
    Disconnect,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Messages the server sends to clients, both as direct replies and as
/// unsolicited pushes (every match event goes to both participants).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    // -- Registration and lobby --
    /// Registration succeeded.
    Registered { player: PlayerInfo },
    /// Registration rejected: the name is taken.
    NameTaken { reason: String },
    /// The current list of available opponents.
    PlayerList { players: Vec<PlayerInfo> },
    /// Nobody else is available right now.
    NoPlayersAvailable,

    // -- Invitations --
    /// Pushed to the invitee when someone proposes a match.
    InvitationReceived {
        requester_id: PlayerId,
        requester_name: String,
    },
    /// The invitation was accepted; a match now exists.
    MatchAccepted {
        match_id: MatchId,
        opponent: PlayerInfo,
    },
    /// The invitation was rejected or cancelled.
    MatchRejected { reason: String },

    // -- Match lifecycle --
    /// The match has been created; both players should place ships.
    MatchStarted { match_id: MatchId },
    /// This player's layout was accepted.
    ShipsAccepted,
    /// Waiting for the opponent to finish placing.
    WaitingOpponentShips,
    /// Both layouts are in; combat begins.
    BothReady,

    // -- Turns and shots --
    /// A new turn began for `player_id` (also announces the coin-flip
    /// winner when combat starts).
    TurnStarted { player_id: PlayerId },
    /// The turn holder changed to `player_id`.
    TurnChanged { player_id: PlayerId },
    /// `player_id` let their turn expire; treated as an automatic miss.
    TurnTimeout { player_id: PlayerId },
    /// Resolution of the most recent shot.
    ShotResult {
        shooter_id: PlayerId,
        coord: Coord,
        outcome: ShotOutcome,
    },
    /// Post-shot snapshots from the recipient's perspective: their own
    /// board in full, the opponent's with intact ships masked.
    BoardsUpdated {
        own: BoardView,
        opponent: BoardView,
    },

    // -- Match end --
    /// Pushed to the winner.
    MatchWon { winner_id: PlayerId },
    /// Pushed to the loser.
    MatchLost { winner_id: PlayerId },
    /// The other player forfeited or disconnected.
    MatchAbandoned { abandoner_id: PlayerId },

    // -- Errors --
    /// A rejected action, reported only to the offending connection.
    Error { message: String },
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every message on the wire is an
/// `Envelope` around a client or server message.
///
/// Each side maintains its own `seq` counter so missing or reordered
/// messages are detectable; `timestamp` is milliseconds since the
/// sender's process start, for debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<M> {
    pub seq: u64,
    pub timestamp: u64,
    pub body: M,
}

// =========================================================================
// Tests
// =========================================================================
