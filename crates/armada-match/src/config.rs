//! Match configuration and phase state machine.

use std::time::Duration;

/// Configuration shared by every match a registry creates.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// How long the turn holder may think before the turn is forfeited
    /// as an automatic miss.
    pub turn_timeout: Duration,

    /// Required fleet composition: ship counts per kind, indexed by
    /// length (`fleet[0]` = 1-cell patrol boats … `fleet[3]` =
    /// 4-cell carriers). `None` accepts any non-empty layout.
    pub fleet: Option<[u8; 4]>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(30),
            fleet: Some([4, 3, 2, 1]),
        }
    }
}

/// The lifecycle phase of a match.
///
/// Transitions are strictly ordered and `Finished` is terminal:
///
/// ```text
/// Placing → InProgress → Finished
///    │                       ▲
///    └──────(forfeit)────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Both players are placing ships.
    Placing,
    /// Combat: players alternate shots under the turn timer.
    InProgress,
    /// A winner has been declared. No transition leaves this phase.
    Finished,
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placing => write!(f, "Placing"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
