//! The player directory: registration, availability, and invitations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use armada_protocol::{PlayerId, PlayerInfo, ServerMessage};
use tokio::sync::mpsc;

use crate::DirectoryError;

/// Channel sender for pushing server messages to one player's connection.
///
/// Each connection's writer task drains the receiving end; sends to a
/// disconnected player simply fail and are dropped.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// A connected player's record.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    /// `true` while the player can be invited; flips to `false` when a
    /// match starts and back to `true` when it ends.
    pub available: bool,
}

impl Player {
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// A pending match proposal. Lives until it is accepted, rejected, or a
/// party disconnects — there is no automatic expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    pub requester_id: PlayerId,
    pub invitee_id: PlayerId,
    pub created_at: Instant,
}

struct Entry {
    player: Player,
    sender: Outbound,
}

/// Registry of currently connected players and their pending invitations.
pub struct PlayerDirectory {
    /// Owned id counter — injected state, not a process-wide static.
    next_id: AtomicU64,

    players: HashMap<PlayerId, Entry>,

    /// Lowercased name → player id, kept in sync with `players` to make
    /// the case-insensitive uniqueness check O(1).
    names: HashMap<String, PlayerId>,

    /// Pending invitations keyed by invitee. The key choice enforces the
    /// at-most-one-pending-invitation-per-invitee invariant structurally.
    invitations: HashMap<PlayerId, Invitation>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            players: HashMap::new(),
            names: HashMap::new(),
            invitations: HashMap::new(),
        }
    }

    /// Registers a new player and binds their outbound channel.
    ///
    /// Name uniqueness is case-insensitive and holds only among currently
    /// connected players — a name frees up on disconnect.
    pub fn register(
        &mut self,
        name: &str,
        color: &str,
        sender: Outbound,
    ) -> Result<PlayerInfo, DirectoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DirectoryError::InvalidName);
        }

        let key = name.to_lowercase();
        if self.names.contains_key(&key) {
            return Err(DirectoryError::NameTaken(name.to_string()));
        }

        let id = PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let player = Player {
            id,
            name: name.to_string(),
            color: color.to_string(),
            available: true,
        };
        let info = player.info();

        self.names.insert(key, id);
        self.players.insert(id, Entry { player, sender });

        tracing::info!(player_id = %id, name, "player registered");
        Ok(info)
    }

    /// Removes a player and every invitation they are party to.
    ///
    /// Returns the dropped invitations so the caller can notify the
    /// other parties (a requester should not wait forever on an invitee
    /// who disconnected).
    pub fn unregister(&mut self, player_id: PlayerId) -> Vec<Invitation> {
        let Some(entry) = self.players.remove(&player_id) else {
            return Vec::new();
        };
        self.names.remove(&entry.player.name.to_lowercase());

        let mut dropped = Vec::new();
        if let Some(inv) = self.invitations.remove(&player_id) {
            dropped.push(inv);
        }
        self.invitations.retain(|_, inv| {
            if inv.requester_id == player_id {
                dropped.push(inv.clone());
                false
            } else {
                true
            }
        });

        tracing::info!(player_id = %player_id, name = entry.player.name, "player unregistered");
        dropped
    }

    /// Players that can currently be invited, optionally excluding the
    /// caller.
    pub fn list_available(&self, excluding: Option<PlayerId>) -> Vec<PlayerInfo> {
        let mut players: Vec<PlayerInfo> = self
            .players
            .values()
            .filter(|e| e.player.available && Some(e.player.id) != excluding)
            .map(|e| e.player.info())
            .collect();
        players.sort_by_key(|p| p.id.0);
        players
    }

    pub fn set_available(&mut self, player_id: PlayerId, available: bool) {
        if let Some(entry) = self.players.get_mut(&player_id) {
            entry.player.available = available;
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id).map(|e| &e.player)
    }

    /// A clone of the player's outbound channel, if they are connected.
    pub fn sender(&self, player_id: PlayerId) -> Option<Outbound> {
        self.players.get(&player_id).map(|e| e.sender.clone())
    }

    /// Pushes a message to one player, silently dropping it if they are
    /// gone.
    pub fn push(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(entry) = self.players.get(&player_id) {
            let _ = entry.sender.send(msg);
        }
    }

    /// Creates a pending invitation from `requester_id` to `invitee_id`.
    pub fn propose(
        &mut self,
        requester_id: PlayerId,
        invitee_id: PlayerId,
    ) -> Result<Invitation, DirectoryError> {
        if requester_id == invitee_id {
            return Err(DirectoryError::SelfInvite);
        }
        let invitee = self
            .players
            .get(&invitee_id)
            .map(|e| &e.player)
            .ok_or(DirectoryError::NotFound(invitee_id))?;
        if !invitee.available {
            return Err(DirectoryError::InviteeUnavailable(invitee_id));
        }
        if self.invitations.contains_key(&invitee_id) {
            return Err(DirectoryError::InviteeHasPendingInvite(invitee_id));
        }

        let invitation = Invitation {
            requester_id,
            invitee_id,
            created_at: Instant::now(),
        };
        self.invitations.insert(invitee_id, invitation.clone());
        tracing::debug!(
            requester = %requester_id,
            invitee = %invitee_id,
            "invitation created"
        );
        Ok(invitation)
    }

    /// Accepts the pending invitation addressed to `invitee_id`,
    /// removing it.
    pub fn accept(&mut self, invitee_id: PlayerId) -> Result<Invitation, DirectoryError> {
        self.invitations
            .remove(&invitee_id)
            .ok_or(DirectoryError::NoPendingInvite(invitee_id))
    }

    /// Rejects the pending invitation addressed to `invitee_id`,
    /// removing it.
    pub fn reject(&mut self, invitee_id: PlayerId) -> Result<Invitation, DirectoryError> {
        self.invitations
            .remove(&invitee_id)
            .ok_or(DirectoryError::NoPendingInvite(invitee_id))
    }

    pub fn pending_for(&self, invitee_id: PlayerId) -> Option<&Invitation> {
        self.invitations.get(&invitee_id)
    }

    pub fn connected_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for PlayerDirectory {
    fn default() -> Self {
        Self::new()
    }
}
