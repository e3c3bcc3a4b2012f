//! Match registry: creates, tracks, and removes live matches.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use armada_directory::Outbound;
use armada_protocol::{MatchId, PlayerId};

use crate::{Match, MatchConfig, MatchError};

/// Owns the set of live matches and the player→match index.
///
/// Like the player directory, this is a plain-map registry guarded by a
/// single higher-level mutex. Per-shot traffic only does a read-only
/// lookup here; all the contended work happens under the per-match lock.
pub struct MatchRegistry {
    /// Owned id counter — injected state, not a process-wide static.
    next_id: AtomicU64,
    config: MatchConfig,
    matches: HashMap<MatchId, Arc<Match>>,
    /// A player can be in at most one live match (key invariant).
    by_player: HashMap<PlayerId, MatchId>,
}

impl MatchRegistry {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            config,
            matches: HashMap::new(),
            by_player: HashMap::new(),
        }
    }

    /// Creates a match in `Placing` and indexes both players to it.
    ///
    /// Fails if either player is already indexed to a live match.
    pub fn create_match(
        &mut self,
        player_a: PlayerId,
        player_b: PlayerId,
        sender_a: Outbound,
        sender_b: Outbound,
    ) -> Result<Arc<Match>, MatchError> {
        if self.by_player.contains_key(&player_a) {
            return Err(MatchError::AlreadyInMatch(player_a));
        }
        if self.by_player.contains_key(&player_b) {
            return Err(MatchError::AlreadyInMatch(player_b));
        }

        let id = MatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let m = Match::new(
            id,
            [player_a, player_b],
            [sender_a, sender_b],
            self.config.clone(),
        );

        self.by_player.insert(player_a, id);
        self.by_player.insert(player_b, id);
        self.matches.insert(id, Arc::clone(&m));

        tracing::info!(match_id = %id, %player_a, %player_b, "match created");
        Ok(m)
    }

    /// The live match a player is participating in, if any.
    pub fn match_of(&self, player_id: PlayerId) -> Option<Arc<Match>> {
        let id = self.by_player.get(&player_id)?;
        self.matches.get(id).cloned()
    }

    pub fn get(&self, match_id: MatchId) -> Option<Arc<Match>> {
        self.matches.get(&match_id).cloned()
    }

    /// Removes a match and clears both players' index entries.
    pub fn remove(&mut self, match_id: MatchId) -> Option<Arc<Match>> {
        let m = self.matches.remove(&match_id)?;
        for player in m.players() {
            self.by_player.remove(&player);
        }
        tracing::info!(match_id = %match_id, "match removed");
        Some(m)
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn sender() -> Outbound {
        mpsc::unbounded_channel().0
    }

    #[test]
    fn test_create_match_indexes_both_players() {
        let mut registry = MatchRegistry::new(MatchConfig::default());
        let m = registry
            .create_match(PlayerId(1), PlayerId(2), sender(), sender())
            .unwrap();

        assert_eq!(registry.match_of(PlayerId(1)).unwrap().id(), m.id());
        assert_eq!(registry.match_of(PlayerId(2)).unwrap().id(), m.id());
        assert_eq!(registry.match_count(), 1);
    }

    #[test]
    fn test_create_match_rejects_player_already_in_match() {
        let mut registry = MatchRegistry::new(MatchConfig::default());
        registry
            .create_match(PlayerId(1), PlayerId(2), sender(), sender())
            .unwrap();

        let err = registry
            .create_match(PlayerId(2), PlayerId(3), sender(), sender())
            .unwrap_err();
        assert!(matches!(err, MatchError::AlreadyInMatch(PlayerId(2))));
    }

    #[test]
    fn test_remove_clears_player_index() {
        let mut registry = MatchRegistry::new(MatchConfig::default());
        let m = registry
            .create_match(PlayerId(1), PlayerId(2), sender(), sender())
            .unwrap();

        registry.remove(m.id());
        assert!(registry.match_of(PlayerId(1)).is_none());
        assert!(registry.match_of(PlayerId(2)).is_none());
        assert_eq!(registry.match_count(), 0);

        // Both players can enter a new match afterwards.
        assert!(
            registry
                .create_match(PlayerId(1), PlayerId(2), sender(), sender())
                .is_ok()
        );
    }

    #[test]
    fn test_match_ids_are_distinct() {
        let mut registry = MatchRegistry::new(MatchConfig::default());
        let a = registry
            .create_match(PlayerId(1), PlayerId(2), sender(), sender())
            .unwrap();
        let b = registry
            .create_match(PlayerId(3), PlayerId(4), sender(), sender())
            .unwrap();
        assert_ne!(a.id(), b.id());
    }
}
