//! The match state machine: placement, turn-based combat, and the
//! generation-guarded turn timer.

use std::sync::Arc;

use armada_game::{Board, Coord, ShipPlacement, ShotOutcome};
use armada_directory::Outbound;
use armada_protocol::{MatchId, PlayerId, ServerMessage};
use rand::Rng;
use tokio::sync::Mutex;

use crate::{MatchConfig, MatchError, MatchPhase};

/// What a successful [`Match::fire_shot`] produced, for the caller's
/// bookkeeping. All participant notifications have already been pushed
/// by the time this is returned.
#[derive(Debug, Clone, Copy)]
pub struct ShotReport {
    pub outcome: ShotOutcome,
    /// `true` iff this shot ended the match — the caller should remove
    /// the match from the registry and free both players.
    pub finished: bool,
}

/// Mutable match state. Only ever touched with the match mutex held.
#[derive(Debug)]
struct MatchInner {
    phase: MatchPhase,
    boards: [Board; 2],
    placed: [bool; 2],
    /// Index into `Match::players` of the player allowed to fire.
    turn_holder: usize,
    winner: Option<PlayerId>,
    /// Monotonically increasing counter identifying the currently armed
    /// timer. A queued timeout callback whose generation no longer
    /// matches is stale and must not mutate turn state.
    timer_generation: u64,
}

impl MatchInner {
    fn bump_generation(&mut self) -> u64 {
        self.timer_generation += 1;
        self.timer_generation
    }
}

/// One game between two players, from placement through a declared
/// winner.
///
/// Exclusively owns its two boards. All mutation goes through
/// [`place_ships`](Self::place_ships), [`fire_shot`](Self::fire_shot),
/// [`force_timeout`](Self::force_timeout), and
/// [`forfeit`](Self::forfeit), each of which holds the match mutex for
/// its full duration and pushes the resulting notifications to both
/// participants before releasing it — so both clients always observe
/// the same post-mutation snapshot.
#[derive(Debug)]
pub struct Match {
    id: MatchId,
    players: [PlayerId; 2],
    senders: [Outbound; 2],
    config: MatchConfig,
    inner: Mutex<MatchInner>,
}

impl Match {
    pub(crate) fn new(
        id: MatchId,
        players: [PlayerId; 2],
        senders: [Outbound; 2],
        config: MatchConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            players,
            senders,
            config,
            inner: Mutex::new(MatchInner {
                phase: MatchPhase::Placing,
                boards: [Board::new(), Board::new()],
                placed: [false, false],
                turn_holder: 0,
                winner: None,
                timer_generation: 0,
            }),
        })
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn players(&self) -> [PlayerId; 2] {
        self.players
    }

    pub async fn phase(&self) -> MatchPhase {
        self.inner.lock().await.phase
    }

    pub async fn winner(&self) -> Option<PlayerId> {
        self.inner.lock().await.winner
    }

    /// The player currently allowed to fire, while combat is running.
    pub async fn turn_holder(&self) -> Option<PlayerId> {
        let inner = self.inner.lock().await;
        match inner.phase {
            MatchPhase::InProgress => Some(self.players[inner.turn_holder]),
            _ => None,
        }
    }

    fn index_of(&self, player_id: PlayerId) -> Result<usize, MatchError> {
        self.players
            .iter()
            .position(|&p| p == player_id)
            .ok_or(MatchError::NotAParticipant(player_id, self.id))
    }

    /// Pushes a message to one participant. Silently drops it if their
    /// connection is gone — teardown of the session handles the rest.
    fn send_to(&self, idx: usize, msg: ServerMessage) {
        let _ = self.senders[idx].send(msg);
    }

    fn send_both(&self, msg: ServerMessage) {
        self.send_to(0, msg.clone());
        self.send_to(1, msg);
    }

    /// Pushes per-recipient board snapshots: own board in full, the
    /// opponent's with intact ships masked.
    fn push_boards(&self, inner: &MatchInner) {
        for idx in 0..2 {
            self.send_to(
                idx,
                ServerMessage::BoardsUpdated {
                    own: inner.boards[idx].own_view(),
                    opponent: inner.boards[1 - idx].opponent_view(),
                },
            );
        }
    }

    /// Arms the turn timer for the given generation. The spawned task
    /// sleeps for the configured timeout and then attempts a forced
    /// turn change; if the generation has moved on by then, the attempt
    /// is a no-op.
    fn arm_timer(self: &Arc<Self>, generation: u64) {
        let this = Arc::clone(self);
        let timeout = self.config.turn_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            this.force_timeout(generation).await;
        });
    }

    /// Stores `player_id`'s validated layout. When both players have
    /// placed, combat starts: an unbiased coin flip picks the first
    /// turn holder and the turn timer is armed.
    ///
    /// Legal only in `Placing`; a player can place exactly once.
    pub async fn place_ships(
        self: &Arc<Self>,
        player_id: PlayerId,
        ships: Vec<ShipPlacement>,
    ) -> Result<(), MatchError> {
        let idx = self.index_of(player_id)?;
        let mut inner = self.inner.lock().await;

        if inner.phase != MatchPhase::Placing {
            return Err(MatchError::WrongPhase(inner.phase));
        }
        if inner.placed[idx] {
            return Err(MatchError::AlreadyPlaced(player_id));
        }
        if ships.is_empty() {
            return Err(MatchError::EmptyFleet);
        }
        if let Some(expected) = self.config.fleet {
            let mut got = [0u8; 4];
            for ship in &ships {
                // Saturating: a flood of one kind must stay a mismatch,
                // not wrap back around to the expected count.
                let slot = &mut got[ship.kind.length() - 1];
                *slot = slot.saturating_add(1);
            }
            if got != expected {
                return Err(MatchError::FleetMismatch { expected, got });
            }
        }

        // Build onto a fresh board so a mid-layout rejection leaves the
        // player free to resubmit from scratch.
        let mut board = Board::new();
        for placement in ships {
            board.place_ship(placement)?;
        }
        inner.boards[idx] = board;
        inner.placed[idx] = true;

        tracing::info!(match_id = %self.id, %player_id, "ships placed");
        self.send_to(idx, ServerMessage::ShipsAccepted);

        if !inner.placed[1 - idx] {
            self.send_to(idx, ServerMessage::WaitingOpponentShips);
            return Ok(());
        }

        // Both layouts are in: start combat.
        inner.phase = MatchPhase::InProgress;
        inner.turn_holder = rand::rng().random_range(0..2);
        let holder = self.players[inner.turn_holder];

        self.send_both(ServerMessage::BothReady);
        self.push_boards(&inner);
        self.send_both(ServerMessage::TurnStarted { player_id: holder });

        let generation = inner.bump_generation();
        drop(inner);
        self.arm_timer(generation);

        tracing::info!(match_id = %self.id, first_turn = %holder, "combat started");
        Ok(())
    }

    /// Resolves a shot by the turn holder against the opponent's board.
    ///
    /// `Water` passes the turn to the opponent; `Hit` and `Sunk` retain
    /// it (extra-turn-on-hit rule). Either way the turn timer restarts
    /// under a fresh generation. A shot that sinks the last ship ends
    /// the match; the win transition can fire at most once because the
    /// phase leaves `InProgress` in the same critical section.
    pub async fn fire_shot(
        self: &Arc<Self>,
        player_id: PlayerId,
        coord: Coord,
    ) -> Result<ShotReport, MatchError> {
        let idx = self.index_of(player_id)?;
        let mut inner = self.inner.lock().await;

        if inner.phase != MatchPhase::InProgress {
            return Err(MatchError::WrongPhase(inner.phase));
        }
        if inner.turn_holder != idx {
            return Err(MatchError::NotYourTurn(player_id));
        }

        // Rejections (out of bounds, already targeted) propagate with
        // no side effects: no board mutation, no turn change, timer
        // untouched.
        let outcome = inner.boards[1 - idx].apply_shot(coord)?;

        tracing::debug!(
            match_id = %self.id,
            shooter = %player_id,
            %coord,
            ?outcome,
            "shot resolved"
        );

        self.send_both(ServerMessage::ShotResult {
            shooter_id: player_id,
            coord,
            outcome,
        });
        self.push_boards(&inner);

        if inner.boards[1 - idx].all_ships_sunk() {
            inner.phase = MatchPhase::Finished;
            inner.winner = Some(player_id);
            // Invalidate the armed timer permanently.
            inner.bump_generation();

            self.send_to(idx, ServerMessage::MatchWon { winner_id: player_id });
            self.send_to(1 - idx, ServerMessage::MatchLost { winner_id: player_id });

            tracing::info!(match_id = %self.id, winner = %player_id, "match won");
            return Ok(ShotReport {
                outcome,
                finished: true,
            });
        }

        if outcome == ShotOutcome::Water {
            inner.turn_holder = 1 - idx;
            let next = self.players[inner.turn_holder];
            self.send_both(ServerMessage::TurnChanged { player_id: next });
        }

        let generation = inner.bump_generation();
        drop(inner);
        self.arm_timer(generation);

        Ok(ShotReport {
            outcome,
            finished: false,
        })
    }

    /// Invoked by the turn timer. Treats an expired turn as an
    /// automatic miss: the turn passes to the opponent and the timer
    /// restarts.
    ///
    /// A callback holding a stale generation — or one that fires after
    /// the match finished — is a no-op. This is the guard for the race
    /// where a timeout was already queued at the instant a shot
    /// rescheduled the timer.
    pub async fn force_timeout(self: &Arc<Self>, expected_generation: u64) {
        let mut inner = self.inner.lock().await;

        if inner.phase != MatchPhase::InProgress
            || inner.timer_generation != expected_generation
        {
            tracing::trace!(
                match_id = %self.id,
                expected = expected_generation,
                current = inner.timer_generation,
                "stale timeout callback ignored"
            );
            return;
        }

        let timed_out = self.players[inner.turn_holder];
        inner.turn_holder = 1 - inner.turn_holder;
        let next = self.players[inner.turn_holder];

        tracing::info!(match_id = %self.id, %timed_out, "turn timed out");
        self.send_both(ServerMessage::TurnTimeout { player_id: timed_out });
        self.send_both(ServerMessage::TurnChanged { player_id: next });

        let generation = inner.bump_generation();
        drop(inner);
        self.arm_timer(generation);
    }

    /// Ends the match immediately in favor of the other player, due to
    /// surrender or disconnection. Legal in `Placing` and `InProgress`;
    /// a no-op (returning `None`) once `Finished`.
    ///
    /// Returns the winner so the caller can free both players.
    pub async fn forfeit(
        self: &Arc<Self>,
        player_id: PlayerId,
    ) -> Result<Option<PlayerId>, MatchError> {
        let idx = self.index_of(player_id)?;
        let mut inner = self.inner.lock().await;

        if inner.phase == MatchPhase::Finished {
            return Ok(None);
        }

        inner.phase = MatchPhase::Finished;
        let winner = self.players[1 - idx];
        inner.winner = Some(winner);
        inner.bump_generation();

        self.send_to(
            1 - idx,
            ServerMessage::MatchAbandoned {
                abandoner_id: player_id,
            },
        );

        tracing::info!(
            match_id = %self.id,
            abandoner = %player_id,
            %winner,
            "match forfeited"
        );
        Ok(Some(winner))
    }
}
