//! Per-connection handler: registration and message routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler, plus a writer task that drains the player's outbound
//! channel. The flow is:
//!   1. Loop: receive envelopes → dispatch lobby or match messages
//!   2. On any exit path, tear down: forfeit a live match, drop pending
//!      invitations (notifying the other parties), free the name
//!
//! Teardown is guarded by [`TeardownGuard`], so it also runs when the
//! handler task panics or is cancelled instead of exiting its loop.
//!
//! Replies and pushes both go through the outbound channel, so each
//! client sees one strictly ordered, gap-free sequence of envelopes.

use std::sync::Arc;

use armada_directory::{DirectoryError, Invitation, Outbound, PlayerDirectory};
use armada_game::Coord;
use armada_match::MatchError;
use armada_protocol::{ClientMessage, Codec, Envelope, MatchId, PlayerId, ServerMessage};
use armada_transport::{Connection, WebSocketConnection};

use crate::ArmadaError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ArmadaError>
where
    C: Codec + Clone + 'static,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Everything outbound goes through this channel. The writer task is
    // the only sender on the socket, which serializes direct replies
    // with pushes arriving from match tasks.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ServerMessage>();

    let writer = {
        let conn = conn.clone();
        let codec = state.codec.clone();
        let started_at = state.started_at;
        tokio::spawn(async move {
            let mut seq: u64 = 1;
            while let Some(body) = rx.recv().await {
                let envelope = Envelope {
                    seq,
                    timestamp: started_at.elapsed().as_millis() as u64,
                    body,
                };
                seq += 1;
                let bytes = match codec.encode(&envelope) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode outbound envelope");
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
        })
    };

    // Set once a Register is accepted; drives teardown on exit.
    let mut session = TeardownGuard {
        state: Arc::clone(&state),
        player_id: None,
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let envelope: Envelope<ClientMessage> = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                let _ = tx.send(ServerMessage::Error {
                    message: format!("malformed message: {e}"),
                });
                continue;
            }
        };

        match envelope.body {
            ClientMessage::Register { name, color } => {
                if session.player_id.is_some() {
                    let _ = tx.send(ServerMessage::Error {
                        message: "already registered".into(),
                    });
                    continue;
                }
                let result = state
                    .directory
                    .lock()
                    .await
                    .register(&name, &color, tx.clone());
                match result {
                    Ok(info) => {
                        session.player_id = Some(info.id);
                        let _ = tx.send(ServerMessage::Registered { player: info });
                    }
                    Err(e @ DirectoryError::NameTaken(_)) => {
                        let _ = tx.send(ServerMessage::NameTaken {
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => {
                        let _ = tx.send(ServerMessage::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }

            ClientMessage::Disconnect => {
                tracing::info!(%conn_id, "client said goodbye");
                break;
            }

            // Everything else requires a registered player.
            other => {
                let Some(me) = session.player_id else {
                    let _ = tx.send(ServerMessage::Error {
                        message: "register first".into(),
                    });
                    continue;
                };
                dispatch(&state, me, other, &tx).await;
            }
        }
    }

    // Normal exit: disarm the guard and run teardown inline so the
    // bookkeeping is done before the socket closes.
    if let Some(me) = session.player_id.take() {
        teardown(&state, me).await;
    }
    writer.abort();
    let _ = conn.close().await;
    Ok(())
}

/// Holds the registered player id for one connection and guarantees
/// [`teardown`] runs for it exactly once.
///
/// The handler takes the id out and awaits teardown on its normal exit
/// path; if the task panics or is cancelled first, `Drop` spawns the
/// teardown instead, so a dead handler can never leak its name
/// registration or leave an opponent stuck in a match.
struct TeardownGuard<C: Codec> {
    state: Arc<ServerState<C>>,
    player_id: Option<PlayerId>,
}

impl<C: Codec> Drop for TeardownGuard<C> {
    fn drop(&mut self) {
        if let Some(me) = self.player_id.take() {
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                teardown(&state, me).await;
            });
        }
    }
}

/// Routes one message from a registered player.
async fn dispatch<C: Codec>(
    state: &Arc<ServerState<C>>,
    me: PlayerId,
    msg: ClientMessage,
    tx: &Outbound,
) {
    match msg {
        ClientMessage::RequestPlayers => {
            let players = state.directory.lock().await.list_available(Some(me));
            let reply = if players.is_empty() {
                ServerMessage::NoPlayersAvailable
            } else {
                ServerMessage::PlayerList { players }
            };
            let _ = tx.send(reply);
        }

        ClientMessage::ProposeMatch { invitee_id } => {
            let mut directory = state.directory.lock().await;
            let requester_name = match directory.player(me) {
                Some(p) => p.name.clone(),
                None => return,
            };
            match directory.propose(me, invitee_id) {
                Ok(_) => {
                    directory.push(
                        invitee_id,
                        ServerMessage::InvitationReceived {
                            requester_id: me,
                            requester_name,
                        },
                    );
                }
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientMessage::AcceptMatch => accept_match(state, me, tx).await,

        ClientMessage::RejectMatch => {
            let mut directory = state.directory.lock().await;
            match directory.reject(me) {
                Ok(invitation) => {
                    let invitee_name = directory
                        .player(me)
                        .map(|p| p.name.clone())
                        .unwrap_or_default();
                    directory.push(
                        invitation.requester_id,
                        ServerMessage::MatchRejected {
                            reason: format!("{invitee_name} rejected the invitation"),
                        },
                    );
                }
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientMessage::PlaceShips { ships } => {
            let m = state.matches.lock().await.match_of(me);
            let Some(m) = m else {
                let _ = tx.send(ServerMessage::Error {
                    message: MatchError::NotInMatch(me).to_string(),
                });
                return;
            };
            if let Err(e) = m.place_ships(me, ships).await {
                let _ = tx.send(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
        }

        ClientMessage::FireShot { x, y } => {
            let coord = match Coord::new(x, y) {
                Ok(coord) => coord,
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                    return;
                }
            };
            let m = state.matches.lock().await.match_of(me);
            let Some(m) = m else {
                let _ = tx.send(ServerMessage::Error {
                    message: MatchError::NotInMatch(me).to_string(),
                });
                return;
            };
            match m.fire_shot(me, coord).await {
                Ok(report) if report.finished => finish_match(state, m.id(), m.players()).await,
                Ok(_) => {}
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        // Register and Disconnect are handled in the connection loop.
        ClientMessage::Register { .. } | ClientMessage::Disconnect => {}
    }
}

/// Accepts the pending invitation addressed to `me` and creates the
/// match.
async fn accept_match<C: Codec>(
    state: &Arc<ServerState<C>>,
    me: PlayerId,
    tx: &Outbound,
) {
    // Lock order: directory before matches, everywhere.
    let mut directory = state.directory.lock().await;
    let invitation = match directory.accept(me) {
        Ok(invitation) => invitation,
        Err(e) => {
            let _ = tx.send(ServerMessage::Error {
                message: e.to_string(),
            });
            return;
        }
    };
    let requester = invitation.requester_id;

    // The requester may have vanished between proposing and this accept.
    let Some(requester_tx) = directory.sender(requester) else {
        let _ = tx.send(ServerMessage::MatchRejected {
            reason: "the other player disconnected".into(),
        });
        return;
    };

    let created = state
        .matches
        .lock()
        .await
        .create_match(requester, me, requester_tx, tx.clone());
    let m = match created {
        Ok(m) => m,
        Err(e) => {
            // The invitation is already consumed, so both ends must hear
            // it is dead (the requester may have entered another match
            // while this one was pending).
            let _ = tx.send(ServerMessage::MatchRejected {
                reason: e.to_string(),
            });
            directory.push(
                requester,
                ServerMessage::MatchRejected {
                    reason: e.to_string(),
                },
            );
            return;
        }
    };

    directory.set_available(requester, false);
    directory.set_available(me, false);

    // Each side learns the match id and who they are facing.
    let pairs = [(requester, me), (me, requester)];
    for (recipient, opponent) in pairs {
        if let Some(info) = directory.player(opponent).map(|p| p.info()) {
            directory.push(
                recipient,
                ServerMessage::MatchAccepted {
                    match_id: m.id(),
                    opponent: info,
                },
            );
        }
        directory.push(recipient, ServerMessage::MatchStarted { match_id: m.id() });
    }
}

/// Removes a finished match and returns both players to the lobby pool.
async fn finish_match<C: Codec>(
    state: &Arc<ServerState<C>>,
    match_id: MatchId,
    players: [PlayerId; 2],
) {
    let mut directory = state.directory.lock().await;
    state.matches.lock().await.remove(match_id);
    for player in players {
        directory.set_available(player, true);
    }
}

/// Cleanup when a registered player's connection ends, however it ends.
///
/// A live match is forfeited in the opponent's favor, pending
/// invitations are dropped with the other party notified, and the name
/// is freed.
async fn teardown<C: Codec>(state: &Arc<ServerState<C>>, me: PlayerId) {
    let m = state.matches.lock().await.match_of(me);
    if let Some(m) = m {
        // forfeit pushes MatchAbandoned to the opponent itself; a
        // forfeit of an already-finished match is a no-op.
        if let Err(e) = m.forfeit(me).await {
            tracing::warn!(player_id = %me, error = %e, "forfeit on disconnect failed");
        }
        finish_match(state, m.id(), m.players()).await;
    }

    let mut directory = state.directory.lock().await;
    let name = directory
        .player(me)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let dropped = directory.unregister(me);
    for invitation in dropped {
        notify_dropped_invitation(&directory, me, &name, &invitation);
    }
}

/// Tells the surviving party of a dropped invitation that it is dead,
/// so nobody waits on a ghost.
fn notify_dropped_invitation(
    directory: &PlayerDirectory,
    gone: PlayerId,
    gone_name: &str,
    invitation: &Invitation,
) {
    let survivor = if invitation.invitee_id == gone {
        invitation.requester_id
    } else {
        invitation.invitee_id
    };
    directory.push(
        survivor,
        ServerMessage::MatchRejected {
            reason: format!("{gone_name} disconnected"),
        },
    );
}
