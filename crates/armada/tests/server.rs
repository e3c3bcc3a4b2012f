//! Integration tests for the Armada server: registration, invitations,
//! and full matches over real WebSocket connections.

use std::time::Duration;

use armada::{ArmadaServer, MatchConfig};
use armada_protocol::{ClientMessage, JsonCodec, Envelope, PlayerId, PlayerInfo, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port and returns the address.
///
/// Tests run with no fleet requirement and a long turn timeout so match
/// flows are not raced by the timer.
async fn start_server() -> String {
    let server = ArmadaServer::<JsonCodec>::builder()
        .bind("127.0.0.1:0")
        .match_config(MatchConfig {
            turn_timeout: Duration::from_secs(300),
            fleet: None,
        })
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, body: ClientMessage) {
    let envelope = Envelope {
        seq: 0,
        timestamp: 0,
        body,
    };
    let bytes = serde_json::to_vec(&envelope).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");
}

/// Receives the next server message, unwrapping its envelope.
async fn recv(ws: &mut ClientWs) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for server message")
        .expect("stream ended")
        .expect("recv");
    let envelope: Envelope<ServerMessage> =
        serde_json::from_slice(&msg.into_data()).expect("decode");
    envelope.body
}

/// Registers under `name` and returns the assigned profile.
async fn register(ws: &mut ClientWs, name: &str) -> PlayerInfo {
    send(
        ws,
        ClientMessage::Register {
            name: name.into(),
            color: "#2266aa".into(),
        },
    )
    .await;
    match recv(ws).await {
        ServerMessage::Registered { player } => player,
        other => panic!("expected Registered, got {other:?}"),
    }
}

fn patrol_boat_at_origin() -> Vec<armada_game::ShipPlacement> {
    vec![armada_game::ShipPlacement {
        kind: armada_game::ShipKind::PatrolBoat,
        orientation: armada_game::Orientation::Horizontal,
        cells: vec![armada_game::Coord::new(0, 0).unwrap()],
    }]
}

/// Drives two fresh connections through register → propose → accept and
/// returns them with their profiles.
async fn start_match(addr: &str) -> (ClientWs, PlayerInfo, ClientWs, PlayerInfo) {
    let mut ana = connect(addr).await;
    let mut bruno = connect(addr).await;
    let ana_info = register(&mut ana, "Ana").await;
    let bruno_info = register(&mut bruno, "Bruno").await;

    send(
        &mut ana,
        ClientMessage::ProposeMatch {
            invitee_id: bruno_info.id,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut bruno).await,
        ServerMessage::InvitationReceived { requester_id, .. } if requester_id == ana_info.id
    ));

    send(&mut bruno, ClientMessage::AcceptMatch).await;
    for ws in [&mut ana, &mut bruno] {
        assert!(matches!(recv(ws).await, ServerMessage::MatchAccepted { .. }));
        assert!(matches!(recv(ws).await, ServerMessage::MatchStarted { .. }));
    }

    (ana, ana_info, bruno, bruno_info)
}

/// Places one ship per player and reads the combat-start burst.
/// Returns the id of the coin-flip winner.
async fn place_and_start(
    ana: &mut ClientWs,
    bruno: &mut ClientWs,
) -> PlayerId {
    send(
        ana,
        ClientMessage::PlaceShips {
            ships: patrol_boat_at_origin(),
        },
    )
    .await;
    assert!(matches!(recv(ana).await, ServerMessage::ShipsAccepted));
    assert!(matches!(recv(ana).await, ServerMessage::WaitingOpponentShips));

    send(
        bruno,
        ClientMessage::PlaceShips {
            ships: patrol_boat_at_origin(),
        },
    )
    .await;
    assert!(matches!(recv(bruno).await, ServerMessage::ShipsAccepted));

    let mut first_turn = None;
    for ws in [ana, bruno] {
        assert!(matches!(recv(ws).await, ServerMessage::BothReady));
        assert!(matches!(recv(ws).await, ServerMessage::BoardsUpdated { .. }));
        match recv(ws).await {
            ServerMessage::TurnStarted { player_id } => {
                if let Some(first) = first_turn {
                    assert_eq!(first, player_id);
                }
                first_turn = Some(player_id);
            }
            other => panic!("expected TurnStarted, got {other:?}"),
        }
    }
    first_turn.expect("combat started")
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_register_success() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let info = register(&mut ws, "Ana").await;
    assert_eq!(info.name, "Ana");
    assert_eq!(info.color, "#2266aa");
}

#[tokio::test]
async fn test_register_duplicate_name_rejected() {
    let addr = start_server().await;
    let mut ws1 = connect(&addr).await;
    let mut ws2 = connect(&addr).await;

    register(&mut ws1, "Ana").await;
    send(
        &mut ws2,
        ClientMessage::Register {
            name: "ana".into(),
            color: "red".into(),
        },
    )
    .await;
    assert!(matches!(recv(&mut ws2).await, ServerMessage::NameTaken { .. }));

    // The rejected connection can retry under another name.
    register(&mut ws2, "Bruno").await;
}

#[tokio::test]
async fn test_actions_require_registration() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, ClientMessage::RequestPlayers).await;
    match recv(&mut ws).await {
        ServerMessage::Error { message } => assert!(message.contains("register")),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_message_gets_error_but_connection_survives() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Binary(b"not json".to_vec().into()))
        .await
        .expect("send");
    assert!(matches!(recv(&mut ws).await, ServerMessage::Error { .. }));

    // Still usable afterwards.
    register(&mut ws, "Ana").await;
}

#[tokio::test]
async fn test_player_list_excludes_self() {
    let addr = start_server().await;
    let mut ana = connect(&addr).await;
    register(&mut ana, "Ana").await;

    send(&mut ana, ClientMessage::RequestPlayers).await;
    assert!(matches!(recv(&mut ana).await, ServerMessage::NoPlayersAvailable));

    let mut bruno = connect(&addr).await;
    let bruno_info = register(&mut bruno, "Bruno").await;

    send(&mut ana, ClientMessage::RequestPlayers).await;
    match recv(&mut ana).await {
        ServerMessage::PlayerList { players } => {
            assert_eq!(players, vec![bruno_info]);
        }
        other => panic!("expected PlayerList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reject_invitation_notifies_requester() {
    let addr = start_server().await;
    let mut ana = connect(&addr).await;
    let mut bruno = connect(&addr).await;
    register(&mut ana, "Ana").await;
    let bruno_info = register(&mut bruno, "Bruno").await;

    send(
        &mut ana,
        ClientMessage::ProposeMatch {
            invitee_id: bruno_info.id,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut bruno).await,
        ServerMessage::InvitationReceived { .. }
    ));

    send(&mut bruno, ClientMessage::RejectMatch).await;
    match recv(&mut ana).await {
        ServerMessage::MatchRejected { reason } => assert!(reason.contains("Bruno")),
        other => panic!("expected MatchRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_accept_creates_match_and_marks_players_busy() {
    let addr = start_server().await;
    let (_ana, ana_info, _bruno, _bruno_info) = start_match(&addr).await;

    // A third player sees nobody available: both participants left the
    // lobby pool.
    let mut carla = connect(&addr).await;
    register(&mut carla, "Carla").await;
    send(&mut carla, ClientMessage::RequestPlayers).await;
    assert!(matches!(recv(&mut carla).await, ServerMessage::NoPlayersAvailable));

    // And inviting a busy player fails.
    send(
        &mut carla,
        ClientMessage::ProposeMatch {
            invitee_id: ana_info.id,
        },
    )
    .await;
    assert!(matches!(recv(&mut carla).await, ServerMessage::Error { .. }));
}

#[tokio::test]
async fn test_full_match_to_victory() {
    let addr = start_server().await;
    let (mut ana, ana_info, mut bruno, _bruno_info) = start_match(&addr).await;

    let first_turn = place_and_start(&mut ana, &mut bruno).await;
    let (shooter, loser) = if first_turn == ana_info.id {
        (&mut ana, &mut bruno)
    } else {
        (&mut bruno, &mut ana)
    };

    // Both fleets are a single boat at the origin: one shot wins.
    send(shooter, ClientMessage::FireShot { x: 0, y: 0 }).await;

    for ws in [&mut *shooter, &mut *loser] {
        match recv(ws).await {
            ServerMessage::ShotResult { outcome, shooter_id, .. } => {
                assert_eq!(outcome, armada_game::ShotOutcome::Sunk);
                assert_eq!(shooter_id, first_turn);
            }
            other => panic!("expected ShotResult, got {other:?}"),
        }
        assert!(matches!(recv(ws).await, ServerMessage::BoardsUpdated { .. }));
    }
    assert!(matches!(
        recv(shooter).await,
        ServerMessage::MatchWon { winner_id } if winner_id == first_turn
    ));
    assert!(matches!(
        recv(loser).await,
        ServerMessage::MatchLost { winner_id } if winner_id == first_turn
    ));

    // The match is gone and both players are invitable again. The
    // winner's handler finishes the bookkeeping just after the win
    // notifications go out, so give it a beat.
    tokio::time::sleep(Duration::from_millis(50)).await;
    send(&mut ana, ClientMessage::RequestPlayers).await;
    match recv(&mut ana).await {
        ServerMessage::PlayerList { players } => assert_eq!(players.len(), 1),
        other => panic!("expected PlayerList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shot_out_of_turn_is_rejected() {
    let addr = start_server().await;
    let (mut ana, ana_info, mut bruno, _bruno_info) = start_match(&addr).await;

    let first_turn = place_and_start(&mut ana, &mut bruno).await;
    let waiter = if first_turn == ana_info.id {
        &mut bruno
    } else {
        &mut ana
    };

    send(waiter, ClientMessage::FireShot { x: 5, y: 5 }).await;
    match recv(waiter).await {
        ServerMessage::Error { message } => assert!(message.contains("turn")),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_forfeits_the_match() {
    let addr = start_server().await;
    let (mut ana, ana_info, mut bruno, _bruno_info) = start_match(&addr).await;
    place_and_start(&mut ana, &mut bruno).await;

    drop(ana);

    match recv(&mut bruno).await {
        ServerMessage::MatchAbandoned { abandoner_id } => {
            assert_eq!(abandoner_id, ana_info.id);
        }
        other => panic!("expected MatchAbandoned, got {other:?}"),
    }

    // Bruno is back in the lobby and Ana's name is free again (the
    // abandoned notification goes out before the name is released, so
    // wait for teardown to finish).
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut ana2 = connect(&addr).await;
    register(&mut ana2, "Ana").await;
    send(&mut ana2, ClientMessage::RequestPlayers).await;
    match recv(&mut ana2).await {
        ServerMessage::PlayerList { players } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].name, "Bruno");
        }
        other => panic!("expected PlayerList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_requester_disconnect_cancels_invitation() {
    let addr = start_server().await;
    let mut ana = connect(&addr).await;
    let mut bruno = connect(&addr).await;
    register(&mut ana, "Ana").await;
    let bruno_info = register(&mut bruno, "Bruno").await;

    send(
        &mut ana,
        ClientMessage::ProposeMatch {
            invitee_id: bruno_info.id,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut bruno).await,
        ServerMessage::InvitationReceived { .. }
    ));

    drop(ana);

    // The invitee learns the invitation died instead of accepting into
    // a void.
    match recv(&mut bruno).await {
        ServerMessage::MatchRejected { reason } => assert!(reason.contains("Ana")),
        other => panic!("expected MatchRejected, got {other:?}"),
    }
}

// Regression: an invitation whose requester entered another match while
// it was pending dies loudly on accept — both ends hear about it.
#[tokio::test]
async fn test_accept_fails_when_requester_is_already_in_a_match() {
    let addr = start_server().await;
    let mut ana = connect(&addr).await;
    let mut bruno = connect(&addr).await;
    let mut carla = connect(&addr).await;
    let ana_info = register(&mut ana, "Ana").await;
    let bruno_info = register(&mut bruno, "Bruno").await;
    register(&mut carla, "Carla").await;

    // Ana invites Bruno, then accepts an invitation from Carla.
    send(
        &mut ana,
        ClientMessage::ProposeMatch {
            invitee_id: bruno_info.id,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut bruno).await,
        ServerMessage::InvitationReceived { .. }
    ));

    send(
        &mut carla,
        ClientMessage::ProposeMatch {
            invitee_id: ana_info.id,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut ana).await,
        ServerMessage::InvitationReceived { .. }
    ));
    send(&mut ana, ClientMessage::AcceptMatch).await;
    for ws in [&mut ana, &mut carla] {
        assert!(matches!(recv(ws).await, ServerMessage::MatchAccepted { .. }));
        assert!(matches!(recv(ws).await, ServerMessage::MatchStarted { .. }));
    }

    // Bruno's invitation is now stale: accepting it cannot start a
    // match, and both Bruno and Ana are told so.
    send(&mut bruno, ClientMessage::AcceptMatch).await;
    match recv(&mut bruno).await {
        ServerMessage::MatchRejected { reason } => {
            assert!(reason.contains("already in a match"));
        }
        other => panic!("expected MatchRejected, got {other:?}"),
    }
    assert!(matches!(
        recv(&mut ana).await,
        ServerMessage::MatchRejected { .. }
    ));
}

#[tokio::test]
async fn test_envelope_sequence_is_gap_free() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        ClientMessage::Register {
            name: "Ana".into(),
            color: "red".into(),
        },
    )
    .await;
    send(&mut ws, ClientMessage::RequestPlayers).await;
    send(&mut ws, ClientMessage::RequestPlayers).await;

    for expected_seq in 1..=3u64 {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .expect("recv");
        let envelope: Envelope<ServerMessage> =
            serde_json::from_slice(&msg.into_data()).expect("decode");
        assert_eq!(envelope.seq, expected_seq);
    }
}
