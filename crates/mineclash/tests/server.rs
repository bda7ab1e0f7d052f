//! End-to-end tests over real WebSocket connections.
//!
//! Player ids are assigned from a process-wide counter shared by every
//! test in this binary, so tests never assume concrete id values;
//! they read `host_id` and roster entries out of `room:joined`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use mineclash::MineclashServer;
use mineclash_protocol::{
    ClientEvent, Mode, OptionPatch, PlayerId, RoomId, ServerEvent, TileState,
};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

async fn start_server() -> String {
    let server = MineclashServer::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send(ws: &mut Ws, event: &ClientEvent) {
    let bytes = serde_json::to_vec(event).unwrap();
    ws.send(Message::Binary(bytes.into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Binary(data) => {
                return serde_json::from_slice(&data).unwrap();
            }
            Message::Text(text) => {
                return serde_json::from_str(&text).unwrap();
            }
            _ => continue,
        }
    }
}

/// Connects a host and creates a room with the given options.
async fn create_room(addr: &str, options: OptionPatch) -> (Ws, RoomId) {
    let mut host = connect(addr).await;
    send(
        &mut host,
        &ClientEvent::RoomCreate { name: Some("host".into()), options },
    )
    .await;
    match recv(&mut host).await {
        ServerEvent::RoomCreated { room_id } => (host, room_id),
        other => panic!("expected room:created, got {other:?}"),
    }
}

/// Connects a guest into the room. Returns the guest socket plus the
/// host and guest ids read from the roster broadcast; drains the
/// broadcasts (`room:joined`, `game:state`) on both sockets and the
/// pending-option unicast on the guest.
async fn join_room(
    addr: &str,
    host: &mut Ws,
    room_id: &RoomId,
) -> (Ws, PlayerId, PlayerId) {
    let mut guest = connect(addr).await;
    send(
        &mut guest,
        &ClientEvent::RoomJoin {
            room_id: room_id.clone(),
            name: Some("guest".into()),
        },
    )
    .await;

    let (host_id, guest_id) = match recv(&mut guest).await {
        ServerEvent::RoomJoined { players, host_id, .. } => {
            (host_id, players.last().unwrap().id)
        }
        other => panic!("expected room:joined, got {other:?}"),
    };
    // game:state broadcast + pending option unicast on the guest.
    assert!(matches!(recv(&mut guest).await, ServerEvent::GameState(_)));
    assert!(matches!(recv(&mut guest).await, ServerEvent::OptionUpdate(_)));
    // The host sees the same roster + state broadcasts.
    assert!(matches!(recv(host).await, ServerEvent::RoomJoined { .. }));
    assert!(matches!(recv(host).await, ServerEvent::GameState(_)));

    (guest, host_id, guest_id)
}

fn single_mine_board() -> OptionPatch {
    OptionPatch {
        width: Some(1),
        height: Some(1),
        mines: Some(1),
        mode: Some(Mode::Turn),
        ..OptionPatch::default()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_and_join_flow() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, OptionPatch::default()).await;

    let mut guest = connect(&addr).await;
    send(
        &mut guest,
        &ClientEvent::RoomJoin {
            room_id: room_id.clone(),
            name: Some("guest".into()),
        },
    )
    .await;

    match recv(&mut guest).await {
        ServerEvent::RoomJoined { room_id: rid, players, can_participate, .. } => {
            assert_eq!(rid, room_id);
            assert_eq!(players.len(), 2);
            assert_eq!(players[0].name, "host");
            assert_eq!(players[1].name, "guest");
            assert!(can_participate);
        }
        other => panic!("expected room:joined, got {other:?}"),
    }
    match recv(&mut guest).await {
        ServerEvent::GameState(state) => {
            assert!(!state.started);
            assert_eq!(state.width, 16);
            assert_eq!(state.mines, 41);
        }
        other => panic!("expected game:state, got {other:?}"),
    }
    // Pending options (the room defaults) are replayed to the joiner.
    match recv(&mut guest).await {
        ServerEvent::OptionUpdate(patch) => {
            assert_eq!(patch.width, Some(16));
            assert_eq!(patch.mines, Some(41));
        }
        other => panic!("expected option:update, got {other:?}"),
    }

    // The host sees the roster broadcast too.
    assert!(matches!(recv(&mut host).await, ServerEvent::RoomJoined { .. }));
}

#[tokio::test]
async fn test_join_unknown_room_reports_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(
        &mut ws,
        &ClientEvent::RoomJoin { room_id: RoomId("nosuch".into()), name: None },
    )
    .await;

    match recv(&mut ws).await {
        ServerEvent::Error { message } => assert_eq!(message, "Room not found"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_turn_round_over_websockets() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, single_mine_board()).await;
    let (mut guest, host_id, _guest_id) =
        join_room(&addr, &mut host, &room_id).await;

    send(&mut host, &ClientEvent::GameStart { options: OptionPatch::default() })
        .await;

    // Start sequence: state, then the opening turn, then the countdown.
    match recv(&mut guest).await {
        ServerEvent::GameState(state) => {
            assert!(state.started);
            assert_eq!(state.turn_player, Some(host_id));
            assert_eq!((state.width, state.height, state.mines), (1, 1, 1));
        }
        other => panic!("expected game:state, got {other:?}"),
    }
    assert_eq!(
        recv(&mut guest).await,
        ServerEvent::TurnUpdate { turn_player: Some(host_id) }
    );
    assert_eq!(recv(&mut guest).await, ServerEvent::TimerReset { remaining: 10 });
    for _ in 0..3 {
        let _ = recv(&mut host).await;
    }

    // The only tile is the only mine: detonation, score, and an
    // immediate exhaustion finish for the host.
    send(&mut host, &ClientEvent::TileReveal { x: 0, y: 0 }).await;

    match recv(&mut guest).await {
        ServerEvent::TileUpdate { update, owner } => {
            assert_eq!((update.x, update.y), (0, 0));
            assert_eq!(update.state, TileState::Boom);
            assert_eq!(update.value, -1);
            assert_eq!(owner, Some(host_id));
        }
        other => panic!("expected tile:update, got {other:?}"),
    }
    match recv(&mut guest).await {
        ServerEvent::ScoreUpdate { scores, mines_left, .. } => {
            assert_eq!(scores.get(&host_id), Some(&1));
            assert_eq!(mines_left, 0);
        }
        other => panic!("expected score:update, got {other:?}"),
    }
    match recv(&mut guest).await {
        ServerEvent::GameOver { winner, reason } => {
            assert_eq!(winner, Some(host_id));
            assert!(reason.contains("all mines found"));
        }
        other => panic!("expected game:over, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mid_round_joiner_is_spectator() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, single_mine_board()).await;

    // Host starts alone; the round is already running when the guest
    // arrives.
    send(&mut host, &ClientEvent::GameStart { options: OptionPatch::default() })
        .await;
    for _ in 0..3 {
        let _ = recv(&mut host).await; // state, turn, timer
    }

    let mut guest = connect(&addr).await;
    send(
        &mut guest,
        &ClientEvent::RoomJoin { room_id, name: Some("late".into()) },
    )
    .await;
    match recv(&mut guest).await {
        ServerEvent::RoomJoined { can_participate, .. } => {
            assert!(!can_participate);
        }
        other => panic!("expected room:joined, got {other:?}"),
    }
    // Drain the state broadcast and option replay.
    assert!(matches!(recv(&mut guest).await, ServerEvent::GameState(_)));
    assert!(matches!(recv(&mut guest).await, ServerEvent::OptionUpdate(_)));

    send(&mut guest, &ClientEvent::TileReveal { x: 0, y: 0 }).await;
    match recv(&mut guest).await {
        ServerEvent::Error { message } => {
            assert!(message.contains("can't participate"));
        }
        other => panic!("expected participation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    // Garbage and unknown events are dropped without killing the
    // connection; a valid create afterwards still works.
    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"type":"tile:paint"}"#.into()))
        .await
        .unwrap();

    send(
        &mut ws,
        &ClientEvent::RoomCreate { name: None, options: OptionPatch::default() },
    )
    .await;
    assert!(matches!(recv(&mut ws).await, ServerEvent::RoomCreated { .. }));
}

#[tokio::test]
async fn test_disconnect_notifies_remaining_player() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, OptionPatch::default()).await;
    let (guest, _host_id, _guest_id) =
        join_room(&addr, &mut host, &room_id).await;

    drop(guest);

    // The host hears about the departure as an informational error.
    loop {
        match recv(&mut host).await {
            ServerEvent::Error { message } => {
                assert_eq!(message, "Opponent left");
                break;
            }
            // Skip unrelated broadcasts (roster, state).
            _ => continue,
        }
    }
}
