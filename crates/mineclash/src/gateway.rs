//! Per-connection gateway: decode inbound frames, route player actions
//! into the registry, and pump room events back out to the socket.
//!
//! Rooms push events at any time (broadcasts, timer resets), so each
//! connection is split: a writer task drains the player's unbounded
//! event channel into the sink while this task reads the stream. The
//! event channel is the same sender the room actors hold for the player.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use mineclash_protocol::{
    ClientEvent, Codec, PlayerId, ServerEvent,
};
use mineclash_room::RoomAction;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::server::ServerState;

/// Runs one connection from upgrade to close. Cleans the player out of
/// their room on any exit path.
pub(crate) async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    player_id: PlayerId,
    state: Arc<ServerState>,
) {
    let (mut sink, mut stream) = ws.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();

    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::error!(%error, "failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Binary(bytes.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        let data = match frame {
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            // Pings are answered by tungstenite itself.
            Ok(_) => continue,
            Err(error) => {
                tracing::debug!(%player_id, %error, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(error) => {
                tracing::debug!(
                    %player_id,
                    %error,
                    "undecodable frame, skipping"
                );
                continue;
            }
        };
        dispatch_event(player_id, event, &event_tx, &state).await;
    }

    // Transport disconnect gets the same cleanup as an explicit leave.
    state.registry.lock().await.disconnect(player_id).await;
    writer.abort();
    tracing::info!(%player_id, "connection closed");
}

/// Maps one decoded client event onto the registry. Routing failures
/// that the player should know about come back as `error` events on
/// their own channel; everything else is in the rooms' hands.
async fn dispatch_event(
    player_id: PlayerId,
    event: ClientEvent,
    event_tx: &mpsc::UnboundedSender<ServerEvent>,
    state: &Arc<ServerState>,
) {
    match event {
        ClientEvent::RoomCreate { name, options } => {
            let mut registry = state.registry.lock().await;
            registry
                .create_room(player_id, name, &options, event_tx.clone())
                .await;
        }
        ClientEvent::RoomJoin { room_id, name } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .join_room(player_id, room_id, name, event_tx.clone())
                    .await
            };
            if let Err(error) = result {
                let _ = event_tx
                    .send(ServerEvent::Error { message: error.to_string() });
            }
        }
        ClientEvent::OptionUpdate(patch) => {
            route(state, player_id, RoomAction::UpdateOption(patch)).await;
        }
        ClientEvent::GameStart { options } => {
            route(state, player_id, RoomAction::Start(options)).await;
        }
        ClientEvent::GameStop => {
            route(state, player_id, RoomAction::Stop).await;
        }
        ClientEvent::TileReveal { x, y } => {
            route(state, player_id, RoomAction::Reveal { x, y }).await;
        }
    }
}

async fn route(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    action: RoomAction,
) {
    state.registry.lock().await.dispatch(player_id, action).await;
}
