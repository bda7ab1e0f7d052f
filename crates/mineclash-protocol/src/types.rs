//! Wire types for Mineclash.
//!
//! Every inbound and outbound event is one internally tagged JSON object:
//! the `type` field carries the event name (`"room:create"`,
//! `"tile:update"`, ...) and the remaining fields are the payload in
//! camelCase. Clients re-derive the board from the broadcast seed, so
//! these shapes are the complete synchronization contract.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Identity is the transport connection: the server assigns one id per
/// accepted connection and there is no separate account concept.
/// `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room's join code: six lowercase alphanumeric characters, shown to
/// players so they can invite each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Room logic produces `(Recipient, ServerEvent)` pairs; the room actor
/// resolves each recipient against its player roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Send to every player in the room.
    All,
    /// Send to one specific player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Game payload fragments
// ---------------------------------------------------------------------------

/// Scheduling discipline for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Strict rotation: exactly one player may reveal, on a countdown.
    #[default]
    Turn,
    /// Free-for-all with per-player lockouts after successful reveals.
    Realtime,
}

/// How a tile ended up visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileState {
    /// Safe tile; `value` is the adjacent mine count.
    Revealed,
    /// Detonated mine; `value` is always -1.
    Boom,
}

/// One tile becoming visible. These records are broadcast live and also
/// appended to the round's replay log for late joiners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileUpdate {
    pub x: u32,
    pub y: u32,
    pub state: TileState,
    /// Adjacent mine count, or -1 for a detonated mine.
    pub value: i8,
}

impl TileUpdate {
    /// Update for a safe tile with the given adjacency count.
    pub fn revealed(x: u32, y: u32, value: u8) -> Self {
        Self { x, y, state: TileState::Revealed, value: value as i8 }
    }

    /// Update for a detonated mine.
    pub fn boom(x: u32, y: u32) -> Self {
        Self { x, y, state: TileState::Boom, value: -1 }
    }
}

/// Inclusive range for the randomized mine-count draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinesRange {
    pub min: u32,
    pub max: u32,
}

/// Partial round settings: every field is optional, unset fields inherit
/// the previous round's value when a round starts. This is both the
/// `option:update` payload and the options attached to `room:create` /
/// `game:start`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mines_range: Option<MinesRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stun_small: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stun_big: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_seconds: Option<u32>,
}

/// Full game state as broadcast in `game:state`. Enough for a client to
/// reconstruct the board (from the seed) and its HUD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateSnapshot {
    pub seed: u32,
    pub width: u32,
    pub height: u32,
    pub mines: u32,
    pub started: bool,
    pub turn_player: Option<PlayerId>,
    pub mode: Mode,
    pub stun_small: u32,
    pub stun_big: u32,
    pub turn_seconds: u32,
}

/// One roster entry in `room:joined`. `idx` is the join order and doubles
/// as the client-side color slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub id: PlayerId,
    pub name: String,
    pub idx: usize,
}

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// Events a client sends to the server. Disconnects are transport-level
/// and have no event of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Create a room and become its host.
    #[serde(rename = "room:create")]
    RoomCreate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(flatten)]
        options: OptionPatch,
    },

    /// Join an existing room by its code.
    #[serde(rename = "room:join")]
    RoomJoin {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Host relays pending settings to the whole room.
    #[serde(rename = "option:update")]
    OptionUpdate(OptionPatch),

    /// Host starts (or restarts) a round.
    #[serde(rename = "game:start")]
    GameStart {
        #[serde(flatten)]
        options: OptionPatch,
    },

    /// Host aborts the current round.
    #[serde(rename = "game:stop")]
    GameStop,

    /// Attempt to reveal a tile.
    #[serde(rename = "tile:reveal")]
    TileReveal { x: u32, y: u32 },
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Unicast to the creator: the room exists, here is its code.
    #[serde(rename = "room:created")]
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    /// Broadcast on every join: the full roster in join order.
    /// `can_participate` is false when a round is already running;
    /// the joiner spectates until the next round.
    #[serde(rename = "room:joined")]
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: RoomId,
        players: Vec<PlayerSlot>,
        host_id: PlayerId,
        can_participate: bool,
    },

    /// Broadcast full game state (on join, start, and stop).
    #[serde(rename = "game:state")]
    GameState(GameStateSnapshot),

    /// Relay of the host's pending settings.
    #[serde(rename = "option:update")]
    OptionUpdate(OptionPatch),

    /// A tile became visible. `owner` attributes the reveal for cosmetic
    /// effects; replayed log entries carry no owner.
    #[serde(rename = "tile:update")]
    TileUpdate {
        #[serde(flatten)]
        update: TileUpdate,
        #[serde(skip_serializing_if = "Option::is_none")]
        owner: Option<PlayerId>,
    },

    /// Scoreboard after a reveal: mines found per player, how many more
    /// each player needs to clinch, and the shared pool left.
    #[serde(rename = "score:update")]
    #[serde(rename_all = "camelCase")]
    ScoreUpdate {
        scores: HashMap<PlayerId, u32>,
        victory_info: HashMap<PlayerId, u32>,
        mines_left: u32,
    },

    /// Turn mode: whose turn it now is.
    #[serde(rename = "turn:update")]
    #[serde(rename_all = "camelCase")]
    TurnUpdate { turn_player: Option<PlayerId> },

    /// Turn mode: countdown restarted with this many seconds. Realtime
    /// rounds broadcast a zero reset at start for UI symmetry.
    #[serde(rename = "timer:reset")]
    TimerReset { remaining: u32 },

    /// Unicast to a player who just got locked out.
    #[serde(rename = "stun:start")]
    StunStart { duration: u32 },

    /// Broadcast notice that a player is locked out.
    #[serde(rename = "stun:state")]
    #[serde(rename_all = "camelCase")]
    StunState { player_id: PlayerId, duration: u32 },

    /// Unicast instead of accepting a reveal while locked out.
    #[serde(rename = "stun:active")]
    StunActive { remaining: u32 },

    /// The round ended. `winner` is absent on a tie.
    #[serde(rename = "game:over")]
    GameOver {
        winner: Option<PlayerId>,
        reason: String,
    },

    /// Unicast rejection of a request; never broadcast except for the
    /// informational "Opponent left" notice.
    #[serde(rename = "error")]
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire shapes are shared with browser clients, so these tests
    //! pin the exact JSON: tag names with colons, camelCase fields,
    //! transparent ids, and absent-not-null optional fields.

    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId("k3x9ab".into())).unwrap();
        assert_eq!(json, "\"k3x9ab\"");
    }

    #[test]
    fn test_mode_uses_uppercase_names() {
        assert_eq!(serde_json::to_string(&Mode::Turn).unwrap(), "\"TURN\"");
        assert_eq!(
            serde_json::to_string(&Mode::Realtime).unwrap(),
            "\"REALTIME\""
        );
    }

    #[test]
    fn test_tile_update_json_shape() {
        let json = serde_json::to_value(TileUpdate::boom(3, 4)).unwrap();
        assert_eq!(json["x"], 3);
        assert_eq!(json["y"], 4);
        assert_eq!(json["state"], "boom");
        assert_eq!(json["value"], -1);

        let json = serde_json::to_value(TileUpdate::revealed(0, 1, 5)).unwrap();
        assert_eq!(json["state"], "revealed");
        assert_eq!(json["value"], 5);
    }

    #[test]
    fn test_client_event_tag_names() {
        let json = serde_json::to_value(&ClientEvent::TileReveal { x: 1, y: 2 })
            .unwrap();
        assert_eq!(json["type"], "tile:reveal");
        assert_eq!(json["x"], 1);

        let json = serde_json::to_value(&ClientEvent::GameStop).unwrap();
        assert_eq!(json["type"], "game:stop");
    }

    #[test]
    fn test_room_create_flattens_options() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"room:create","name":"P1","width":9,"height":9,"mines":10}"#,
        )
        .unwrap();
        match event {
            ClientEvent::RoomCreate { name, options } => {
                assert_eq!(name.as_deref(), Some("P1"));
                assert_eq!(options.width, Some(9));
                assert_eq!(options.mines, Some(10));
                assert_eq!(options.mode, None);
            }
            other => panic!("expected RoomCreate, got {other:?}"),
        }
    }

    #[test]
    fn test_room_create_with_no_fields() {
        // A bare create is valid: every option has a server-side default.
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"room:create"}"#).unwrap();
        assert!(matches!(
            event,
            ClientEvent::RoomCreate { name: None, options } if options == OptionPatch::default()
        ));
    }

    #[test]
    fn test_option_patch_mines_range_round_trip() {
        let patch = OptionPatch {
            mines_range: Some(MinesRange { min: 31, max: 51 }),
            mode: Some(Mode::Realtime),
            ..OptionPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["minesRange"]["min"], 31);
        assert_eq!(json["mode"], "REALTIME");
        // Unset fields are absent, not null.
        assert!(json.get("width").is_none());

        let back: OptionPatch = serde_json::from_value(json).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn test_game_state_json_shape() {
        let snapshot = GameStateSnapshot {
            seed: 7,
            width: 16,
            height: 16,
            mines: 41,
            started: true,
            turn_player: Some(PlayerId(3)),
            mode: Mode::Turn,
            stun_small: 3,
            stun_big: 10,
            turn_seconds: 10,
        };
        let json = serde_json::to_value(ServerEvent::GameState(snapshot)).unwrap();
        assert_eq!(json["type"], "game:state");
        assert_eq!(json["turnPlayer"], 3);
        assert_eq!(json["stunSmall"], 3);
        assert_eq!(json["turnSeconds"], 10);
        assert_eq!(json["mode"], "TURN");
    }

    #[test]
    fn test_tile_update_event_owner_present_and_absent() {
        let json = serde_json::to_value(ServerEvent::TileUpdate {
            update: TileUpdate::revealed(1, 2, 0),
            owner: Some(PlayerId(9)),
        })
        .unwrap();
        assert_eq!(json["type"], "tile:update");
        assert_eq!(json["owner"], 9);

        // Replayed log entries have no owner field at all.
        let json = serde_json::to_value(ServerEvent::TileUpdate {
            update: TileUpdate::revealed(1, 2, 0),
            owner: None,
        })
        .unwrap();
        assert!(json.get("owner").is_none());
    }

    #[test]
    fn test_score_update_uses_stringified_id_keys() {
        let mut scores = HashMap::new();
        scores.insert(PlayerId(1), 3u32);
        let mut victory_info = HashMap::new();
        victory_info.insert(PlayerId(1), 0u32);

        let json = serde_json::to_value(ServerEvent::ScoreUpdate {
            scores,
            victory_info,
            mines_left: 2,
        })
        .unwrap();
        assert_eq!(json["type"], "score:update");
        assert_eq!(json["scores"]["1"], 3);
        assert_eq!(json["victoryInfo"]["1"], 0);
        assert_eq!(json["minesLeft"], 2);
    }

    #[test]
    fn test_game_over_tie_has_null_winner() {
        let json = serde_json::to_value(ServerEvent::GameOver {
            winner: None,
            reason: "all mines found: tied for most".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "game:over");
        assert!(json["winner"].is_null());
    }

    #[test]
    fn test_room_joined_round_trip() {
        let event = ServerEvent::RoomJoined {
            room_id: RoomId("abc123".into()),
            players: vec![
                PlayerSlot { id: PlayerId(1), name: "P1".into(), idx: 0 },
                PlayerSlot { id: PlayerId(2), name: "P2".into(), idx: 1 },
            ],
            host_id: PlayerId(1),
            can_participate: false,
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["hostId"], 1);
        assert_eq!(json["canParticipate"], false);
        assert_eq!(json["players"][1]["idx"], 1);
    }

    #[test]
    fn test_decode_unknown_event_type_returns_error() {
        let unknown = r#"{"type": "tile:paint", "x": 1, "y": 2}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_slice(b"not json at all");
        assert!(result.is_err());
    }
}
