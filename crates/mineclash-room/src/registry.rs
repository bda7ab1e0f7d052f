//! Room registry: creates rooms, routes player actions, reclaims empty
//! rooms.
//!
//! Process-scoped state owned by the server (behind its lock) and
//! injected where needed, never a module-level singleton. Enforces the
//! one-room-per-player invariant: creating or joining a room first
//! removes the player from wherever they were.

use std::collections::HashMap;

use mineclash_protocol::{OptionPatch, PlayerId, RoomId};

use crate::room::{PlayerSender, RoomAction, RoomHandle, spawn_room};
use crate::options::generate_room_code;
use crate::RoomError;

/// Fallback display name for a room creator.
const DEFAULT_HOST_NAME: &str = "P1";

/// Fallback display name for a joiner.
const DEFAULT_GUEST_NAME: &str = "P2";

/// Maps room codes to live room actors and players to their room.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomHandle>,
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self { rooms: HashMap::new(), player_rooms: HashMap::new() }
    }

    /// Creates a room with `host` as its first member and returns the
    /// join code. The host's client receives `room:created` through its
    /// sender.
    pub async fn create_room(
        &mut self,
        host: PlayerId,
        name: Option<String>,
        options: &OptionPatch,
        sender: PlayerSender,
    ) -> RoomId {
        self.leave_current(host).await;

        let mut room_id = generate_room_code();
        while self.rooms.contains_key(&room_id) {
            room_id = generate_room_code();
        }

        let handle = spawn_room(
            room_id.clone(),
            host,
            name.unwrap_or_else(|| DEFAULT_HOST_NAME.into()),
            options,
            sender,
        );
        self.rooms.insert(room_id.clone(), handle);
        self.player_rooms.insert(host, room_id.clone());
        tracing::info!(%room_id, host = %host, "room created");
        room_id
    }

    /// Adds a player to an existing room. Rejoining the current room
    /// re-syncs it instead of bouncing through a leave (which could
    /// reclaim a solo room out from under the player).
    pub async fn join_room(
        &mut self,
        player: PlayerId,
        room_id: RoomId,
        name: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if !self.rooms.contains_key(&room_id) {
            return Err(RoomError::NotFound(room_id));
        }
        if self.player_rooms.get(&player) != Some(&room_id) {
            self.leave_current(player).await;
        }

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle
            .join(
                player,
                name.unwrap_or_else(|| DEFAULT_GUEST_NAME.into()),
                sender,
            )
            .await?;
        self.player_rooms.insert(player, room_id);
        Ok(())
    }

    /// Routes an action to the player's current room. Actions from
    /// players without a room are dropped; their client is stale.
    pub async fn dispatch(&self, player: PlayerId, action: RoomAction) {
        let Some(room_id) = self.player_rooms.get(&player) else {
            tracing::debug!(player = %player, "action from player with no room");
            return;
        };
        let Some(handle) = self.rooms.get(room_id) else {
            return;
        };
        if handle.act(player, action).await.is_err() {
            tracing::debug!(%room_id, "action routed to a dead room");
        }
    }

    /// Removes the player from their current room, if any, reclaiming
    /// the room when they were its last member.
    pub async fn leave_current(&mut self, player: PlayerId) {
        let Some(room_id) = self.player_rooms.remove(&player) else {
            return;
        };
        let Some(handle) = self.rooms.get(&room_id) else {
            return;
        };
        match handle.leave(player).await {
            Ok(outcome) if !outcome.empty => {}
            // Empty or already-dead rooms get reclaimed either way.
            _ => self.reclaim(&room_id).await,
        }
    }

    /// Transport-level disconnect: same cleanup as an explicit leave.
    pub async fn disconnect(&mut self, player: PlayerId) {
        self.leave_current(player).await;
    }

    async fn reclaim(&mut self, room_id: &RoomId) {
        if let Some(handle) = self.rooms.remove(room_id) {
            handle.shutdown().await;
            self.player_rooms.retain(|_, rid| rid != room_id);
            tracing::info!(%room_id, "room reclaimed");
        }
    }

    /// The room a player is currently in, if any.
    pub fn player_room(&self, player: PlayerId) -> Option<&RoomId> {
        self.player_rooms.get(&player)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
