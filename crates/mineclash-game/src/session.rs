//! Per-round mutable state: the revealed set, scores, and replay log.

use std::collections::{HashMap, HashSet};

use mineclash_protocol::{GameStateSnapshot, Mode, PlayerId, TileUpdate};

use crate::board::{self, Tile};

/// Resolved settings for one round. Produced by the room layer from its
/// sticky per-room settings plus a fresh seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub width: u32,
    pub height: u32,
    pub mines: u32,
    pub seed: u32,
    pub mode: Mode,
    pub stun_small: u32,
    pub stun_big: u32,
    pub turn_seconds: u32,
}

/// Result of revealing a fresh tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealOutcome {
    /// Every tile that became visible, in reveal order. A single entry
    /// for mines and numbered tiles; the whole cascade for zero tiles.
    pub updates: Vec<TileUpdate>,
    /// Whether the revealed tile was a mine.
    pub hit_mine: bool,
}

/// Non-fatal reveal failures. Repeated clicks on the same tile are
/// expected under network latency, so this is a result, not a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RevealError {
    #[error("Already revealed")]
    AlreadyRevealed,
}

/// One round of competitive minesweeper.
///
/// Replaced wholesale on every (re)start, never reset in place. The
/// mine set is derived lazily from the seed and cached; `revealed` only
/// ever grows, and `revealed_log` is the append-only record replayed to
/// late joiners.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub width: u32,
    pub height: u32,
    pub mine_count: u32,
    pub seed: u32,
    pub mode: Mode,
    pub stun_small: u32,
    pub stun_big: u32,
    pub turn_seconds: u32,
    pub started: bool,
    pub over: bool,
    pub revealed: HashSet<Tile>,
    /// Mines detonated per player. A safe reveal still creates the
    /// player's entry (at zero) so they show up on the scoreboard.
    pub scores: HashMap<PlayerId, u32>,
    pub winner: Option<PlayerId>,
    pub over_reason: Option<String>,
    revealed_log: Vec<TileUpdate>,
    mines: Option<HashSet<Tile>>,
}

impl GameSession {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            mine_count: config.mines,
            seed: config.seed,
            mode: config.mode,
            stun_small: config.stun_small,
            stun_big: config.stun_big,
            turn_seconds: config.turn_seconds,
            started: false,
            over: false,
            revealed: HashSet::new(),
            scores: HashMap::new(),
            winner: None,
            over_reason: None,
            revealed_log: Vec::new(),
            mines: None,
        }
    }

    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Mines in the shared pool not yet found.
    pub fn mines_left(&self) -> u32 {
        self.mine_count
            .saturating_sub(self.scores.values().sum::<u32>())
    }

    /// The replay log for late joiners, in reveal order.
    pub fn revealed_log(&self) -> &[TileUpdate] {
        &self.revealed_log
    }

    /// Reveals `(x, y)` for `player`.
    ///
    /// A mine hit scores the player one point and never cascades. A safe
    /// tile reports its adjacency count and, at zero, flood-fills its
    /// connected region with an explicit work stack; mines are never
    /// auto-revealed and no tile is visited twice. Coordinates must be
    /// in bounds; the room layer rejects out-of-range requests before
    /// calling in.
    pub fn reveal(
        &mut self,
        player: PlayerId,
        x: u32,
        y: u32,
    ) -> Result<RevealOutcome, RevealError> {
        if self.revealed.contains(&(x, y)) {
            return Err(RevealError::AlreadyRevealed);
        }

        let (width, height) = (self.width, self.height);
        // Mine set is derived from the seed on first need and cached.
        if self.mines.is_none() {
            self.mines = Some(board::mine_positions(
                self.seed,
                self.width,
                self.height,
                self.mine_count,
            ));
        }
        let mines = self.mines.as_ref().expect("just populated");

        let is_mine = mines.contains(&(x, y));
        self.revealed.insert((x, y));
        *self.scores.entry(player).or_insert(0) += u32::from(is_mine);

        if is_mine {
            let update = TileUpdate::boom(x, y);
            self.revealed_log.push(update);
            return Ok(RevealOutcome { updates: vec![update], hit_mine: true });
        }

        let value = board::adjacent_mines(mines, width, height, x, y);
        let mut updates = vec![TileUpdate::revealed(x, y, value)];

        if value == 0 {
            let mut stack = board::neighbors(width, height, x, y);
            while let Some((cx, cy)) = stack.pop() {
                if self.revealed.contains(&(cx, cy)) || mines.contains(&(cx, cy))
                {
                    continue;
                }
                self.revealed.insert((cx, cy));
                let v = board::adjacent_mines(mines, width, height, cx, cy);
                updates.push(TileUpdate::revealed(cx, cy, v));
                if v == 0 {
                    stack.extend(board::neighbors(width, height, cx, cy));
                }
            }
        }

        self.revealed_log.extend_from_slice(&updates);
        Ok(RevealOutcome { updates, hit_mine: false })
    }

    /// Full state for a `game:state` broadcast. The turn holder lives in
    /// the room, so it is passed in.
    pub fn snapshot(&self, turn_player: Option<PlayerId>) -> GameStateSnapshot {
        GameStateSnapshot {
            seed: self.seed,
            width: self.width,
            height: self.height,
            mines: self.mine_count,
            started: self.started,
            turn_player,
            mode: self.mode,
            stun_small: self.stun_small,
            stun_big: self.stun_big,
            turn_seconds: self.turn_seconds,
        }
    }
}
