//! Sticky per-room settings and their merge rules.
//!
//! A room keeps one [`RoundSettings`] across rounds. Every `game:start`
//! merges the request's explicit fields over it, then resolves a
//! [`GameConfig`] with a fresh seed and, when a mine range is set, a
//! randomized odd-biased mine count.

use mineclash_game::{GameConfig, create_board_seed};
use mineclash_protocol::{MinesRange, Mode, OptionPatch, RoomId};
use rand::Rng;

/// Characters used in room join codes.
const CODE_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a room join code.
const CODE_LEN: usize = 6;

/// The settings a round starts from. Field defaults match the classic
/// 16x16 board with 41 mines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSettings {
    pub width: u32,
    pub height: u32,
    pub mines: u32,
    pub mines_range: Option<MinesRange>,
    pub mode: Mode,
    pub stun_small: u32,
    pub stun_big: u32,
    pub turn_seconds: u32,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            mines: 41,
            mines_range: None,
            mode: Mode::Turn,
            stun_small: 3,
            stun_big: 10,
            turn_seconds: 10,
        }
    }
}

impl RoundSettings {
    /// Overrides each field that the patch sets; unset fields keep the
    /// previous round's value.
    pub fn apply(&mut self, patch: &OptionPatch) {
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(mines) = patch.mines {
            self.mines = mines;
        }
        if let Some(range) = patch.mines_range {
            self.mines_range = Some(range);
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(stun_small) = patch.stun_small {
            self.stun_small = stun_small;
        }
        if let Some(stun_big) = patch.stun_big {
            self.stun_big = stun_big;
        }
        if let Some(turn_seconds) = patch.turn_seconds {
            self.turn_seconds = turn_seconds;
        }
    }

    /// The settings as a fully populated patch, for relaying to clients.
    pub fn as_patch(&self) -> OptionPatch {
        OptionPatch {
            width: Some(self.width),
            height: Some(self.height),
            mines: Some(self.mines),
            mines_range: self.mines_range,
            mode: Some(self.mode),
            stun_small: Some(self.stun_small),
            stun_big: Some(self.stun_big),
            turn_seconds: Some(self.turn_seconds),
        }
    }

    /// Resolves a concrete round config: a fresh seed, and the mine
    /// count drawn from the range when one is set.
    pub fn resolve(&self) -> GameConfig {
        let mines = match self.mines_range {
            Some(range) => pick_odd_mines(range),
            None => self.mines,
        };
        GameConfig {
            width: self.width,
            height: self.height,
            mines,
            seed: create_board_seed(),
            mode: self.mode,
            stun_small: self.stun_small,
            stun_big: self.stun_big,
            turn_seconds: self.turn_seconds,
        }
    }
}

/// Draws a mine count uniformly from the range, nudged to the nearest
/// odd value without leaving the bounds. An odd total rules out tied
/// exhaustion finishes in two-player rounds.
pub fn pick_odd_mines(range: MinesRange) -> u32 {
    let (min, max) = if range.min <= range.max {
        (range.min, range.max)
    } else {
        (range.max, range.min)
    };
    let n = rand::rng().random_range(min..=max);
    if n % 2 == 1 {
        n
    } else if n + 1 <= max {
        n + 1
    } else if n > 0 && n - 1 >= min {
        n - 1
    } else {
        n
    }
}

/// Generates a random six-character join code.
pub(crate) fn generate_room_code() -> RoomId {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect();
    RoomId(code)
}
