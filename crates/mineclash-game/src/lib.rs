//! Game rules for Mineclash: deterministic board generation, the
//! reveal/flood-fill pipeline, per-round session state, and the victory
//! math over the shared mine pool.
//!
//! Everything here is pure, synchronous logic. Timing, admission control,
//! and broadcasting live in `mineclash-room`.
//!
//! # Key types
//!
//! - [`GameSession`] — one round's mutable state
//! - [`GameConfig`] — resolved settings for a round
//! - [`mine_positions`] — seed → mine set (wire-normative)
//! - [`victory_info`] / [`check_termination`] — scoreboard math

mod board;
mod session;
mod victory;

pub use board::{
    Lcg, Tile, adjacent_mines, create_board_seed, mine_positions, neighbors,
};
pub use session::{GameConfig, GameSession, RevealError, RevealOutcome};
pub use victory::{RoundOutcome, check_termination, victory_info};
