//! Room lifecycle for Mineclash.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! [`GameSession`](mineclash_game::GameSession), its player roster, the
//! turn timer, and the per-round mode handler. The [`RoomRegistry`]
//! maps join codes to live rooms and routes inbound player actions.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates/reclaims rooms, routes players
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomAction`] — the per-room player requests
//! - [`RoundSettings`] — sticky per-room configuration
//! - [`RoomError`] / [`AdmissionError`] — the failure taxonomy

mod error;
mod modes;
mod options;
mod registry;
mod room;

pub use error::{AdmissionError, RoomError};
pub use options::{RoundSettings, pick_odd_mines};
pub use registry::RoomRegistry;
pub use room::{
    LeaveOutcome, MAX_PLAYERS, PlayerSender, RoomAction, RoomHandle,
};
