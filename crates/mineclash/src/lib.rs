//! # Mineclash
//!
//! Competitive multiplayer minesweeper over WebSockets: players share
//! one seeded board, race to reveal tiles, and score by detonating
//! mines. Rounds run either in strict turn rotation or free-for-all
//! with per-player lockouts.
//!
//! This crate is the outermost layer: the TCP/WebSocket boundary and
//! process bootstrap. Game rules live in `mineclash-game`, room
//! lifecycle and scheduling in `mineclash-room`, and the wire format in
//! `mineclash-protocol`.

mod error;
mod gateway;
mod server;

pub use error::ServerError;
pub use server::MineclashServer;
