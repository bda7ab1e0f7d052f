//! Wire protocol for Mineclash.
//!
//! Defines the language that clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`TileUpdate`], ids) —
//!   the event structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are
//!   converted to/from frame bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about rooms or sockets; it only
//! defines shapes. See the crate-level docs on `mineclash-room` for how
//! events are produced and routed.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, GameStateSnapshot, MinesRange, Mode, OptionPatch, PlayerId,
    PlayerSlot, Recipient, RoomId, ServerEvent, TileState, TileUpdate,
};
