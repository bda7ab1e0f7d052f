//! Error types for the room layer.
//!
//! Two families: [`RoomError`] covers registry routing failures
//! (reported to the requester as an `error` event) and
//! [`AdmissionError`] covers reveal-gate refusals (also requester-only,
//! never broadcast, never a state change). Host-only violations are not
//! errors at all; they are silently dropped at the boundary.
//!
//! The `Display` strings double as the client-facing `error{message}`
//! payloads, so they are phrased for players, not logs.

use mineclash_protocol::RoomId;

/// Errors from registry and room-handle operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room exists under this code.
    #[error("Room not found")]
    NotFound(RoomId),

    /// All eight player slots are taken.
    #[error("Room full")]
    RoomFull(RoomId),

    /// The room's command channel is gone (actor shut down mid-request).
    #[error("Room no longer available")]
    Unavailable(RoomId),
}

/// Refusals of a reveal request, checked in order before any board
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    /// No round is running, or the round already ended.
    #[error("Not started or already over")]
    NotActive,

    /// The requester joined mid-round and is not frozen into the
    /// participant list; they can act next round.
    #[error("Game already started. You can't participate in this round.")]
    NotParticipant,

    /// Turn mode: somebody else holds the turn.
    #[error("Not your turn")]
    NotYourTurn,

    /// Coordinates outside the board.
    #[error("Tile out of range")]
    OutOfRange,
}
