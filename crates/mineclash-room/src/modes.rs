//! The two scheduling disciplines, as a closed dispatch enum.
//!
//! One handler instance exists per started round and is replaced
//! together with the session on every (re)start. Handlers gate reveal
//! requests and decide the post-reveal effect; the room applies the
//! effects, because the turn timer and the outbound channels live there.

use std::collections::HashMap;
use std::time::Duration;

use mineclash_game::{GameSession, RevealOutcome};
use mineclash_protocol::{Mode, PlayerId};
use tokio::time::Instant;

use crate::AdmissionError;

/// A flood fill bigger than this is a "big open" and earns the long
/// lockout in realtime mode.
const BIG_OPEN_THRESHOLD: usize = 10;

/// Verdict of the mode-specific admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    Admitted,
    /// Reject with an error to the requester.
    Refused(AdmissionError),
    /// Realtime: still locked out; tell the requester how long remains
    /// instead of erroring.
    Locked { remaining: u32 },
}

/// Mode-specific effect to apply after a completed reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AfterReveal {
    /// Turn mode, safe tile: hand the turn to the next participant.
    PassTurn,
    /// Turn mode, mine: same player keeps the turn on a fresh countdown.
    RestartTimer,
    /// Realtime, safe tile: lock the revealer out for `duration` seconds.
    Stun { duration: u32 },
    /// Realtime, mine: no penalty beyond the lost pool mine.
    None,
}

/// Per-round scheduling state.
#[derive(Debug)]
pub(crate) enum ModeHandler {
    Turn,
    Realtime {
        /// Absolute lockout expiry per player. Inserting for a player
        /// who is already locked replaces the old expiry.
        lockouts: HashMap<PlayerId, Instant>,
    },
}

impl ModeHandler {
    pub(crate) fn new(mode: Mode) -> Self {
        match mode {
            Mode::Turn => Self::Turn,
            Mode::Realtime => Self::Realtime { lockouts: HashMap::new() },
        }
    }

    /// Mode-specific admission check. Runs after the shared gates
    /// (round active, participant, in bounds) have passed.
    pub(crate) fn admit(
        &self,
        player: PlayerId,
        turn_player: Option<PlayerId>,
        now: Instant,
    ) -> Gate {
        match self {
            Self::Turn => {
                if turn_player == Some(player) {
                    Gate::Admitted
                } else {
                    Gate::Refused(AdmissionError::NotYourTurn)
                }
            }
            Self::Realtime { lockouts } => match lockouts.get(&player) {
                Some(&expiry) if now < expiry => {
                    let remaining =
                        (expiry - now).as_secs_f64().ceil() as u32;
                    Gate::Locked { remaining }
                }
                _ => Gate::Admitted,
            },
        }
    }

    /// Decides the post-reveal effect and records lockout state.
    pub(crate) fn after_reveal(
        &mut self,
        player: PlayerId,
        outcome: &RevealOutcome,
        session: &GameSession,
        now: Instant,
    ) -> AfterReveal {
        match self {
            Self::Turn => {
                if outcome.hit_mine {
                    AfterReveal::RestartTimer
                } else {
                    AfterReveal::PassTurn
                }
            }
            Self::Realtime { lockouts } => {
                if outcome.hit_mine {
                    return AfterReveal::None;
                }
                let duration = if outcome.updates.len() > BIG_OPEN_THRESHOLD {
                    session.stun_big
                } else {
                    session.stun_small
                };
                lockouts.insert(
                    player,
                    now + Duration::from_secs(u64::from(duration)),
                );
                AfterReveal::Stun { duration }
            }
        }
    }

    /// Cleanup when a player leaves mid-round. Turn passing is the
    /// room's job (it owns the timer); this only drops lockout state.
    pub(crate) fn on_player_left(&mut self, player: PlayerId) {
        if let Self::Realtime { lockouts } = self {
            lockouts.remove(&player);
        }
    }
}
