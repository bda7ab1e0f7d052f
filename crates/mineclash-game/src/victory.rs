//! Victory math over the shared mine pool.
//!
//! Scoring is mines-found, and every mine a chaser claims is a mine the
//! leader can no longer claim. Both computations here lean on that: the
//! "needed to clinch" count halves the gap-plus-pool, and the
//! no-comeback check ends the round the moment the lead exceeds the
//! whole remaining pool.

use std::collections::HashMap;

use mineclash_protocol::PlayerId;

/// Why and for whom a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// `None` when the top score is tied.
    pub winner: Option<PlayerId>,
    pub reason: String,
}

/// Scoreboard entries sorted by score, best first. Players appear once
/// they have revealed anything, including zero-score safe revealers.
fn ranked(scores: &HashMap<PlayerId, u32>) -> Vec<(PlayerId, u32)> {
    let mut sorted: Vec<(PlayerId, u32)> =
        scores.iter().map(|(&id, &score)| (id, score)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// For each player, the minimum number of additional mines they must
/// find to be guaranteed first place no matter how the rest of the pool
/// is distributed. Zero means the player has already clinched.
///
/// The leader is measured against the runner-up; everyone else against
/// the leader. For a gap `top - s` and `mines_left` in the pool, the
/// bound is `floor((top - s + mines_left) / 2) + 1`, clamped at zero.
/// Floor division (toward negative infinity): the numerator goes
/// negative once a player has clinched.
pub fn victory_info(
    scores: &HashMap<PlayerId, u32>,
    total_mines: u32,
) -> HashMap<PlayerId, u32> {
    let found: u32 = scores.values().sum();
    let mines_left = i64::from(total_mines.saturating_sub(found));

    let sorted = ranked(scores);
    let Some(&(first_id, first_score)) = sorted.first() else {
        return HashMap::new();
    };
    let second_score = sorted.get(1).map_or(0, |&(_, s)| s);

    scores
        .iter()
        .map(|(&id, &score)| {
            let top = if id == first_id { second_score } else { first_score };
            let needed = (i64::from(top) - i64::from(score) + mines_left)
                .div_euclid(2)
                + 1;
            (id, needed.max(0) as u32)
        })
        .collect()
}

/// Checks whether the round is decided. Run after every reveal, not
/// only mine hits: safe reveals shrink `mines_left` too and can flip
/// the no-comeback bound.
///
/// 1. **No-comeback**: with two or more scored players, the leader wins
///    immediately once `first > second + mines_left`.
/// 2. **Exhaustion**: once every mine is found, the unique top scorer
///    wins; a shared top score is a tie.
///
/// The no-comeback check takes priority when both would fire.
pub fn check_termination(
    scores: &HashMap<PlayerId, u32>,
    total_mines: u32,
) -> Option<RoundOutcome> {
    let found: u32 = scores.values().sum();
    let mines_left = total_mines.saturating_sub(found);
    let sorted = ranked(scores);

    if sorted.len() >= 2 {
        let (first_id, first_score) = sorted[0];
        let second_score = sorted[1].1;
        if first_score > second_score + mines_left {
            return Some(RoundOutcome {
                winner: Some(first_id),
                reason: format!(
                    "no possible comeback: {first_score} > {second_score} + {mines_left}"
                ),
            });
        }
    }

    if found == total_mines && total_mines > 0 {
        let Some(&(first_id, first_score)) = sorted.first() else {
            return Some(RoundOutcome {
                winner: None,
                reason: "all mines found".into(),
            });
        };
        let tied = sorted.iter().filter(|&&(_, s)| s == first_score).count();
        return Some(if tied > 1 {
            RoundOutcome {
                winner: None,
                reason: "all mines found: tied for most".into(),
            }
        } else {
            RoundOutcome {
                winner: Some(first_id),
                reason: "all mines found: most mines claimed".into(),
            }
        });
    }

    None
}
