//! Resource model: TP economy, hand/deck/discard movement, cooldown timers
//! and character rotation.
//!
//! Every operation is a plain state transition on one `PlayerState`.
//! Shortfalls (not enough TP, empty deck, full hand) are sentinel returns,
//! never errors: callers check the sentinel and decide what to log.

use rand::seq::SliceRandom;
use rand_pcg::Lcg64Xsh32;

use crate::catalog::CardId;

use super::{EngineError, PlayerState};

/// Result of the per-turn TP refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TpRestore {
    pub new_tp: u32,
    pub new_max_tp: u32,
}

/// TP refills to the new cap each turn: `new_max_tp = turn + 1`. Carryover
/// above the cap is clamped away, so a prior windfall never exceeds the cap.
pub fn restore_tp_for_new_turn(player: &mut PlayerState, turn: u32) -> TpRestore {
    let new_max_tp = turn + 1;
    let new_tp = (player.tp + new_max_tp).min(new_max_tp);
    player.max_tp = new_max_tp;
    player.tp = new_tp;
    TpRestore { new_tp, new_max_tp }
}

/// Outcome of a TP spend attempt. On `Insufficient` the player is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendTp {
    Spent(u32),
    Insufficient { required: u32, available: u32 },
}

pub fn spend_tp(player: &mut PlayerState, amount: u32) -> SpendTp {
    if player.tp < amount {
        return SpendTp::Insufficient {
            required: amount,
            available: player.tp,
        };
    }
    player.tp -= amount;
    SpendTp::Spent(player.tp)
}

/// Gain TP, clamped to `max_tp`. Never fails.
pub fn gain_tp(player: &mut PlayerState, amount: u32) -> u32 {
    player.tp = (player.tp + amount).min(player.max_tp);
    player.tp
}

/// What actually happened during a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawReport {
    pub requested: usize,
    pub drawn: Vec<CardId>,
    pub stopped_by_hand_cap: bool,
    pub deck_exhausted: bool,
}

/// Draw `count` cards from deck to hand. A deck holding fewer than `count`
/// cards makes the whole draw a logged no-op (no reshuffle, no fatigue);
/// the hand cap stops the draw early with a partial result instead.
pub fn draw_cards(player: &mut PlayerState, count: usize, max_hand_size: usize) -> DrawReport {
    let mut report = DrawReport {
        requested: count,
        drawn: Vec::new(),
        stopped_by_hand_cap: false,
        deck_exhausted: false,
    };
    if player.deck.len() < count {
        report.deck_exhausted = true;
        log::warn!(
            "{}: deck holds {} of {} requested cards, draw fizzles",
            player.name,
            player.deck.len(),
            count
        );
        return report;
    }
    for _ in 0..count {
        if player.hand.len() >= max_hand_size {
            report.stopped_by_hand_cap = true;
            log::warn!(
                "{}: hand is at the cap of {}, stopping draw",
                player.name,
                max_hand_size
            );
            break;
        }
        match player.deck.pop() {
            Some(card_id) => {
                player.hand.push(card_id);
                report.drawn.push(card_id);
            }
            None => break,
        }
    }
    report
}

/// Move the first matching card from hand to discard. Returns `false`
/// (no-op) when the card is not in hand.
pub fn discard_card(player: &mut PlayerState, card_id: CardId) -> bool {
    match player.hand.iter().position(|&id| id == card_id) {
        Some(index) => {
            player.hand.remove(index);
            player.discard_pile.push(card_id);
            true
        }
        None => false,
    }
}

/// Uniform Fisher–Yates shuffle of the deck.
pub fn shuffle_deck(player: &mut PlayerState, rng: &mut Lcg64Xsh32) {
    player.deck.shuffle(rng);
}

/// Decrement every cooldown and drop entries that reach zero, keeping the
/// invariant that every stored cooldown is strictly positive.
pub fn tick_cooldowns(player: &mut PlayerState) {
    player
        .skill_cooldowns
        .retain(|_, remaining| match remaining.checked_sub(1) {
            Some(0) | None => false,
            Some(rest) => {
                *remaining = rest;
                true
            }
        });
}

/// Swap the active character, bounded per turn. Clears a pending forced
/// rotation.
pub fn rotate_character(
    player: &mut PlayerState,
    index: usize,
    max_rotations: u32,
) -> Result<(), EngineError> {
    if index >= player.characters.len() {
        return Err(EngineError::InvalidCharacterIndex { index });
    }
    if player.rotations_used_this_turn >= max_rotations {
        return Err(EngineError::RotationLimitReached {
            used: player.rotations_used_this_turn,
        });
    }
    player.active_character_index = index;
    player.rotations_used_this_turn += 1;
    player.needs_rotation = false;
    Ok(())
}
