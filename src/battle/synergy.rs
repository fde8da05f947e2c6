//! Synergy engine: deck-level cost discounts, field-level lane bonuses and
//! play-level combo bonuses.
//!
//! Rules are data, dispatched by variant. All bonus effects are additive
//! into the shared ledger, so evaluation order within a rule class never
//! changes totals — only the order of audit-trail lines. Deck rules run
//! once at battle start, field rules on every lane mutation, play rules
//! exactly once per card play.

use std::collections::HashMap;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{CardCatalog, CardId};

use super::{BattleState, CardBonus, Side};

/// One tier of a deck-count discount. Non-stacking: the highest tier whose
/// threshold is met replaces the lower ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CostTier {
    pub min_count: usize,
    pub cost_reduction: u32,
}

/// Deck-level rule: count deck cards carrying `tag`, discount every card
/// carrying it once a tier threshold is crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DeckCountRule {
    pub tag: String,
    pub tiers: Vec<CostTier>,
    pub description: String,
}

/// Field-level rules, evaluated per lane on every board change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "rule")]
pub enum FieldRule {
    /// Two or more cards of `tag` in one lane each gain `bonus`.
    LanePresence {
        tag: String,
        min_count: usize,
        bonus: i64,
        description: String,
    },
    /// Cards of `tag` facing a `counters` card in the same lane gain
    /// `bonus` — the countering side only, every occupant of the tag.
    Counter {
        tag: String,
        counters: String,
        bonus: i64,
        description: String,
    },
}

/// Play-level rule: the Nth consecutive tag-sharing play gains
/// `step * (N - 1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ComboRule {
    pub step: i64,
    pub description: String,
}

/// A synergy rule, tagged by the class that decides when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "class")]
pub enum SynergyRule {
    Deck(DeckCountRule),
    Field(FieldRule),
    Play(ComboRule),
}

/// Add into the ledger — always adds, never overwrites — and append the
/// audit reason.
pub fn add_bonus(
    bonuses: &mut HashMap<CardId, CardBonus>,
    card_id: CardId,
    amount: i64,
    reason: impl Into<String>,
) {
    let entry = bonuses.entry(card_id).or_default();
    entry.total += amount;
    entry.reasons.push(reason.into());
}

/// Apply deck-level rules for both sides. Runs once at battle start, before
/// any draws, and writes discounts into the per-battle overlays.
pub fn apply_deck_rules(state: &mut BattleState, catalog: &CardCatalog, rules: &[SynergyRule]) {
    for side in [Side::Player, Side::Opponent] {
        for rule in rules {
            let SynergyRule::Deck(rule) = rule else {
                continue;
            };
            let player = state.player(side);
            let tagged = player
                .deck
                .iter()
                .chain(player.hand.iter())
                .filter(|&&id| {
                    catalog
                        .anime(id)
                        .map(|card| card.has_tag(&rule.tag))
                        .unwrap_or(false)
                })
                .count();
            let reduction = rule
                .tiers
                .iter()
                .filter(|tier| tagged >= tier.min_count)
                .map(|tier| tier.cost_reduction)
                .max()
                .unwrap_or(0);
            if reduction == 0 {
                continue;
            }
            let name = player.name.clone();
            let player = state.player_mut(side);
            let mut discounted = 0usize;
            for (&card_id, overlay) in player.overlays.iter_mut() {
                let has_tag = catalog
                    .anime(card_id)
                    .map(|card| card.has_tag(&rule.tag))
                    .unwrap_or(false);
                if has_tag {
                    overlay.current_cost = overlay.current_cost.saturating_sub(reduction);
                    overlay.is_buffed = true;
                    discounted += 1;
                }
            }
            state.log_line(format!(
                "{}: {} ({} '{}' cards, -{} cost on {} cards)",
                name, rule.description, tagged, rule.tag, reduction, discounted
            ));
        }
    }
}

/// Rebuild the bonus ledger from the field rules and the current lanes,
/// then fold the accumulated play-level awards back in. Called eagerly on
/// every mutation that can change lane composition.
pub fn refresh_field_bonuses(state: &mut BattleState, catalog: &CardCatalog, rules: &[SynergyRule]) {
    let mut bonuses: HashMap<CardId, CardBonus> = HashMap::new();

    for rule in rules {
        let SynergyRule::Field(rule) = rule else {
            continue;
        };
        match rule {
            FieldRule::LanePresence {
                tag,
                min_count,
                bonus,
                description,
            } => {
                for side in [Side::Player, Side::Opponent] {
                    for lane in &state.player(side).lanes {
                        let tagged: Vec<CardId> = lane
                            .iter()
                            .copied()
                            .filter(|&id| {
                                catalog
                                    .anime(id)
                                    .map(|card| card.has_tag(tag))
                                    .unwrap_or(false)
                            })
                            .collect();
                        if tagged.len() >= *min_count {
                            for card_id in tagged {
                                add_bonus(&mut bonuses, card_id, *bonus, description.clone());
                            }
                        }
                    }
                }
            }
            FieldRule::Counter {
                tag,
                counters,
                bonus,
                description,
            } => {
                for side in [Side::Player, Side::Opponent] {
                    let opponent = state.player(side.opposite());
                    for (lane_index, lane) in state.player(side).lanes.iter().enumerate() {
                        let countering: Vec<CardId> = lane
                            .iter()
                            .copied()
                            .filter(|&id| {
                                catalog
                                    .anime(id)
                                    .map(|card| card.has_tag(tag))
                                    .unwrap_or(false)
                            })
                            .collect();
                        if countering.is_empty() {
                            continue;
                        }
                        let faced = opponent
                            .lanes
                            .get(lane_index)
                            .map(|opposing| {
                                opposing.iter().any(|&id| {
                                    catalog
                                        .anime(id)
                                        .map(|card| card.has_tag(counters))
                                        .unwrap_or(false)
                                })
                            })
                            .unwrap_or(false);
                        if faced {
                            for card_id in countering {
                                add_bonus(&mut bonuses, card_id, *bonus, description.clone());
                            }
                        }
                    }
                }
            }
        }
    }

    for (&card_id, award) in &state.play_awards {
        let entry = bonuses.entry(card_id).or_default();
        entry.total += award.total;
        entry.reasons.extend(award.reasons.iter().cloned());
    }

    state.bonuses = bonuses;
}

/// Run the play-level rules for one card play: advance the combo streak and
/// award the streak bonus. Runs exactly once per play, immediately after
/// the play; the award is retained so ledger recomputation keeps it.
pub fn apply_play_rules(
    state: &mut BattleState,
    card_id: CardId,
    catalog: &CardCatalog,
    rules: &[SynergyRule],
) -> i64 {
    let tags = catalog
        .anime(card_id)
        .map(|card| card.synergy_tags.clone())
        .unwrap_or_default();
    let shares = tags
        .iter()
        .any(|tag| state.combo.last_tags.contains(tag));
    if shares {
        state.combo.count += 1;
    } else {
        state.combo.count = 0;
    }
    state.combo.last_tags = tags;

    let mut total = 0i64;
    for rule in rules {
        let SynergyRule::Play(rule) = rule else {
            continue;
        };
        let bonus = rule.step * i64::from(state.combo.count);
        if bonus > 0 {
            add_bonus(
                &mut state.play_awards,
                card_id,
                bonus,
                format!("{} x{}", rule.description, state.combo.count + 1),
            );
            total += bonus;
        }
    }
    total
}

/// A card's effective strength: overlay points plus every bonus the ledger
/// holds for it.
pub fn effective_points(
    state: &BattleState,
    side: Side,
    card_id: CardId,
    catalog: &CardCatalog,
) -> i64 {
    let base = state.player(side).current_points(card_id, catalog);
    let bonus = state
        .bonuses
        .get(&card_id)
        .map(|entry| entry.total)
        .unwrap_or(0);
    base + bonus
}
