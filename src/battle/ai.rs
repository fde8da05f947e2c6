//! AI opponent: pure decision functions over the same resource and bonus
//! model the resolver scores against.
//!
//! Every action returned here is legal and affordable at decision time —
//! the resolver does not re-validate AI output. Strategy selection is the
//! only randomness, drawn from the session RNG so decisions are
//! reproducible from a seed.

use std::str::FromStr;

use rand::Rng;
use rand_pcg::Lcg64Xsh32;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{AnimeCard, CardCatalog, CardId};
use crate::config::BattleConfig;

use super::resolve::{
    attack_cost, classify_match, defense_cost, AttackStyle, DefenseAction, DefenseResponse,
    MatchCategory, PendingAttack,
};
use super::{BattleState, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum AiStrategy {
    Aggressive,
    Conservative,
    Balanced,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aggressive" | "aggro" => Ok(AiStrategy::Aggressive),
            "conservative" | "control" => Ok(AiStrategy::Conservative),
            "balanced" => Ok(AiStrategy::Balanced),
            _ => Err(()),
        }
    }
}

/// An attack-phase decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "action")]
pub enum AiAction {
    Play {
        card_id: CardId,
        style: AttackStyle,
        lane: usize,
    },
    EndTurn,
}

/// Hand cards playable with `style` given current TP, cheapest-cost overlay
/// values included.
fn affordable_attacks(
    state: &BattleState,
    side: Side,
    style: AttackStyle,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> Vec<CardId> {
    let player = state.player(side);
    player
        .hand
        .iter()
        .copied()
        .filter(|&id| cards.anime(id).is_some())
        .filter(|&id| attack_cost(state, side, id, style, config, cards) <= player.tp)
        .collect()
}

/// Lane placement heuristic: join a lane already holding one of our
/// same-tag cards (field synergy), otherwise the emptiest lane. Ties break
/// toward the lowest index so decisions are deterministic.
fn choose_lane(state: &BattleState, side: Side, card_id: CardId, cards: &CardCatalog) -> usize {
    let player = state.player(side);
    let Some(card) = cards.anime(card_id) else {
        return 0;
    };
    for (index, lane) in player.lanes.iter().enumerate() {
        let tag_mate = lane.iter().any(|&id| {
            cards
                .anime(id)
                .map(|other| other.shares_tag_with(card))
                .unwrap_or(false)
        });
        if tag_mate {
            return index;
        }
    }
    player
        .lanes
        .iter()
        .enumerate()
        .min_by_key(|(index, lane)| (lane.len(), *index))
        .map(|(index, _)| index)
        .unwrap_or(0)
}

fn aggressive(
    state: &BattleState,
    side: Side,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> AiAction {
    let candidates = affordable_attacks(state, side, AttackStyle::Harsh, config, cards);
    let best = candidates.into_iter().min_by_key(|&id| {
        let points = state.player(side).current_points(id, cards);
        (std::cmp::Reverse(points), id)
    });
    match best {
        Some(card_id) => AiAction::Play {
            card_id,
            style: AttackStyle::Harsh,
            lane: choose_lane(state, side, card_id, cards),
        },
        None => AiAction::EndTurn,
    }
}

fn conservative(
    state: &BattleState,
    side: Side,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> AiAction {
    let opponent_reputation = state.player(side.opposite()).reputation;
    if opponent_reputation >= config.ai.close_to_winning {
        return AiAction::EndTurn;
    }
    let candidates = affordable_attacks(state, side, AttackStyle::Friendly, config, cards);
    let cheapest = candidates
        .into_iter()
        .min_by_key(|&id| (state.player(side).current_cost(id, cards), id));
    match cheapest {
        Some(card_id) => AiAction::Play {
            card_id,
            style: AttackStyle::Friendly,
            lane: choose_lane(state, side, card_id, cards),
        },
        None => AiAction::EndTurn,
    }
}

fn balanced(
    state: &BattleState,
    side: Side,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> AiAction {
    let player = state.player(side);
    let has_high_value = player
        .hand
        .iter()
        .any(|&id| player.current_points(id, cards) >= config.ai.high_value_points);
    if player.tp > config.ai.high_tp && has_high_value {
        aggressive(state, side, config, cards)
    } else {
        conservative(state, side, config, cards)
    }
}

/// Pick an attack-phase action. The strategy is `pinned` when given,
/// otherwise drawn uniformly from the three named strategies.
pub fn decide_attack(
    state: &BattleState,
    side: Side,
    config: &BattleConfig,
    cards: &CardCatalog,
    rng: &mut Lcg64Xsh32,
    pinned: Option<AiStrategy>,
) -> AiAction {
    let strategy = pinned.unwrap_or_else(|| match rng.gen_range(0..3u8) {
        0 => AiStrategy::Aggressive,
        1 => AiStrategy::Conservative,
        _ => AiStrategy::Balanced,
    });
    match strategy {
        AiStrategy::Aggressive => aggressive(state, side, config, cards),
        AiStrategy::Conservative => conservative(state, side, config, cards),
        AiStrategy::Balanced => balanced(state, side, config, cards),
    }
}

fn match_quality(category: MatchCategory) -> u8 {
    match category {
        MatchCategory::SameCard => 2,
        MatchCategory::SameTag => 1,
        MatchCategory::Different => 0,
    }
}

/// Pick a defense. Prefers disagreeing with the best counter (same card >
/// same tag > higher points), accepts the disagree only when the counter is
/// at least a tag match or meets the points floor, and otherwise agrees
/// with the lowest-value affordable card — or with no card at all, the pass
/// that still counts as a response.
pub fn decide_defense(
    state: &BattleState,
    side: Side,
    attack: &PendingAttack,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> DefenseAction {
    let player = state.player(side);
    let Some(attack_card) = cards.anime(attack.card_id) else {
        return DefenseAction {
            response: DefenseResponse::Agree,
            card_id: None,
        };
    };

    let disagree_candidates: Vec<(CardId, &AnimeCard)> = player
        .hand
        .iter()
        .filter_map(|&id| cards.anime(id).map(|card| (id, card)))
        .filter(|&(id, _)| {
            let action = DefenseAction {
                response: DefenseResponse::Disagree,
                card_id: Some(id),
            };
            defense_cost(state, side, &action, config, cards) <= player.tp
        })
        .collect();

    let best_counter = disagree_candidates.into_iter().min_by_key(|&(id, card)| {
        let quality = match_quality(classify_match(attack.card_id, attack_card, Some((id, card))));
        let points = player.current_points(id, cards);
        (std::cmp::Reverse(quality), std::cmp::Reverse(points), id)
    });

    if let Some((card_id, card)) = best_counter {
        let quality = match_quality(classify_match(
            attack.card_id,
            attack_card,
            Some((card_id, card)),
        ));
        let points = player.current_points(card_id, cards);
        if quality >= match_quality(MatchCategory::SameTag) || points >= config.ai.disagree_floor {
            return DefenseAction {
                response: DefenseResponse::Disagree,
                card_id: Some(card_id),
            };
        }
    }

    let agree_card = player
        .hand
        .iter()
        .copied()
        .filter(|&id| cards.anime(id).is_some())
        .filter(|&id| player.current_cost(id, cards) <= player.tp)
        .min_by_key(|&id| (player.current_points(id, cards), id));

    DefenseAction {
        response: DefenseResponse::Agree,
        card_id: agree_card,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BattleState;
    use crate::catalog::{sample_cards, sample_skills};
    use crate::session::sample_setups;
    use rand::SeedableRng;

    fn test_battle() -> (BattleState, BattleConfig, CardCatalog) {
        let config = BattleConfig::default();
        let cards = sample_cards();
        let skills = sample_skills();
        let (side_a, side_b) = sample_setups();
        let mut rng = Lcg64Xsh32::from_seed([21u8; 16]);
        let battle = BattleState::setup(&config, &cards, &skills, side_a, side_b, &mut rng)
            .expect("setup should succeed");
        (battle, config, cards)
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("aggressive".parse(), Ok(AiStrategy::Aggressive));
        assert_eq!("Control".parse(), Ok(AiStrategy::Conservative));
        assert_eq!("BALANCED".parse(), Ok(AiStrategy::Balanced));
        assert!("berserk".parse::<AiStrategy>().is_err());
    }

    #[test]
    fn aggressive_only_plays_affordable_cards() {
        let (mut battle, config, cards) = test_battle();
        battle.player_mut(Side::Opponent).tp = 3;
        let action = aggressive(&battle, Side::Opponent, &config, &cards);
        if let AiAction::Play { card_id, style, .. } = action {
            assert_eq!(style, AttackStyle::Harsh);
            let cost = attack_cost(&battle, Side::Opponent, card_id, style, &config, &cards);
            assert!(cost <= 3);
        }
    }

    #[test]
    fn aggressive_with_no_tp_ends_the_turn() {
        let (mut battle, config, cards) = test_battle();
        battle.player_mut(Side::Opponent).tp = 0;
        assert_eq!(
            aggressive(&battle, Side::Opponent, &config, &cards),
            AiAction::EndTurn
        );
    }

    #[test]
    fn conservative_backs_off_when_opponent_is_close_to_winning() {
        let (mut battle, config, cards) = test_battle();
        battle.player_mut(Side::Opponent).tp = 10;
        battle.player_mut(Side::Opponent).max_tp = 10;
        battle.player_mut(Side::Player).reputation = config.ai.close_to_winning;
        assert_eq!(
            conservative(&battle, Side::Opponent, &config, &cards),
            AiAction::EndTurn
        );
    }

    #[test]
    fn pinned_strategy_bypasses_the_rng() {
        let (mut battle, config, cards) = test_battle();
        battle.player_mut(Side::Opponent).tp = 10;
        battle.player_mut(Side::Opponent).max_tp = 10;
        let mut rng_a = Lcg64Xsh32::from_seed([1u8; 16]);
        let mut rng_b = Lcg64Xsh32::from_seed([200u8; 16]);
        let a = decide_attack(
            &battle,
            Side::Opponent,
            &config,
            &cards,
            &mut rng_a,
            Some(AiStrategy::Aggressive),
        );
        let b = decide_attack(
            &battle,
            Side::Opponent,
            &config,
            &cards,
            &mut rng_b,
            Some(AiStrategy::Aggressive),
        );
        assert_eq!(a, b);
    }
}
