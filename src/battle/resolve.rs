//! Combat resolver: classifies an attack/defense exchange, applies the
//! configured outcome table atomically to both sides and drives the phase
//! machine forward.
//!
//! Classification is by tag identity only; synergy bonuses change effective
//! strength, never the match category. The resolver assumes actions were
//! pre-validated (the `play_*` entry points here do that gating) — by the
//! time deltas apply there is no failure path left.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{AnimeCard, CardCatalog, CardId, EffectTrigger, SkillCatalog, SkillId};
use crate::config::BattleConfig;

use super::resources::SpendTp;
use super::skills::{self, EffectContext, EffectExecutor};
use super::{resources, synergy};
use super::{BattleOutcome, BattlePhase, BattleState, EngineError, Side};

/// How the attacker frames the take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum AttackStyle {
    Friendly,
    Harsh,
}

/// How the defender answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum DefenseResponse {
    Agree,
    Disagree,
}

/// Relationship between the attacking and defending cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum MatchCategory {
    SameCard,
    SameTag,
    Different,
}

/// An attack waiting for the defender's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PendingAttack {
    pub side: Side,
    pub card_id: CardId,
    pub style: AttackStyle,
    pub lane: usize,
}

/// The defender's answer: a response stance and optionally a card played
/// into the contested lane. A card-less `Agree` is the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DefenseAction {
    pub response: DefenseResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
}

/// Classify the matchup. Identity beats tags; a card-less defense is
/// `Different`.
pub fn classify_match(
    attack_card_id: CardId,
    attack_card: &AnimeCard,
    defense: Option<(CardId, &AnimeCard)>,
) -> MatchCategory {
    match defense {
        Some((defense_card_id, _)) if defense_card_id == attack_card_id => MatchCategory::SameCard,
        Some((_, defense_card)) if attack_card.shares_tag_with(defense_card) => {
            MatchCategory::SameTag
        }
        _ => MatchCategory::Different,
    }
}

/// TP cost of attacking with `card_id` in `style`, after deck discounts.
pub fn attack_cost(
    state: &BattleState,
    side: Side,
    card_id: CardId,
    style: AttackStyle,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> u32 {
    let style_cost = match style {
        AttackStyle::Friendly => config.style_costs.friendly,
        AttackStyle::Harsh => config.style_costs.harsh,
    };
    state.player(side).current_cost(card_id, cards) + style_cost
}

/// TP cost of a defense: the card's cost (if any) plus the disagree
/// surcharge.
pub fn defense_cost(
    state: &BattleState,
    side: Side,
    defense: &DefenseAction,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> u32 {
    let card_cost = defense
        .card_id
        .map(|id| state.player(side).current_cost(id, cards))
        .unwrap_or(0);
    let response_cost = match defense.response {
        DefenseResponse::Agree => 0,
        DefenseResponse::Disagree => config.style_costs.disagree,
    };
    card_cost + response_cost
}

fn fire_hooks(
    state: &mut BattleState,
    side: Side,
    card_id: CardId,
    trigger: EffectTrigger,
    cards: &CardCatalog,
    config: &BattleConfig,
    executor: &mut dyn EffectExecutor,
) {
    let hooks: Vec<String> = cards
        .anime(card_id)
        .map(|card| {
            card.effects
                .iter()
                .filter(|hook| hook.trigger == trigger)
                .map(|hook| hook.effect_id.clone())
                .collect()
        })
        .unwrap_or_default();
    for effect_id in hooks {
        executor.execute(
            &effect_id,
            EffectContext {
                side,
                trigger,
                source_card: Some(card_id),
                config,
            },
            state,
        );
    }
}

/// Put a card from hand into a lane and run its play-time synergy. The card
/// copy moves hand -> discard for conservation; the lane holds a reference.
fn place_card(
    state: &mut BattleState,
    side: Side,
    card_id: CardId,
    lane: usize,
    config: &BattleConfig,
    cards: &CardCatalog,
    executor: &mut dyn EffectExecutor,
) {
    resources::discard_card(state.player_mut(side), card_id);
    state.player_mut(side).lanes[lane].push(card_id);

    fire_hooks(state, side, card_id, EffectTrigger::OnPlay, cards, config, executor);

    let combo_bonus = synergy::apply_play_rules(state, card_id, cards, &config.synergy_rules);
    if combo_bonus > 0 {
        let name = state.player(side).name.clone();
        let card = cards.get(card_id).map(|c| c.name().to_string()).unwrap_or_default();
        state.log_line(format!(
            "{} keeps the streak going: {} gains +{}",
            name, card, combo_bonus
        ));
    }
    synergy::refresh_field_bonuses(state, cards, &config.synergy_rules);
}

/// The active side plays an attack card into a lane. Validates turn, phase,
/// ownership and affordability, then commits and hands the turn to the
/// defender.
pub fn play_attack(
    state: &mut BattleState,
    side: Side,
    card_id: CardId,
    style: AttackStyle,
    lane: usize,
    config: &BattleConfig,
    cards: &CardCatalog,
    executor: &mut dyn EffectExecutor,
) -> Result<(), EngineError> {
    state.ensure_turn(side, BattlePhase::Action)?;
    if lane >= config.lane_count {
        return Err(EngineError::InvalidLane { lane });
    }
    if !state.player(side).hand_contains(card_id) {
        return Err(EngineError::CardNotInHand { card_id });
    }
    if cards.get(card_id).is_none() {
        return Err(EngineError::UnknownCard { card_id });
    }
    if cards.anime(card_id).is_none() {
        return Err(EngineError::NotAnAnimeCard { card_id });
    }
    let cost = attack_cost(state, side, card_id, style, config, cards);
    if let SpendTp::Insufficient {
        required,
        available,
    } = resources::spend_tp(state.player_mut(side), cost)
    {
        return Err(EngineError::InsufficientTp {
            required,
            available,
        });
    }

    place_card(state, side, card_id, lane, config, cards, executor);

    let name = state.player(side).name.clone();
    let card = cards.get(card_id).map(|c| c.name().to_string()).unwrap_or_default();
    let stance = match style {
        AttackStyle::Friendly => "praises",
        AttackStyle::Harsh => "attacks",
    };
    state.log_line(format!("{} {} {} in lane {}", name, stance, card, lane));

    state.pending_attack = Some(PendingAttack {
        side,
        card_id,
        style,
        lane,
    });
    state.phase = BattlePhase::Defense;
    Ok(())
}

/// The defender answers the pending attack; the exchange then resolves and
/// the turn passes.
pub fn play_defense(
    state: &mut BattleState,
    defense: DefenseAction,
    config: &BattleConfig,
    cards: &CardCatalog,
    skill_catalog: &SkillCatalog,
    executor: &mut dyn EffectExecutor,
) -> Result<(), EngineError> {
    if state.is_finished() {
        return Err(EngineError::BattleFinished);
    }
    if state.phase != BattlePhase::Defense {
        return Err(EngineError::WrongPhase {
            expected: BattlePhase::Defense,
            actual: state.phase,
        });
    }
    let attack = state
        .pending_attack
        .clone()
        .ok_or(EngineError::NoPendingAttack)?;
    let defender = attack.side.opposite();

    if let Some(card_id) = defense.card_id {
        if !state.player(defender).hand_contains(card_id) {
            return Err(EngineError::CardNotInHand { card_id });
        }
        if cards.anime(card_id).is_none() {
            return Err(EngineError::NotAnAnimeCard { card_id });
        }
    }
    let cost = defense_cost(state, defender, &defense, config, cards);
    if let SpendTp::Insufficient {
        required,
        available,
    } = resources::spend_tp(state.player_mut(defender), cost)
    {
        return Err(EngineError::InsufficientTp {
            required,
            available,
        });
    }

    if let Some(card_id) = defense.card_id {
        place_card(state, defender, card_id, attack.lane, config, cards, executor);
    }

    resolve_exchange(state, &attack, &defense, config, cards, skill_catalog, executor);
    Ok(())
}

/// Resolve one exchange: passives and before-hooks fire, the outcome table
/// cell applies atomically to both sides, after-hooks and draws follow,
/// then the turn passes unless the battle ended.
fn resolve_exchange(
    state: &mut BattleState,
    attack: &PendingAttack,
    defense: &DefenseAction,
    config: &BattleConfig,
    cards: &CardCatalog,
    skill_catalog: &SkillCatalog,
    executor: &mut dyn EffectExecutor,
) {
    let attacker = attack.side;
    let defender = attacker.opposite();

    for side in [attacker, defender] {
        if let Some(effect_id) = skills::passive_effect_id(state.player(side), cards, skill_catalog)
        {
            executor.execute(
                &effect_id,
                EffectContext {
                    side,
                    trigger: EffectTrigger::BeforeResolve,
                    source_card: state.player(side).active_character(),
                    config,
                },
                state,
            );
        }
    }
    fire_hooks(
        state,
        attacker,
        attack.card_id,
        EffectTrigger::BeforeResolve,
        cards,
        config,
        executor,
    );
    if let Some(card_id) = defense.card_id {
        fire_hooks(
            state,
            defender,
            card_id,
            EffectTrigger::BeforeResolve,
            cards,
            config,
            executor,
        );
    }

    let category = match cards.anime(attack.card_id) {
        Some(attack_card) => {
            let defense_pair = defense
                .card_id
                .and_then(|id| cards.anime(id).map(|card| (id, card)));
            classify_match(attack.card_id, attack_card, defense_pair)
        }
        None => MatchCategory::Different,
    };
    let entry = config
        .outcome_table
        .entry(attack.style, category, defense.response)
        .clone();

    // Atomic settlement: both prestige deltas land before anything else.
    state.player_mut(attacker).reputation += entry.prestige[0];
    state.player_mut(defender).reputation += entry.prestige[1];

    for (side, delta) in [(attacker, entry.tp[0]), (defender, entry.tp[1])] {
        let player = state.player_mut(side);
        if delta >= 0 {
            resources::gain_tp(player, delta as u32);
        } else {
            player.tp = player.tp.saturating_sub((-delta) as u32);
        }
    }

    let bias_delta = match attacker {
        Side::Player => entry.bias,
        Side::Opponent => -entry.bias,
    };
    state.shift_topic_bias(bias_delta, config.bias_win);

    let attack_card_name = cards
        .get(attack.card_id)
        .map(|c| c.name().to_string())
        .unwrap_or_default();
    let defense_card_name = defense
        .card_id
        .and_then(|id| cards.get(id))
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| "nothing".to_string());
    let line = entry
        .log_template
        .replace("{attacker}", &state.player(attacker).name)
        .replace("{defender}", &state.player(defender).name)
        .replace("{attack_card}", &attack_card_name)
        .replace("{defense_card}", &defense_card_name);
    state.log_line(line);

    fire_hooks(
        state,
        attacker,
        attack.card_id,
        EffectTrigger::AfterResolve,
        cards,
        config,
        executor,
    );
    if let Some(card_id) = defense.card_id {
        fire_hooks(
            state,
            defender,
            card_id,
            EffectTrigger::AfterResolve,
            cards,
            config,
            executor,
        );
    }

    for (side, count) in [(attacker, entry.draws[0]), (defender, entry.draws[1])] {
        if count > 0 {
            resources::draw_cards(state.player_mut(side), count as usize, config.max_hand_size);
        }
    }

    state.pending_attack = None;
    state.phase = BattlePhase::EndTurn;
    if !state.check_win(config) {
        next_turn(state, config, cards);
    }
}

/// The active side uses its character's active skill during the action
/// phase.
pub fn play_skill(
    state: &mut BattleState,
    side: Side,
    skill_id: SkillId,
    config: &BattleConfig,
    skill_catalog: &SkillCatalog,
    executor: &mut dyn EffectExecutor,
) -> Result<(), EngineError> {
    state.ensure_turn(side, BattlePhase::Action)?;
    let skill = skill_catalog
        .get(skill_id)
        .ok_or(EngineError::UnknownSkill { skill_id })?
        .clone();
    if skill.skill_type != crate::catalog::SkillType::Active {
        return Err(EngineError::WrongSkillType { skill_id });
    }
    if let Some(remaining) = state.player(side).skill_cooldowns.get(&skill_id) {
        if *remaining > 0 {
            return Err(EngineError::SkillOnCooldown {
                skill_id,
                remaining: *remaining,
            });
        }
    }
    if state.player(side).tp < skill.cost {
        return Err(EngineError::InsufficientTp {
            required: skill.cost,
            available: state.player(side).tp,
        });
    }
    debug_assert!(skills::can_use_skill(state.player(side), skill_id, &skill));
    skills::use_skill(state, side, skill_id, &skill, config, executor);
    Ok(())
}

/// The active side rotates its character during the action phase.
pub fn play_rotation(
    state: &mut BattleState,
    side: Side,
    index: usize,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> Result<(), EngineError> {
    state.ensure_turn(side, BattlePhase::Action)?;
    resources::rotate_character(
        state.player_mut(side),
        index,
        config.max_rotations_per_turn,
    )?;
    let name = state.player(side).name.clone();
    let character = state
        .player(side)
        .active_character()
        .and_then(|id| cards.get(id))
        .map(|c| c.name().to_string())
        .unwrap_or_default();
    state.log_line(format!("{} brings {} forward", name, character));
    Ok(())
}

/// The active side passes without attacking.
pub fn end_turn(
    state: &mut BattleState,
    side: Side,
    config: &BattleConfig,
    cards: &CardCatalog,
) -> Result<(), EngineError> {
    state.ensure_turn(side, BattlePhase::Action)?;
    let name = state.player(side).name.clone();
    state.log_line(format!("{} lets the topic rest", name));
    state.phase = BattlePhase::EndTurn;
    if !state.check_win(config) {
        next_turn(state, config, cards);
    }
    Ok(())
}

/// Hand the turn to the other side: increments `turn`, enforces the round
/// limit (a draw once `max_rounds` exchanges have been played) and runs the
/// new side's draw phase.
pub fn next_turn(state: &mut BattleState, config: &BattleConfig, cards: &CardCatalog) {
    state.active_side = state.active_side.opposite();
    state.turn += 1;
    if state.turn > config.max_rounds {
        state.outcome = BattleOutcome::Draw;
        state.phase = BattlePhase::GameOver;
        state.log_line(format!(
            "Round limit of {} reached: the debate ends in a draw",
            config.max_rounds
        ));
        return;
    }
    state.begin_turn(config, cards);
}
