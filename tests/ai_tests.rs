//! AI strategy guarantees: only legal, affordable actions, threshold
//! behavior, and seed-determinism.

use rand::SeedableRng;
use rand_pcg::Lcg64Xsh32;
use topic_duel::battle::ai::{decide_attack, decide_defense, AiAction, AiStrategy};
use topic_duel::battle::resolve::{attack_cost, AttackStyle, DefenseResponse, PendingAttack};
use topic_duel::battle::{BattleState, Side};
use topic_duel::catalog::{sample_cards, sample_skills, CardCatalog};
use topic_duel::config::BattleConfig;
use topic_duel::session::sample_setups;

fn battle_with_seed(seed: u8) -> (BattleState, BattleConfig, CardCatalog) {
    let config = BattleConfig::default();
    let cards = sample_cards();
    let skills = sample_skills();
    let (side_a, side_b) = sample_setups();
    let mut rng = Lcg64Xsh32::from_seed([seed; 16]);
    let battle = BattleState::setup(&config, &cards, &skills, side_a, side_b, &mut rng)
        .expect("setup should succeed");
    (battle, config, cards)
}

#[test]
fn aggressive_never_returns_an_unaffordable_card() {
    for seed in 0..25u8 {
        let (mut battle, config, cards) = battle_with_seed(seed);
        battle.player_mut(Side::Player).tp = u32::from(seed % 8);
        let mut rng = Lcg64Xsh32::from_seed([seed; 16]);
        let action = decide_attack(
            &battle,
            Side::Player,
            &config,
            &cards,
            &mut rng,
            Some(AiStrategy::Aggressive),
        );
        if let AiAction::Play {
            card_id,
            style,
            lane,
        } = action
        {
            assert_eq!(style, AttackStyle::Harsh);
            assert!(battle.player(Side::Player).hand_contains(card_id));
            assert!(
                attack_cost(&battle, Side::Player, card_id, style, &config, &cards)
                    <= battle.player(Side::Player).tp
            );
            assert!(lane < config.lane_count);
        }
    }
}

#[test]
fn aggressive_picks_the_highest_value_affordable_card() {
    let (mut battle, config, cards) = battle_with_seed(3);
    // Card 4 has 9 points (cost 5), card 8 has 2 points (cost 1).
    battle.player_mut(Side::Player).hand = vec![8, 4];
    battle.player_mut(Side::Player).tp = 10;
    let mut rng = Lcg64Xsh32::from_seed([0u8; 16]);
    let action = decide_attack(
        &battle,
        Side::Player,
        &config,
        &cards,
        &mut rng,
        Some(AiStrategy::Aggressive),
    );
    assert!(matches!(action, AiAction::Play { card_id: 4, .. }));
}

#[test]
fn conservative_never_attacks_a_leader_close_to_winning() {
    for seed in 0..10u8 {
        let (mut battle, config, cards) = battle_with_seed(seed);
        battle.player_mut(Side::Opponent).tp = 10;
        battle.player_mut(Side::Opponent).max_tp = 10;
        battle.player_mut(Side::Player).reputation = config.ai.close_to_winning;
        let mut rng = Lcg64Xsh32::from_seed([seed; 16]);
        let action = decide_attack(
            &battle,
            Side::Opponent,
            &config,
            &cards,
            &mut rng,
            Some(AiStrategy::Conservative),
        );
        assert_eq!(action, AiAction::EndTurn);
    }
}

#[test]
fn conservative_plays_the_cheapest_friendly_card() {
    let (mut battle, config, cards) = battle_with_seed(4);
    // Card 8 costs 1, card 4 costs 5.
    battle.player_mut(Side::Player).hand = vec![4, 8];
    battle.player_mut(Side::Player).tp = 10;
    let mut rng = Lcg64Xsh32::from_seed([0u8; 16]);
    let action = decide_attack(
        &battle,
        Side::Player,
        &config,
        &cards,
        &mut rng,
        Some(AiStrategy::Conservative),
    );
    assert!(matches!(
        action,
        AiAction::Play {
            card_id: 8,
            style: AttackStyle::Friendly,
            ..
        }
    ));
}

fn pending(card_id: usize) -> PendingAttack {
    PendingAttack {
        side: Side::Player,
        card_id,
        style: AttackStyle::Harsh,
        lane: 0,
    }
}

#[test]
fn defense_disagrees_with_a_tag_matching_counter() {
    let (mut battle, config, cards) = battle_with_seed(5);
    // Attack: card 0 (mecha/action). Card 13 shares "mecha".
    battle.player_mut(Side::Opponent).hand = vec![1, 13];
    battle.player_mut(Side::Opponent).tp = 10;
    let defense = decide_defense(&battle, Side::Opponent, &pending(0), &config, &cards);
    assert_eq!(defense.response, DefenseResponse::Disagree);
    assert_eq!(defense.card_id, Some(13));
}

#[test]
fn defense_agrees_with_the_lowest_value_card_when_counters_are_weak() {
    let (mut battle, config, cards) = battle_with_seed(6);
    // Attack: card 0 (mecha/action). Cards 1 (5 pts) and 8 (2 pts) share no
    // tag with it and both sit under the 8-point disagree floor.
    battle.player_mut(Side::Opponent).hand = vec![1, 8];
    battle.player_mut(Side::Opponent).tp = 10;
    let defense = decide_defense(&battle, Side::Opponent, &pending(0), &config, &cards);
    assert_eq!(defense.response, DefenseResponse::Agree);
    assert_eq!(defense.card_id, Some(8));
}

#[test]
fn defense_disagrees_with_an_unrelated_card_above_the_points_floor() {
    let (mut battle, config, cards) = battle_with_seed(7);
    // Attack: card 3 (comedy/slice_of_life). Card 4 (action/drama, 9 pts)
    // is unrelated but clears the floor.
    battle.player_mut(Side::Opponent).hand = vec![4];
    battle.player_mut(Side::Opponent).tp = 10;
    let defense = decide_defense(&battle, Side::Opponent, &pending(3), &config, &cards);
    assert_eq!(defense.response, DefenseResponse::Disagree);
    assert_eq!(defense.card_id, Some(4));
}

#[test]
fn defense_with_no_affordable_action_is_a_card_less_agree() {
    let (mut battle, config, cards) = battle_with_seed(8);
    battle.player_mut(Side::Opponent).hand = vec![4, 13];
    battle.player_mut(Side::Opponent).tp = 0;
    let defense = decide_defense(&battle, Side::Opponent, &pending(0), &config, &cards);
    assert_eq!(defense.response, DefenseResponse::Agree);
    assert_eq!(defense.card_id, None);
}

#[test]
fn unpinned_decisions_replay_under_the_same_seed() {
    let decide = |seed: [u8; 16]| {
        let (mut battle, config, cards) = battle_with_seed(9);
        battle.player_mut(Side::Player).tp = 10;
        let mut rng = Lcg64Xsh32::from_seed(seed);
        decide_attack(&battle, Side::Player, &config, &cards, &mut rng, None)
    };
    assert_eq!(decide([42u8; 16]), decide([42u8; 16]));
}
