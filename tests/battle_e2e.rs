//! End-to-end AI-vs-AI battles driven through the session, checking
//! termination, invariants and within-session seed determinism.

use topic_duel::battle::{BattleOutcome, BattlePhase, Side};
use topic_duel::session::BattleSession;

fn run_battle(seed: u64) -> (BattleOutcome, Vec<String>) {
    let mut session = BattleSession::new();
    session.set_seed(seed);
    session.start_battle().expect("battle starts");

    for _ in 0..500 {
        if session
            .battle
            .as_ref()
            .map(|b| b.is_finished())
            .unwrap_or(true)
        {
            break;
        }
        session.ai_take_action(None).expect("ai action is legal");

        let battle = session.battle.as_ref().unwrap();
        let config = &session.config;
        for side in [Side::Player, Side::Opponent] {
            let player = battle.player(side);
            assert!(player.tp <= player.max_tp, "tp invariant violated");
            assert!(
                player.hand.len() <= config.max_hand_size,
                "hand cap violated"
            );
            assert!(player.active_character_index < player.characters.len());
            for remaining in player.skill_cooldowns.values() {
                assert!(*remaining > 0, "expired cooldowns must be removed");
            }
        }
        assert!(battle.topic_bias.abs() <= config.bias_win);
    }

    let battle = session.battle.as_ref().unwrap();
    assert_eq!(battle.phase, BattlePhase::GameOver, "battle must terminate");
    assert_ne!(battle.outcome, BattleOutcome::Undecided);
    (battle.outcome, battle.log.clone())
}

#[test]
fn ai_battles_terminate_for_a_spread_of_seeds() {
    for seed in [0u64, 1, 7, 42, 1234, 99999] {
        run_battle(seed);
    }
}

#[test]
fn the_same_seed_replays_the_same_battle() {
    let (outcome_a, log_a) = run_battle(42);
    let (outcome_b, log_b) = run_battle(42);
    assert_eq!(outcome_a, outcome_b);
    assert_eq!(log_a, log_b);
}

#[test]
fn card_conservation_holds_for_the_whole_battle() {
    let mut session = BattleSession::new();
    session.set_seed(7);
    session.start_battle().expect("battle starts");
    let initial: Vec<usize> = [Side::Player, Side::Opponent]
        .iter()
        .map(|&side| session.battle.as_ref().unwrap().player(side).card_count())
        .collect();

    for _ in 0..500 {
        if session.battle.as_ref().unwrap().is_finished() {
            break;
        }
        session.ai_take_action(None).expect("ai action is legal");
        // Card effects may draw, but drawing moves cards between zones of
        // the same player; the per-player total never changes.
        let battle = session.battle.as_ref().unwrap();
        for (i, &side) in [Side::Player, Side::Opponent].iter().enumerate() {
            assert_eq!(battle.player(side).card_count(), initial[i]);
        }
    }
}
