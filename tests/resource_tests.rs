//! Resource-model invariants: TP bounds, draw limits, discard semantics.

use rand::SeedableRng;
use rand_pcg::Lcg64Xsh32;
use topic_duel::battle::resources::{
    discard_card, draw_cards, gain_tp, restore_tp_for_new_turn, shuffle_deck, spend_tp, SpendTp,
    TpRestore,
};
use topic_duel::battle::{BattleState, Side};
use topic_duel::catalog::{sample_cards, sample_skills};
use topic_duel::config::BattleConfig;
use topic_duel::session::sample_setups;

fn test_battle(seed: u8) -> BattleState {
    let config = BattleConfig::default();
    let cards = sample_cards();
    let skills = sample_skills();
    let (side_a, side_b) = sample_setups();
    let mut rng = Lcg64Xsh32::from_seed([seed; 16]);
    BattleState::setup(&config, &cards, &skills, side_a, side_b, &mut rng)
        .expect("setup should succeed")
}

#[test]
fn tp_stays_in_bounds_over_mixed_gain_spend_sequences() {
    let mut battle = test_battle(1);
    let player = battle.player_mut(Side::Player);
    player.max_tp = 7;
    player.tp = 3;

    let operations: [(bool, u32); 10] = [
        (true, 5),
        (false, 2),
        (true, 90),
        (false, 100),
        (false, 7),
        (true, 1),
        (false, 1),
        (true, 0),
        (false, 0),
        (true, 12),
    ];
    for (is_gain, amount) in operations {
        if is_gain {
            gain_tp(player, amount);
        } else {
            let _ = spend_tp(player, amount);
        }
        assert!(player.tp <= player.max_tp, "tp exceeded max_tp");
    }
}

#[test]
fn restore_examples_from_the_rulebook() {
    let mut battle = test_battle(2);

    let player = battle.player_mut(Side::Player);
    player.tp = 0;
    player.max_tp = 2;
    assert_eq!(
        restore_tp_for_new_turn(player, 2),
        TpRestore {
            new_tp: 3,
            new_max_tp: 3
        }
    );

    let player = battle.player_mut(Side::Opponent);
    player.tp = 5;
    player.max_tp = 5;
    assert_eq!(
        restore_tp_for_new_turn(player, 1),
        TpRestore {
            new_tp: 2,
            new_max_tp: 2
        }
    );
}

#[test]
fn spend_is_rejected_without_mutation_when_short() {
    let mut battle = test_battle(3);
    let player = battle.player_mut(Side::Player);
    player.max_tp = 4;
    player.tp = 2;
    let before = player.clone();
    assert_eq!(
        spend_tp(player, 3),
        SpendTp::Insufficient {
            required: 3,
            available: 2
        }
    );
    assert_eq!(*player, before);
}

#[test]
fn draw_never_overfills_hand_or_underflows_deck() {
    let config = BattleConfig::default();
    let mut battle = test_battle(4);
    let player = battle.player_mut(Side::Player);
    let total = player.card_count();

    // Request the whole deck: the hand cap stops the draw partway.
    let deck_size = player.deck.len();
    let report = draw_cards(player, deck_size, config.max_hand_size);
    assert!(report.stopped_by_hand_cap);
    assert_eq!(player.hand.len(), config.max_hand_size);
    assert_eq!(player.card_count(), total, "draws must conserve cards");

    // Request more than the deck holds: the draw is a logged no-op.
    let hand_before = player.hand.len();
    let report = draw_cards(player, player.deck.len() + 1, config.max_hand_size);
    assert!(report.drawn.is_empty());
    assert!(report.deck_exhausted);
    assert_eq!(player.hand.len(), hand_before);
    assert_eq!(player.card_count(), total);
}

#[test]
fn discard_conserves_total_cards() {
    let mut battle = test_battle(5);
    let player = battle.player_mut(Side::Player);
    let total = player.card_count();
    let card_id = player.hand[0];
    assert!(discard_card(player, card_id));
    assert_eq!(player.card_count(), total);
    assert!(player.discard_pile.contains(&card_id));
}

#[test]
fn shuffle_is_a_bijection_and_positions_spread_over_trials() {
    let mut battle = test_battle(6);
    let player = battle.player_mut(Side::Player);
    player.deck = (0..10).collect();
    player.hand.clear();

    // Multiset preserved on every shuffle; over many trials every card
    // shows up at position 0 at least once.
    let mut seen_first: std::collections::HashSet<usize> = std::collections::HashSet::new();
    for seed in 0..200u8 {
        let mut rng = Lcg64Xsh32::from_seed([seed; 16]);
        shuffle_deck(player, &mut rng);
        let mut sorted = player.deck.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
        seen_first.insert(player.deck[0]);
    }
    assert_eq!(
        seen_first.len(),
        10,
        "every card should reach the top of the deck across 200 shuffles"
    );
}
