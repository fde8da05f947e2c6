//! Battle configuration
//!
//! Everything tunable is data injected here: hand/lane/round limits, the
//! full outcome table, the synergy rule set and the AI thresholds. Engine
//! code never hard-codes any of these values; `Default` encodes the
//! standard ruleset the service binary runs with.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::battle::resolve::{AttackStyle, DefenseResponse, MatchCategory};
use crate::battle::synergy::{ComboRule, CostTier, DeckCountRule, FieldRule, SynergyRule};

/// One cell of the outcome table. Delta pairs are `[attacker, defender]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct OutcomeEntry {
    pub prestige: [i64; 2],
    pub tp: [i64; 2],
    pub draws: [u32; 2],
    /// Topic-bias delta in the attacker's favor; negated when the attacker
    /// is the second side so positive bias always favors side A.
    pub bias: i32,
    pub log_template: String,
}

/// Outcomes for a `[match category]` row, split by defender response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ResponseOutcomes {
    pub agree: OutcomeEntry,
    pub disagree: OutcomeEntry,
}

/// Outcomes for one attack style across the three match categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MatchOutcomes {
    pub same_card: ResponseOutcomes,
    pub same_tag: ResponseOutcomes,
    pub different: ResponseOutcomes,
}

/// The full `[style][match category][response]` lookup table. Total by
/// construction: every one of the twelve combinations has an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct OutcomeTable {
    pub friendly: MatchOutcomes,
    pub harsh: MatchOutcomes,
}

impl OutcomeTable {
    pub fn entry(
        &self,
        style: AttackStyle,
        category: MatchCategory,
        response: DefenseResponse,
    ) -> &OutcomeEntry {
        let by_style = match style {
            AttackStyle::Friendly => &self.friendly,
            AttackStyle::Harsh => &self.harsh,
        };
        let by_category = match category {
            MatchCategory::SameCard => &by_style.same_card,
            MatchCategory::SameTag => &by_style.same_tag,
            MatchCategory::Different => &by_style.different,
        };
        match response {
            DefenseResponse::Agree => &by_category.agree,
            DefenseResponse::Disagree => &by_category.disagree,
        }
    }
}

/// TP charged up front for choosing a style or a disagree response. These
/// are the pre-validated spends; the outcome table's TP deltas are
/// settlement on top of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StyleCosts {
    pub friendly: u32,
    pub harsh: u32,
    pub disagree: u32,
}

/// Thresholds steering the AI strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct AiThresholds {
    /// Opponent reputation at or above this counts as "close to winning";
    /// the conservative strategy stops attacking past it.
    pub close_to_winning: i64,
    /// TP above this lets the balanced strategy go aggressive.
    pub high_tp: u32,
    /// A hand card with at least this many points counts as high value.
    pub high_value_points: i64,
    /// Minimum points for a disagree with a merely-different counter card.
    pub disagree_floor: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct BattleConfig {
    pub max_hand_size: usize,
    pub opening_hand: usize,
    pub draws_per_turn: usize,
    pub lane_count: usize,
    pub max_rounds: u32,
    pub max_rotations_per_turn: u32,
    /// Reputation at which a side wins outright.
    pub reputation_win: i64,
    /// Absolute topic bias at which the favored side wins.
    pub bias_win: i32,
    pub style_costs: StyleCosts,
    pub outcome_table: OutcomeTable,
    pub synergy_rules: Vec<SynergyRule>,
    pub ai: AiThresholds,
}

fn entry(
    prestige: [i64; 2],
    tp: [i64; 2],
    draws: [u32; 2],
    bias: i32,
    log_template: &str,
) -> OutcomeEntry {
    OutcomeEntry {
        prestige,
        tp,
        draws,
        bias,
        log_template: log_template.to_string(),
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        BattleConfig {
            max_hand_size: 10,
            opening_hand: 5,
            draws_per_turn: 1,
            lane_count: 3,
            max_rounds: 12,
            max_rotations_per_turn: 1,
            reputation_win: 30,
            bias_win: 10,
            style_costs: StyleCosts {
                friendly: 1,
                harsh: 2,
                disagree: 1,
            },
            outcome_table: OutcomeTable {
                friendly: MatchOutcomes {
                    same_card: ResponseOutcomes {
                        agree: entry(
                            [2, 2],
                            [1, 1],
                            [0, 0],
                            1,
                            "{attacker} and {defender} bond over {attack_card}",
                        ),
                        disagree: entry(
                            [2, 0],
                            [0, -1],
                            [1, 0],
                            2,
                            "{defender} contrarily pans {attack_card} and loses the room",
                        ),
                    },
                    same_tag: ResponseOutcomes {
                        agree: entry(
                            [2, 1],
                            [1, 0],
                            [0, 0],
                            1,
                            "{defender} nods along as {attacker} praises {attack_card}",
                        ),
                        disagree: entry(
                            [1, 1],
                            [0, 0],
                            [0, 1],
                            0,
                            "{defender} counters {attack_card} with {defense_card}",
                        ),
                    },
                    different: ResponseOutcomes {
                        agree: entry(
                            [1, 0],
                            [0, 1],
                            [0, 0],
                            0,
                            "{attacker} pitches {attack_card}; {defender} politely concedes",
                        ),
                        disagree: entry(
                            [0, 2],
                            [0, 0],
                            [0, 1],
                            -1,
                            "{defender} deflects {attack_card} with {defense_card}",
                        ),
                    },
                },
                harsh: MatchOutcomes {
                    same_card: ResponseOutcomes {
                        agree: entry(
                            [3, -2],
                            [0, 0],
                            [0, 0],
                            3,
                            "{attacker} skewers {defender}'s own favorite {attack_card}",
                        ),
                        disagree: entry(
                            [1, 1],
                            [-1, -1],
                            [1, 1],
                            0,
                            "{attacker} and {defender} clash head-on over {attack_card}",
                        ),
                    },
                    same_tag: ResponseOutcomes {
                        agree: entry(
                            [2, -1],
                            [0, 0],
                            [0, 0],
                            2,
                            "{defender} has no answer to the takedown of {attack_card}",
                        ),
                        disagree: entry(
                            [0, 2],
                            [-1, 0],
                            [0, 1],
                            -1,
                            "{defender} turns the attack on {attack_card} around with {defense_card}",
                        ),
                    },
                    different: ResponseOutcomes {
                        agree: entry(
                            [2, 0],
                            [0, 0],
                            [0, 0],
                            1,
                            "{attacker} dunks on {attack_card} unopposed",
                        ),
                        disagree: entry(
                            [-1, 3],
                            [-1, 0],
                            [0, 1],
                            -2,
                            "{defender} exposes the cheap shot at {attack_card} with {defense_card}",
                        ),
                    },
                },
            },
            synergy_rules: vec![
                SynergyRule::Deck(DeckCountRule {
                    tag: "mecha".to_string(),
                    tiers: vec![
                        CostTier {
                            min_count: 5,
                            cost_reduction: 1,
                        },
                        CostTier {
                            min_count: 10,
                            cost_reduction: 2,
                        },
                    ],
                    description: "Mecha hangar discount".to_string(),
                }),
                SynergyRule::Deck(DeckCountRule {
                    tag: "scifi".to_string(),
                    tiers: vec![
                        CostTier {
                            min_count: 5,
                            cost_reduction: 1,
                        },
                        CostTier {
                            min_count: 10,
                            cost_reduction: 2,
                        },
                    ],
                    description: "Sci-fi marathon discount".to_string(),
                }),
                SynergyRule::Field(FieldRule::LanePresence {
                    tag: "action".to_string(),
                    min_count: 2,
                    bonus: 3,
                    description: "Action double feature".to_string(),
                }),
                SynergyRule::Field(FieldRule::LanePresence {
                    tag: "romance".to_string(),
                    min_count: 2,
                    bonus: 3,
                    description: "Romance arc".to_string(),
                }),
                SynergyRule::Field(FieldRule::LanePresence {
                    tag: "mecha".to_string(),
                    min_count: 2,
                    bonus: 3,
                    description: "Combining sequence".to_string(),
                }),
                SynergyRule::Field(FieldRule::Counter {
                    tag: "scifi".to_string(),
                    counters: "romance".to_string(),
                    bonus: 4,
                    description: "Cold logic undercuts melodrama".to_string(),
                }),
                SynergyRule::Field(FieldRule::Counter {
                    tag: "comedy".to_string(),
                    counters: "action".to_string(),
                    bonus: 4,
                    description: "Parody deflates bombast".to_string(),
                }),
                SynergyRule::Play(ComboRule {
                    step: 5,
                    description: "Topic streak".to_string(),
                }),
            ],
            ai: AiThresholds {
                close_to_winning: 20,
                high_tp: 6,
                high_value_points: 7,
                disagree_floor: 8,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_combination() {
        let config = BattleConfig::default();
        for style in [AttackStyle::Friendly, AttackStyle::Harsh] {
            for category in [
                MatchCategory::SameCard,
                MatchCategory::SameTag,
                MatchCategory::Different,
            ] {
                for response in [DefenseResponse::Agree, DefenseResponse::Disagree] {
                    let cell = config.outcome_table.entry(style, category, response);
                    assert!(!cell.log_template.is_empty());
                }
            }
        }
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = BattleConfig::default();
        let json = serde_json::to_string(&config).expect("serialize config");
        let back: BattleConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(back.outcome_table, config.outcome_table);
        assert_eq!(back.max_hand_size, config.max_hand_size);
        assert_eq!(back.synergy_rules.len(), config.synergy_rules.len());
    }
}
