//! Battle state and the turn driver
//!
//! A battle owns all of its mutable state: two `PlayerState`s, the phase
//! machine, the topic-bias axis, the synergy bonus ledger and the log.
//! Nothing here is global; independent battles never share state. All
//! mutation goes through the operation functions in the submodules —
//! `resources` (TP/hand/deck), `skills`, `synergy` and `resolve`.

pub mod ai;
mod endpoints;
pub mod resolve;
pub mod resources;
pub mod skills;
pub mod synergy;

use std::collections::HashMap;

use rand_pcg::Lcg64Xsh32;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{CardCatalog, CardId, SkillCatalog, SkillId};
use crate::config::BattleConfig;
use resolve::PendingAttack;

pub use endpoints::{
    ai_act, battle_log, get_battle, get_battle_result, initialize_battle, play_action, set_seed,
    okapi_add_operation_for_ai_act_, okapi_add_operation_for_battle_log_,
    okapi_add_operation_for_get_battle_, okapi_add_operation_for_get_battle_result_,
    okapi_add_operation_for_initialize_battle_, okapi_add_operation_for_play_action_,
    okapi_add_operation_for_set_seed_, BattleAction,
};

/// One of the two competitors. `Player` is side A: positive topic bias
/// favors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }
}

/// Battle phases. Linear except for the terminal transition to `GameOver`,
/// which any phase can take once a win condition is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum BattlePhase {
    Setup,
    Draw,
    Action,
    Defense,
    EndTurn,
    GameOver,
}

impl BattlePhase {
    pub fn next(self) -> Self {
        match self {
            BattlePhase::Setup => BattlePhase::Draw,
            BattlePhase::Draw => BattlePhase::Action,
            BattlePhase::Action => BattlePhase::Defense,
            BattlePhase::Defense => BattlePhase::EndTurn,
            BattlePhase::EndTurn => BattlePhase::Draw,
            BattlePhase::GameOver => BattlePhase::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum BattleOutcome {
    Undecided,
    Won { side: Side },
    Draw,
}

/// Typed engine failures. Soft resource shortfalls are NOT errors — those
/// are sentinel returns in `resources` — these are rejected actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "error")]
pub enum EngineError {
    BattleFinished,
    NotYourTurn { side: Side },
    WrongPhase { expected: BattlePhase, actual: BattlePhase },
    CardNotInHand { card_id: CardId },
    NotAnAnimeCard { card_id: CardId },
    UnknownCard { card_id: CardId },
    UnknownSkill { skill_id: SkillId },
    InsufficientTp { required: u32, available: u32 },
    SkillOnCooldown { skill_id: SkillId, remaining: u32 },
    WrongSkillType { skill_id: SkillId },
    InvalidCharacterIndex { index: usize },
    RotationLimitReached { used: u32 },
    InvalidLane { lane: usize },
    NoPendingAttack,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::BattleFinished => write!(f, "The battle is already over"),
            EngineError::NotYourTurn { side } => write!(f, "It is not {side:?}'s turn"),
            EngineError::WrongPhase { expected, actual } => {
                write!(f, "Expected phase {expected:?}, battle is in {actual:?}")
            }
            EngineError::CardNotInHand { card_id } => {
                write!(f, "Card {card_id} is not in hand")
            }
            EngineError::NotAnAnimeCard { card_id } => {
                write!(f, "Card {card_id} is not a playable anime card")
            }
            EngineError::UnknownCard { card_id } => {
                write!(f, "Card {card_id} does not exist in the catalog")
            }
            EngineError::UnknownSkill { skill_id } => {
                write!(f, "Skill {skill_id} does not exist in the catalog")
            }
            EngineError::InsufficientTp {
                required,
                available,
            } => write!(f, "Need {required} TP, only {available} available"),
            EngineError::SkillOnCooldown { skill_id, remaining } => {
                write!(f, "Skill {skill_id} is on cooldown for {remaining} more turns")
            }
            EngineError::WrongSkillType { skill_id } => {
                write!(f, "Skill {skill_id} is not an active skill")
            }
            EngineError::InvalidCharacterIndex { index } => {
                write!(f, "No character at roster index {index}")
            }
            EngineError::RotationLimitReached { used } => {
                write!(f, "Already rotated {used} times this turn")
            }
            EngineError::InvalidLane { lane } => write!(f, "Lane {lane} does not exist"),
            EngineError::NoPendingAttack => write!(f, "There is no attack to respond to"),
        }
    }
}

/// Per-battle mutable view of a catalog card. The catalog entry itself is
/// never written; synergy discounts and buffs land here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CardOverlay {
    pub current_cost: u32,
    pub current_points: i64,
    pub is_buffed: bool,
    pub is_revealed: bool,
}

/// Accumulated synergy bonus for one card, with an audit trail of every
/// rule application that contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CardBonus {
    pub total: i64,
    pub reasons: Vec<String>,
}

/// Consecutive same-tag play streak. `count` is the number of consecutive
/// tag-sharing plays before the most recent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ComboState {
    pub count: u32,
    #[serde(default)]
    pub last_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PlayerState {
    pub name: String,
    pub reputation: i64,
    pub tp: u32,
    pub max_tp: u32,
    pub hand: Vec<CardId>,
    pub deck: Vec<CardId>,
    pub discard_pile: Vec<CardId>,
    pub characters: Vec<CardId>,
    pub active_character_index: usize,
    pub skill_cooldowns: HashMap<SkillId, u32>,
    pub needs_rotation: bool,
    pub rotations_used_this_turn: u32,
    /// Board slots for field-level synergy, one Vec per lane.
    pub lanes: Vec<Vec<CardId>>,
    pub overlays: HashMap<CardId, CardOverlay>,
}

impl PlayerState {
    pub fn hand_contains(&self, card_id: CardId) -> bool {
        self.hand.contains(&card_id)
    }

    pub fn overlay(&self, card_id: CardId) -> Option<&CardOverlay> {
        self.overlays.get(&card_id)
    }

    /// Effective cost of a card after deck-level discounts.
    pub fn current_cost(&self, card_id: CardId, catalog: &CardCatalog) -> u32 {
        self.overlays
            .get(&card_id)
            .map(|o| o.current_cost)
            .or_else(|| catalog.anime(card_id).map(|c| c.cost))
            .unwrap_or(0)
    }

    /// Effective base points of a card (before field/play bonuses).
    pub fn current_points(&self, card_id: CardId, catalog: &CardCatalog) -> i64 {
        self.overlays
            .get(&card_id)
            .map(|o| o.current_points)
            .or_else(|| catalog.anime(card_id).map(|c| c.points))
            .unwrap_or(0)
    }

    pub fn active_character(&self) -> Option<CardId> {
        self.characters.get(self.active_character_index).copied()
    }

    /// Total card count across hand, deck and discard. Conserved outside of
    /// explicit draw/discard/exchange operations.
    pub fn card_count(&self) -> usize {
        self.hand.len() + self.deck.len() + self.discard_pile.len()
    }
}

/// Deck and roster for one side, used to set up a battle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PlayerSetup {
    pub name: String,
    pub deck: Vec<CardId>,
    pub characters: Vec<CardId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct BattleState {
    pub players: [PlayerState; 2],
    pub turn: u32,
    pub active_side: Side,
    pub phase: BattlePhase,
    /// Rhetorical advantage axis, clamped to `[-10, 10]`; positive favors
    /// side A.
    pub topic_bias: i32,
    pub outcome: BattleOutcome,
    pub log: Vec<String>,
    pub combo: ComboState,
    /// Synergy ledger, card id -> accumulated bonus. Recomputed eagerly on
    /// every lane mutation.
    pub bonuses: HashMap<CardId, CardBonus>,
    /// Play-level awards folded back into `bonuses` on each recompute.
    #[serde(default)]
    pub play_awards: HashMap<CardId, CardBonus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_attack: Option<PendingAttack>,
}

impl BattleState {
    /// Build a battle from two deck/roster setups. Decks are shuffled,
    /// deck-level synergy is applied (before any draw), TP is restored for
    /// turn 1 and opening hands are drawn.
    pub fn setup(
        config: &BattleConfig,
        cards: &CardCatalog,
        skills: &SkillCatalog,
        side_a: PlayerSetup,
        side_b: PlayerSetup,
        rng: &mut Lcg64Xsh32,
    ) -> Result<BattleState, String> {
        let players = [
            Self::build_player(config, cards, skills, side_a)?,
            Self::build_player(config, cards, skills, side_b)?,
        ];
        let mut battle = BattleState {
            players,
            turn: 1,
            active_side: Side::Player,
            phase: BattlePhase::Setup,
            topic_bias: 0,
            outcome: BattleOutcome::Undecided,
            log: Vec::new(),
            combo: ComboState::default(),
            bonuses: HashMap::new(),
            play_awards: HashMap::new(),
            pending_attack: None,
        };

        for side in [Side::Player, Side::Opponent] {
            resources::shuffle_deck(battle.player_mut(side), rng);
        }
        synergy::apply_deck_rules(&mut battle, cards, &config.synergy_rules);

        battle.phase = BattlePhase::Draw;
        for side in [Side::Player, Side::Opponent] {
            let turn = battle.turn;
            resources::restore_tp_for_new_turn(battle.player_mut(side), turn);
            let report = resources::draw_cards(
                battle.player_mut(side),
                config.opening_hand,
                config.max_hand_size,
            );
            let name = battle.player(side).name.clone();
            battle.log_line(format!(
                "{} draws an opening hand of {} cards",
                name,
                report.drawn.len()
            ));
        }

        battle.phase = BattlePhase::Action;
        let (a, b) = (battle.players[0].name.clone(), battle.players[1].name.clone());
        battle.log_line(format!("{} and {} take the stage", a, b));
        Ok(battle)
    }

    fn build_player(
        config: &BattleConfig,
        cards: &CardCatalog,
        skills: &SkillCatalog,
        setup: PlayerSetup,
    ) -> Result<PlayerState, String> {
        if setup.characters.is_empty() {
            return Err(format!("{} has no characters", setup.name));
        }
        let mut overlays = HashMap::new();
        for &card_id in &setup.deck {
            let anime = cards
                .anime(card_id)
                .ok_or_else(|| format!("Deck card {} is not an anime card", card_id))?;
            overlays.insert(
                card_id,
                CardOverlay {
                    current_cost: anime.cost,
                    current_points: anime.points,
                    is_buffed: false,
                    is_revealed: false,
                },
            );
        }
        for &card_id in &setup.characters {
            let character = cards
                .character(card_id)
                .ok_or_else(|| format!("Roster card {} is not a character", card_id))?;
            if skills.get(character.active_skill_id).is_none()
                || skills.get(character.passive_skill_id).is_none()
            {
                return Err(format!(
                    "Character {} references a skill missing from the catalog",
                    character.name
                ));
            }
        }
        Ok(PlayerState {
            name: setup.name,
            reputation: 0,
            tp: 0,
            max_tp: 0,
            hand: Vec::new(),
            deck: setup.deck,
            discard_pile: Vec::new(),
            characters: setup.characters,
            active_character_index: 0,
            skill_cooldowns: HashMap::new(),
            needs_rotation: false,
            rotations_used_this_turn: 0,
            lanes: vec![Vec::new(); config.lane_count],
            overlays,
        })
    }

    pub fn player(&self, side: Side) -> &PlayerState {
        &self.players[side.index()]
    }

    pub fn player_mut(&mut self, side: Side) -> &mut PlayerState {
        &mut self.players[side.index()]
    }

    pub fn is_finished(&self) -> bool {
        self.phase == BattlePhase::GameOver
    }

    pub fn log_line(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// Clamp and set the topic bias.
    pub fn shift_topic_bias(&mut self, delta: i32, limit: i32) {
        self.topic_bias = (self.topic_bias + delta).clamp(-limit, limit);
    }

    /// Bookkeeping at the start of the active side's turn: TP refill,
    /// cooldown ticks, rotation reset, forced rotation, lane sweep and the
    /// draw phase.
    pub fn begin_turn(&mut self, config: &BattleConfig, cards: &CardCatalog) {
        let side = self.active_side;
        let turn = self.turn;
        let restore = resources::restore_tp_for_new_turn(self.player_mut(side), turn);
        resources::tick_cooldowns(self.player_mut(side));
        self.player_mut(side).rotations_used_this_turn = 0;

        let name = self.player(side).name.clone();
        self.log_line(format!(
            "Turn {}: {} refills to {}/{} TP",
            turn, name, restore.new_tp, restore.new_max_tp
        ));

        if self.player(side).needs_rotation && self.player(side).characters.len() > 1 {
            let player = self.player_mut(side);
            player.active_character_index =
                (player.active_character_index + 1) % player.characters.len();
            player.needs_rotation = false;
            let index = player.active_character_index;
            let character = self
                .player(side)
                .characters
                .get(index)
                .and_then(|&id| cards.get(id))
                .map(|c| c.name().to_string())
                .unwrap_or_default();
            self.log_line(format!("{} rotates {} to the front", name, character));
        } else {
            self.player_mut(side).needs_rotation = false;
        }

        // The acting side's previous board leaves play before new cards land.
        for lane in &mut self.player_mut(side).lanes {
            lane.clear();
        }
        synergy::refresh_field_bonuses(self, cards, &config.synergy_rules);

        self.phase = BattlePhase::Draw;
        let report = resources::draw_cards(
            self.player_mut(side),
            config.draws_per_turn,
            config.max_hand_size,
        );
        if report.drawn.len() < report.requested {
            let name = self.player(side).name.clone();
            self.log_line(format!(
                "{} wanted {} cards but drew {}",
                name,
                report.requested,
                report.drawn.len()
            ));
        }
        self.phase = BattlePhase::Action;
    }

    /// Check win conditions: reputation threshold on either side, topic
    /// bias saturation, or both thresholds at once (a draw). Transitions to
    /// `GameOver` from any phase.
    pub fn check_win(&mut self, config: &BattleConfig) -> bool {
        if self.is_finished() {
            return true;
        }
        let a_won = self.players[0].reputation >= config.reputation_win;
        let b_won = self.players[1].reputation >= config.reputation_win;
        let outcome = if a_won && b_won {
            Some(BattleOutcome::Draw)
        } else if a_won {
            Some(BattleOutcome::Won { side: Side::Player })
        } else if b_won {
            Some(BattleOutcome::Won {
                side: Side::Opponent,
            })
        } else if self.topic_bias >= config.bias_win {
            Some(BattleOutcome::Won { side: Side::Player })
        } else if self.topic_bias <= -config.bias_win {
            Some(BattleOutcome::Won {
                side: Side::Opponent,
            })
        } else {
            None
        };
        if let Some(outcome) = outcome {
            self.outcome = outcome;
            self.phase = BattlePhase::GameOver;
            let line = match outcome {
                BattleOutcome::Won { side } => {
                    format!("{} wins the debate", self.player(side).name)
                }
                BattleOutcome::Draw => "The debate ends in a draw".to_string(),
                BattleOutcome::Undecided => unreachable!(),
            };
            self.log_line(line);
            return true;
        }
        false
    }

    /// Guard used by every player-facing operation.
    pub fn ensure_turn(&self, side: Side, phase: BattlePhase) -> Result<(), EngineError> {
        if self.is_finished() {
            return Err(EngineError::BattleFinished);
        }
        if self.phase != phase {
            return Err(EngineError::WrongPhase {
                expected: phase,
                actual: self.phase,
            });
        }
        if self.active_side != side {
            return Err(EngineError::NotYourTurn { side });
        }
        Ok(())
    }
}
