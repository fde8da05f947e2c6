//! Service-side battle session: the one shared mutable resource the HTTP
//! layer owns. The engine never sees the lock — handlers lock, call engine
//! functions with plain references, unlock.

use rand::SeedableRng;
use rand_pcg::Lcg64Xsh32;

use crate::battle::skills::{EffectContext, EffectExecutor};
use crate::battle::{BattleState, PlayerSetup, Side};
use crate::catalog::{sample_cards, sample_skills, CardCatalog, SkillCatalog};
use crate::config::BattleConfig;

/// Duplicate a u64 seed into the 16 bytes the PCG generator wants.
pub fn seed_bytes(seed: u64) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..16].copy_from_slice(&seed.to_le_bytes());
    bytes
}

/// Built-in effect executor: the minimal payload set the sample catalog
/// references. Unknown effect ids warn and do nothing — the engine never
/// fabricates data for a missing configuration entry.
#[derive(Debug, Default)]
pub struct BuiltinExecutor;

impl EffectExecutor for BuiltinExecutor {
    fn execute(&mut self, effect_id: &str, ctx: EffectContext<'_>, state: &mut BattleState) {
        match effect_id {
            "draw_one" => {
                crate::battle::resources::draw_cards(
                    state.player_mut(ctx.side),
                    1,
                    ctx.config.max_hand_size,
                );
            }
            "draw_two" => {
                crate::battle::resources::draw_cards(
                    state.player_mut(ctx.side),
                    2,
                    ctx.config.max_hand_size,
                );
            }
            "tp_surge" => {
                crate::battle::resources::gain_tp(state.player_mut(ctx.side), 2);
            }
            "calm_presence" => {
                crate::battle::resources::gain_tp(state.player_mut(ctx.side), 1);
            }
            "reveal_topmost" => {
                let opponent = ctx.side.opposite();
                if let Some(&card_id) = state.player(opponent).hand.first() {
                    if let Some(overlay) =
                        state.player_mut(opponent).overlays.get_mut(&card_id)
                    {
                        overlay.is_revealed = true;
                    }
                }
            }
            other => {
                log::warn!("unknown effect id '{}', skipping", other);
                state.log_line(format!("Nothing happens ({} fizzles)", other));
            }
        }
    }
}

/// The decks and rosters the service battles with: the sample catalog split
/// into two halves, two copies of each anime card per deck.
pub fn sample_setups() -> (PlayerSetup, PlayerSetup) {
    let player_deck: Vec<usize> = (0..14).filter(|id| id % 2 == 0).collect();
    let opponent_deck: Vec<usize> = (0..14).filter(|id| id % 2 == 1).collect();
    let duplicate = |ids: Vec<usize>| -> Vec<usize> {
        ids.iter().copied().chain(ids.iter().copied()).collect()
    };
    (
        PlayerSetup {
            name: "Player".to_string(),
            deck: duplicate(player_deck),
            characters: vec![14, 15],
        },
        PlayerSetup {
            name: "Rival".to_string(),
            deck: duplicate(opponent_deck),
            characters: vec![16, 17],
        },
    )
}

pub struct BattleSession {
    pub config: BattleConfig,
    pub cards: CardCatalog,
    pub skills: SkillCatalog,
    pub battle: Option<BattleState>,
    pub rng: Lcg64Xsh32,
    pub executor: BuiltinExecutor,
}

impl BattleSession {
    pub fn new() -> Self {
        let cards = sample_cards();
        let skills = sample_skills();
        if let Err(errors) = cards.validate(&skills) {
            panic!("Card catalog validation failed: {:?}", errors);
        }
        BattleSession {
            config: BattleConfig::default(),
            cards,
            skills,
            battle: None,
            rng: Lcg64Xsh32::from_seed(seed_bytes(0)),
            executor: BuiltinExecutor,
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = Lcg64Xsh32::from_seed(seed_bytes(seed));
    }

    /// Start a fresh battle from the sample decks, replacing any running
    /// one. Returns a snapshot of the new state.
    pub fn start_battle(&mut self) -> Result<BattleState, String> {
        let (side_a, side_b) = sample_setups();
        let battle = BattleState::setup(
            &self.config,
            &self.cards,
            &self.skills,
            side_a,
            side_b,
            &mut self.rng,
        )?;
        self.battle = Some(battle.clone());
        Ok(battle)
    }

    /// AI turn for whichever side is to move, honoring the current phase.
    pub fn ai_take_action(
        &mut self,
        pinned: Option<crate::battle::ai::AiStrategy>,
    ) -> Result<(), crate::battle::EngineError> {
        use crate::battle::{ai, resolve, BattlePhase};

        let battle = self
            .battle
            .as_mut()
            .ok_or(crate::battle::EngineError::BattleFinished)?;
        match battle.phase {
            BattlePhase::Defense => {
                let attack = battle
                    .pending_attack
                    .clone()
                    .ok_or(crate::battle::EngineError::NoPendingAttack)?;
                let defender = attack.side.opposite();
                let defense =
                    ai::decide_defense(battle, defender, &attack, &self.config, &self.cards);
                resolve::play_defense(
                    battle,
                    defense,
                    &self.config,
                    &self.cards,
                    &self.skills,
                    &mut self.executor,
                )
            }
            _ => {
                let side = battle.active_side;
                let action = ai::decide_attack(
                    battle,
                    side,
                    &self.config,
                    &self.cards,
                    &mut self.rng,
                    pinned,
                );
                match action {
                    ai::AiAction::Play {
                        card_id,
                        style,
                        lane,
                    } => resolve::play_attack(
                        battle,
                        side,
                        card_id,
                        style,
                        lane,
                        &self.config,
                        &self.cards,
                        &mut self.executor,
                    ),
                    ai::AiAction::EndTurn => {
                        resolve::end_turn(battle, side, &self.config, &self.cards)
                    }
                }
            }
        }
    }
}

impl Default for BattleSession {
    fn default() -> Self {
        Self::new()
    }
}
