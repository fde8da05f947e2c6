//! Skill model: legality gate and side effects for active skills, passive
//! lookup, and the executor seam for effect payloads.
//!
//! `use_skill` deliberately does not re-validate: callers must gate through
//! `can_use_skill` first, matching the resolver's assume-legality contract.

use crate::catalog::{CardId, EffectTrigger, Skill, SkillCatalog, SkillId, SkillType};
use crate::config::BattleConfig;

use super::{BattleState, Side};

/// Context handed to the external effect executor at each trigger point.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    pub side: Side,
    pub trigger: EffectTrigger,
    pub source_card: Option<CardId>,
    pub config: &'a BattleConfig,
}

/// External collaborator executing effect payloads (draws, TP swings,
/// reveals). The engine only dispatches by id; unknown ids are the
/// executor's problem to warn about and skip.
pub trait EffectExecutor {
    fn execute(&mut self, effect_id: &str, ctx: EffectContext<'_>, state: &mut BattleState);
}

/// A recording no-op executor for tests.
#[derive(Debug, Default)]
pub struct NullExecutor {
    pub executed: Vec<String>,
}

impl EffectExecutor for NullExecutor {
    fn execute(&mut self, effect_id: &str, _ctx: EffectContext<'_>, _state: &mut BattleState) {
        self.executed.push(effect_id.to_string());
    }
}

/// True iff the skill is active, affordable, and off cooldown.
pub fn can_use_skill(player: &super::PlayerState, skill_id: SkillId, skill: &Skill) -> bool {
    if skill.skill_type != SkillType::Active {
        return false;
    }
    if player.tp < skill.cost {
        return false;
    }
    match player.skill_cooldowns.get(&skill_id) {
        Some(remaining) => *remaining == 0,
        None => true,
    }
}

/// Fire an active skill. Precondition: `can_use_skill` returned true — this
/// function does not re-check and will corrupt state if misused. Side
/// effects, in order: TP is spent, the cooldown timer is set, the
/// forced-rotation flag is raised, then the effect payload is dispatched.
pub fn use_skill(
    state: &mut BattleState,
    side: Side,
    skill_id: SkillId,
    skill: &Skill,
    config: &BattleConfig,
    executor: &mut dyn EffectExecutor,
) {
    let player = state.player_mut(side);
    player.tp -= skill.cost;
    if let Some(cooldown) = skill.cooldown {
        if cooldown > 0 {
            player.skill_cooldowns.insert(skill_id, cooldown);
        }
    }
    player.needs_rotation = true;
    let name = player.name.clone();
    state.log_line(format!("{} uses {}", name, skill.name));

    executor.execute(
        &skill.effect_id,
        EffectContext {
            side,
            trigger: EffectTrigger::OnPlay,
            source_card: None,
            config,
        },
        state,
    );
}

/// Effect id of the active character's passive skill, fed to the executor
/// at `BeforeResolve` by the combat resolver.
pub fn passive_effect_id(
    player: &super::PlayerState,
    cards: &crate::catalog::CardCatalog,
    skills: &SkillCatalog,
) -> Option<String> {
    let character_id = player.active_character()?;
    let character = cards.character(character_id)?;
    let skill = skills.get(character.passive_skill_id)?;
    if skill.skill_type == SkillType::Passive {
        Some(skill.effect_id.clone())
    } else {
        None
    }
}
