//! HTTP surface of the battle engine. Handlers lock the session, gate and
//! call engine functions, and map `EngineError` onto 404/400 status
//! bodies. Nothing below this layer knows about Rocket.

use either::{Either, Left, Right};
use rocket::response::status::{BadRequest, NotFound};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::{openapi, JsonSchema};

use crate::catalog::{CardId, SkillId};
use crate::session::BattleSession;
use crate::status_messages::{new_status, StatusMessage};

use super::ai::AiStrategy;
use super::resolve::{self, AttackStyle, DefenseAction, DefenseResponse};
use super::{BattleOutcome, BattleState, EngineError};

type SessionState<'a> =
    &'a rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<BattleSession>>>;
type ActionError = Either<NotFound<Json<StatusMessage>>, BadRequest<Json<StatusMessage>>>;

/// Player actions
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "action_type")]
pub enum BattleAction {
    PlayCard {
        card_id: CardId,
        style: AttackStyle,
        lane: usize,
    },
    Defend {
        response: DefenseResponse,
        #[serde(default)]
        card_id: Option<CardId>,
    },
    UseSkill {
        skill_id: SkillId,
    },
    RotateCharacter {
        index: usize,
    },
    EndTurn,
}

fn engine_error_response(error: EngineError) -> ActionError {
    match error {
        EngineError::CardNotInHand { .. }
        | EngineError::UnknownCard { .. }
        | EngineError::UnknownSkill { .. }
        | EngineError::NoPendingAttack => Left(NotFound(new_status(error.to_string()))),
        _ => Right(BadRequest(new_status(error.to_string()))),
    }
}

/// Start a battle from the built-in decks, replacing any running one.
#[openapi]
#[post("/battle")]
pub async fn initialize_battle(
    session: SessionState<'_>,
) -> Result<(rocket::http::Status, Json<BattleState>), BadRequest<Json<StatusMessage>>> {
    let mut session = session.lock().await;
    match session.start_battle() {
        Ok(battle) => Ok((rocket::http::Status::Created, Json(battle))),
        Err(e) => Err(BadRequest(new_status(e))),
    }
}

/// Current battle snapshot, if a battle is running.
#[openapi]
#[get("/battle")]
pub async fn get_battle(session: SessionState<'_>) -> Json<Option<BattleState>> {
    let session = session.lock().await;
    Json(session.battle.clone())
}

/// Final outcome. 404 until the battle reaches game over.
#[openapi]
#[get("/battle/result")]
pub async fn get_battle_result(
    session: SessionState<'_>,
) -> Result<Json<BattleOutcome>, NotFound<Json<StatusMessage>>> {
    let session = session.lock().await;
    match &session.battle {
        Some(battle) if battle.is_finished() => Ok(Json(battle.outcome)),
        Some(_) => Err(NotFound(new_status(
            "The battle is still running".to_string(),
        ))),
        None => Err(NotFound(new_status("No battle in progress".to_string()))),
    }
}

/// The human-readable battle log.
#[openapi]
#[get("/battle/log")]
pub async fn battle_log(session: SessionState<'_>) -> Json<Vec<String>> {
    let session = session.lock().await;
    Json(
        session
            .battle
            .as_ref()
            .map(|battle| battle.log.clone())
            .unwrap_or_default(),
    )
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SeedRequest {
    pub seed: u64,
}

/// Seed the session RNG so shuffles and AI strategy picks replay
/// identically within this session.
#[openapi]
#[post("/battle/seed", format = "json", data = "<seed_req>")]
pub async fn set_seed(seed_req: Json<SeedRequest>, session: SessionState<'_>) -> Json<String> {
    let mut session = session.lock().await;
    session.set_seed(seed_req.seed);
    Json(format!("seed set to {}", seed_req.seed))
}

/// Apply one player action to the running battle.
#[openapi]
#[post("/battle/action", format = "json", data = "<battle_action>")]
pub async fn play_action(
    battle_action: Json<BattleAction>,
    session: SessionState<'_>,
) -> Result<(rocket::http::Status, Json<BattleState>), ActionError> {
    let session = &mut *session.lock().await;
    let BattleSession {
        config,
        cards,
        skills,
        battle,
        executor,
        ..
    } = session;
    let battle = match battle.as_mut() {
        Some(battle) => battle,
        None => {
            return Err(Left(NotFound(new_status(
                "No battle in progress".to_string(),
            ))));
        }
    };

    let result = match battle_action.0 {
        BattleAction::PlayCard {
            card_id,
            style,
            lane,
        } => {
            let side = battle.active_side;
            resolve::play_attack(battle, side, card_id, style, lane, config, cards, executor)
        }
        BattleAction::Defend { response, card_id } => resolve::play_defense(
            battle,
            DefenseAction { response, card_id },
            config,
            cards,
            skills,
            executor,
        ),
        BattleAction::UseSkill { skill_id } => {
            let side = battle.active_side;
            resolve::play_skill(battle, side, skill_id, config, skills, executor)
        }
        BattleAction::RotateCharacter { index } => {
            let side = battle.active_side;
            resolve::play_rotation(battle, side, index, config, cards)
        }
        BattleAction::EndTurn => {
            let side = battle.active_side;
            resolve::end_turn(battle, side, config, cards)
        }
    };

    match result {
        Ok(()) => Ok((rocket::http::Status::Created, Json(battle.clone()))),
        Err(error) => Err(engine_error_response(error)),
    }
}

/// Let the AI act for whichever side is to move (attack or defense,
/// depending on the phase). `?strategy=` pins one of the named strategies.
#[openapi]
#[post("/battle/ai?<strategy>")]
pub async fn ai_act(
    strategy: Option<String>,
    session: SessionState<'_>,
) -> Result<(rocket::http::Status, Json<BattleState>), ActionError> {
    let pinned = match strategy.as_deref() {
        Some(name) => match name.parse::<AiStrategy>() {
            Ok(strategy) => Some(strategy),
            Err(()) => {
                return Err(Right(BadRequest(new_status(format!(
                    "Unknown strategy '{}'",
                    name
                )))));
            }
        },
        None => None,
    };
    let mut session = session.lock().await;
    if session.battle.is_none() {
        return Err(Left(NotFound(new_status(
            "No battle in progress".to_string(),
        ))));
    }
    match session.ai_take_action(pinned) {
        Ok(()) => match &session.battle {
            Some(battle) => Ok((rocket::http::Status::Created, Json(battle.clone()))),
            None => Err(Left(NotFound(new_status(
                "No battle in progress".to_string(),
            )))),
        },
        Err(error) => Err(engine_error_response(error)),
    }
}
