//! # Topic Duel
//!
//! A two-party, turn-based card battle engine where anime cards are argued
//! over a shared topic/prestige axis, plus the JSON API that drives it.
//!
//! ## Overview
//!
//! The engine core lives under [`battle`]: the TP resource model, the skill
//! gate, the synergy bonus engine, the table-driven combat resolver and the
//! AI opponent. All of it is pure state transition over a [`battle::BattleState`]
//! owned by one [`session::BattleSession`].
//!
//! ## Architecture
//!
//! The API is built using the Rocket web framework with OpenAPI
//! documentation support. The session is managed through a thread-safe
//! `Arc<Mutex<T>>` wrapper so concurrent HTTP requests serialize on the
//! single battle; the engine itself is lock-free and single-threaded.

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod battle;
pub mod catalog;
pub mod config;
pub mod session;
pub mod status_messages;

/// Initializes and configures the Rocket web server with all routes and
/// OpenAPI documentation.
///
/// # Example
///
/// ```no_run
/// use topic_duel::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    use crate::battle::{
        ai_act, battle_log, get_battle, get_battle_result, initialize_battle, play_action,
        set_seed,
    };
    use crate::battle::{
        okapi_add_operation_for_ai_act_, okapi_add_operation_for_battle_log_,
        okapi_add_operation_for_get_battle_, okapi_add_operation_for_get_battle_result_,
        okapi_add_operation_for_initialize_battle_, okapi_add_operation_for_play_action_,
        okapi_add_operation_for_set_seed_,
    };
    use crate::catalog::{
        list_catalog_cards, list_catalog_skills, okapi_add_operation_for_list_catalog_cards_,
        okapi_add_operation_for_list_catalog_skills_,
    };

    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();

    let session = std::sync::Arc::new(rocket::futures::lock::Mutex::new(
        session::BattleSession::new(),
    ));

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                initialize_battle,
                get_battle,
                get_battle_result,
                battle_log,
                set_seed,
                play_action,
                ai_act,
                list_catalog_cards,
                list_catalog_skills
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .manage(session)
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
