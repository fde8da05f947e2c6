use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::session::BattleSession;

use super::{Card, Skill};

/// Catalog cards endpoint: returns all cards from the canonical catalog.
/// Optionally filter by ?kind= (Anime, Character).
#[openapi]
#[get("/catalog/cards?<kind>")]
pub async fn list_catalog_cards(
    kind: Option<String>,
    session: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<BattleSession>>>,
) -> Json<Vec<Card>> {
    let session = session.lock().await;
    let cards: Vec<Card> = session
        .cards
        .cards
        .iter()
        .filter(|c| match kind.as_deref() {
            Some("Anime") => matches!(c, Card::Anime(_)),
            Some("Character") => matches!(c, Card::Character(_)),
            _ => true,
        })
        .cloned()
        .collect();
    Json(cards)
}

/// Catalog skills endpoint: returns all registered skills.
#[openapi]
#[get("/catalog/skills")]
pub async fn list_catalog_skills(
    session: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<BattleSession>>>,
) -> Json<Vec<Skill>> {
    let session = session.lock().await;
    Json(session.skills.skills.clone())
}
