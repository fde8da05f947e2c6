//! Card and skill catalogs
//!
//! The catalogs are the canonical, read-only collections the battle engine
//! draws from. Index in the Vec = id. Battles never write back into a
//! catalog; per-battle mutable state lives in overlay maps owned by the
//! battle itself.

mod endpoints;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

pub use endpoints::{
    list_catalog_cards, list_catalog_skills, okapi_add_operation_for_list_catalog_cards_,
    okapi_add_operation_for_list_catalog_skills_,
};

/// Catalog card identifier (index into the card catalog).
pub type CardId = usize;
/// Catalog skill identifier (index into the skill catalog).
pub type SkillId = usize;

/// Lifecycle points at which a card effect fires during an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum EffectTrigger {
    OnPlay,
    BeforeResolve,
    AfterResolve,
}

/// An effect hook on a card: when it fires and which effect id to dispatch.
/// The effect payload itself is executed by an external `EffectExecutor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CardEffectHook {
    pub trigger: EffectTrigger,
    pub effect_id: String,
}

/// Battle card data: name, TP cost, base strength and synergy tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct AnimeCard {
    pub name: String,
    pub cost: u32,
    pub points: i64,
    #[serde(default)]
    pub synergy_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<CardEffectHook>,
}

impl AnimeCard {
    pub fn shares_tag_with(&self, other: &AnimeCard) -> bool {
        self.synergy_tags
            .iter()
            .any(|tag| other.synergy_tags.contains(tag))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.synergy_tags.iter().any(|t| t == tag)
    }
}

/// Roster card: a character with one active and one passive skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CharacterCard {
    pub name: String,
    pub active_skill_id: SkillId,
    pub passive_skill_id: SkillId,
}

/// The kind of catalog card and its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "card_kind")]
pub enum Card {
    Anime(AnimeCard),
    Character(CharacterCard),
}

impl Card {
    pub fn name(&self) -> &str {
        match self {
            Card::Anime(card) => &card.name,
            Card::Character(card) => &card.name,
        }
    }

    pub fn as_anime(&self) -> Option<&AnimeCard> {
        match self {
            Card::Anime(card) => Some(card),
            Card::Character(_) => None,
        }
    }

    pub fn as_character(&self) -> Option<&CharacterCard> {
        match self {
            Card::Character(card) => Some(card),
            Card::Anime(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum SkillType {
    Active,
    Passive,
}

/// A character skill. `cost` defaults to 0 when absent; `cooldown` is the
/// number of turns before the skill can fire again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Skill {
    pub name: String,
    pub skill_type: SkillType,
    #[serde(default)]
    pub cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u32>,
    pub effect_id: String,
}

/// The card catalog. Index in the Vec = card ID.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    pub cards: Vec<Card>,
}

impl CardCatalog {
    pub fn new() -> Self {
        CardCatalog { cards: Vec::new() }
    }

    /// Add a card to the catalog. Returns the card ID (index).
    pub fn add_card(&mut self, card: Card) -> CardId {
        let id = self.cards.len();
        self.cards.push(card);
        id
    }

    pub fn get(&self, card_id: CardId) -> Option<&Card> {
        self.cards.get(card_id)
    }

    pub fn anime(&self, card_id: CardId) -> Option<&AnimeCard> {
        self.get(card_id).and_then(Card::as_anime)
    }

    pub fn character(&self, card_id: CardId) -> Option<&CharacterCard> {
        self.get(card_id).and_then(Card::as_character)
    }

    /// All card ids matching a predicate.
    pub fn cards_matching<F>(&self, predicate: F) -> Vec<CardId>
    where
        F: Fn(&Card) -> bool,
    {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, c)| predicate(c))
            .map(|(id, _)| id)
            .collect()
    }

    /// Validate that every character references existing skills of the right
    /// type, and that every effect hook names a non-empty effect id.
    pub fn validate(&self, skills: &SkillCatalog) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for (id, card) in self.cards.iter().enumerate() {
            match card {
                Card::Character(character) => {
                    match skills.get(character.active_skill_id) {
                        Some(skill) if skill.skill_type == SkillType::Active => {}
                        Some(_) => errors.push(format!(
                            "Character {} references skill {} which is not active",
                            id, character.active_skill_id
                        )),
                        None => errors.push(format!(
                            "Character {} references unknown skill {}",
                            id, character.active_skill_id
                        )),
                    }
                    match skills.get(character.passive_skill_id) {
                        Some(skill) if skill.skill_type == SkillType::Passive => {}
                        Some(_) => errors.push(format!(
                            "Character {} references skill {} which is not passive",
                            id, character.passive_skill_id
                        )),
                        None => errors.push(format!(
                            "Character {} references unknown skill {}",
                            id, character.passive_skill_id
                        )),
                    }
                }
                Card::Anime(anime) => {
                    for hook in &anime.effects {
                        if hook.effect_id.is_empty() {
                            errors.push(format!("Card {} has an effect hook without an id", id));
                        }
                    }
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The skill catalog. Index in the Vec = skill ID.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    pub skills: Vec<Skill>,
}

impl SkillCatalog {
    pub fn new() -> Self {
        SkillCatalog { skills: Vec::new() }
    }

    pub fn add_skill(&mut self, skill: Skill) -> SkillId {
        let id = self.skills.len();
        self.skills.push(skill);
        id
    }

    pub fn get(&self, skill_id: SkillId) -> Option<&Skill> {
        self.skills.get(skill_id)
    }
}

fn anime(
    name: &str,
    cost: u32,
    points: i64,
    tags: &[&str],
    effects: Vec<CardEffectHook>,
) -> Card {
    Card::Anime(AnimeCard {
        name: name.to_string(),
        cost,
        points,
        synergy_tags: tags.iter().map(|t| t.to_string()).collect(),
        effects,
    })
}

fn on_play(effect_id: &str) -> CardEffectHook {
    CardEffectHook {
        trigger: EffectTrigger::OnPlay,
        effect_id: effect_id.to_string(),
    }
}

fn after_resolve(effect_id: &str) -> CardEffectHook {
    CardEffectHook {
        trigger: EffectTrigger::AfterResolve,
        effect_id: effect_id.to_string(),
    }
}

/// Built-in skill catalog used by the service binary and the tests.
pub fn sample_skills() -> SkillCatalog {
    let mut skills = SkillCatalog::new();

    // id 0
    skills.add_skill(Skill {
        name: "Second Wind".to_string(),
        skill_type: SkillType::Active,
        cost: 2,
        cooldown: Some(3),
        effect_id: "tp_surge".to_string(),
    });
    // id 1
    skills.add_skill(Skill {
        name: "Deep Archive".to_string(),
        skill_type: SkillType::Active,
        cost: 3,
        cooldown: Some(4),
        effect_id: "draw_two".to_string(),
    });
    // id 2
    skills.add_skill(Skill {
        name: "Genre Savvy".to_string(),
        skill_type: SkillType::Passive,
        cost: 0,
        cooldown: None,
        effect_id: "reveal_topmost".to_string(),
    });
    // id 3
    skills.add_skill(Skill {
        name: "Steady Voice".to_string(),
        skill_type: SkillType::Passive,
        cost: 0,
        cooldown: None,
        effect_id: "calm_presence".to_string(),
    });

    skills
}

/// Built-in card catalog: a pool of anime cards across four synergy tags and
/// two characters per side. Ids are stable because entries are appended in a
/// fixed order.
pub fn sample_cards() -> CardCatalog {
    let mut catalog = CardCatalog::new();

    // Anime cards, ids 0..=13
    catalog.add_card(anime("Steel Cavalry", 3, 7, &["mecha", "action"], vec![]));
    catalog.add_card(anime("Aria of Dawn", 2, 5, &["romance", "drama"], vec![]));
    catalog.add_card(anime("Circuit Breaker", 4, 8, &["mecha", "scifi"], vec![]));
    catalog.add_card(anime(
        "Teatime Paradox",
        1,
        3,
        &["comedy", "slice_of_life"],
        vec![on_play("draw_one")],
    ));
    catalog.add_card(anime("Crimson Regalia", 5, 9, &["action", "drama"], vec![]));
    catalog.add_card(anime(
        "Orbital Lullaby",
        3,
        6,
        &["scifi", "drama"],
        vec![after_resolve("tp_surge")],
    ));
    catalog.add_card(anime("Maid of Mars", 2, 4, &["scifi", "comedy"], vec![]));
    catalog.add_card(anime("Blade Apprentice", 2, 5, &["action"], vec![]));
    catalog.add_card(anime(
        "Summer Constellation",
        1,
        2,
        &["romance", "slice_of_life"],
        vec![],
    ));
    catalog.add_card(anime("Gundrive Requiem", 4, 8, &["mecha", "action"], vec![]));
    catalog.add_card(anime(
        "Paper Lantern Cafe",
        1,
        3,
        &["slice_of_life"],
        vec![on_play("draw_one")],
    ));
    catalog.add_card(anime("Nebula Courier", 3, 6, &["scifi"], vec![]));
    catalog.add_card(anime(
        "Duel at Dusk",
        4,
        7,
        &["action", "romance"],
        vec![],
    ));
    catalog.add_card(anime("Mecha Maiden Mio", 2, 5, &["mecha", "comedy"], vec![]));

    // Characters, ids 14..=17
    catalog.add_card(Card::Character(CharacterCard {
        name: "Rin the Archivist".to_string(),
        active_skill_id: 1,
        passive_skill_id: 2,
    }));
    catalog.add_card(Card::Character(CharacterCard {
        name: "Captain Harue".to_string(),
        active_skill_id: 0,
        passive_skill_id: 3,
    }));
    catalog.add_card(Card::Character(CharacterCard {
        name: "Professor Okabe".to_string(),
        active_skill_id: 1,
        passive_skill_id: 3,
    }));
    catalog.add_card(Card::Character(CharacterCard {
        name: "Nanami Prime".to_string(),
        active_skill_id: 0,
        passive_skill_id: 2,
    }));

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_passes_validation() {
        let cards = sample_cards();
        let skills = sample_skills();
        assert!(cards.validate(&skills).is_ok());
    }

    #[test]
    fn character_with_dangling_skill_fails_validation() {
        let mut cards = sample_cards();
        let skills = sample_skills();
        cards.add_card(Card::Character(CharacterCard {
            name: "Ghost".to_string(),
            active_skill_id: 99,
            passive_skill_id: 2,
        }));
        let errors = cards.validate(&skills).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("unknown skill 99"));
    }

    #[test]
    fn tag_sharing_is_symmetric() {
        let cards = sample_cards();
        let a = cards.anime(0).unwrap();
        let b = cards.anime(9).unwrap();
        assert!(a.shares_tag_with(b));
        assert!(b.shares_tag_with(a));
    }
}
