//! End-to-end flows over the HTTP API.

use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use topic_duel::rocket_initialize;

#[test]
fn test_battle_lifecycle_over_the_api() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");

    // No battle yet: result is 404, snapshot is null.
    let result_resp = client.get("/battle/result").dispatch();
    assert_eq!(result_resp.status(), Status::NotFound);
    let snapshot = client.get("/battle").dispatch();
    assert_eq!(snapshot.status(), Status::Ok);
    assert_eq!(snapshot.into_string().expect("read battle"), "null");

    // Seed, then start.
    let seed_resp = client
        .post("/battle/seed")
        .header(ContentType::JSON)
        .body(r#"{ "seed": 7 }"#)
        .dispatch();
    assert_eq!(seed_resp.status(), Status::Ok);

    let start_resp = client.post("/battle").dispatch();
    assert_eq!(start_resp.status(), Status::Created);
    let body = start_resp.into_string().expect("read battle state");
    assert!(body.contains("\"phase\":\"Action\""));
    assert!(body.contains("\"turn\":1"));

    // The battle is running, so the result endpoint still refuses.
    let result_resp = client.get("/battle/result").dispatch();
    assert_eq!(result_resp.status(), Status::NotFound);

    // Pass the first turn, then let the AI take one full action.
    let action_resp = client
        .post("/battle/action")
        .header(ContentType::JSON)
        .body(r#"{ "action_type": "EndTurn" }"#)
        .dispatch();
    assert_eq!(action_resp.status(), Status::Created);

    let ai_resp = client.post("/battle/ai").dispatch();
    assert_eq!(ai_resp.status(), Status::Created);

    let log_resp = client.get("/battle/log").dispatch();
    assert_eq!(log_resp.status(), Status::Ok);
    let log = log_resp.into_string().expect("read log");
    assert!(log.contains("lets the topic rest"));
}

#[test]
fn test_illegal_actions_map_to_client_errors() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");

    // Acting before a battle exists is a 404.
    let resp = client
        .post("/battle/action")
        .header(ContentType::JSON)
        .body(r#"{ "action_type": "EndTurn" }"#)
        .dispatch();
    assert_eq!(resp.status(), Status::NotFound);

    client.post("/battle").dispatch();

    // Playing a card that is not in hand is a 404 with a status message.
    let resp = client
        .post("/battle/action")
        .header(ContentType::JSON)
        .body(r#"{ "action_type": "PlayCard", "card_id": 9999, "style": "Harsh", "lane": 0 }"#)
        .dispatch();
    assert_eq!(resp.status(), Status::NotFound);
    let body = resp.into_string().expect("read status");
    assert!(body.contains("not in hand"));

    // Defending with no pending attack is rejected.
    let resp = client
        .post("/battle/action")
        .header(ContentType::JSON)
        .body(r#"{ "action_type": "Defend", "response": "Agree" }"#)
        .dispatch();
    assert!(resp.status() == Status::NotFound || resp.status() == Status::BadRequest);

    // An unknown AI strategy is a 400.
    let resp = client.post("/battle/ai?strategy=berserk").dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn test_catalog_endpoints_list_cards_and_skills() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");

    let cards_resp = client.get("/catalog/cards").dispatch();
    assert_eq!(cards_resp.status(), Status::Ok);
    let body = cards_resp.into_string().expect("read cards");
    assert!(body.contains("Steel Cavalry"));
    assert!(body.contains("Rin the Archivist"));

    let anime_resp = client.get("/catalog/cards?kind=Anime").dispatch();
    let body = anime_resp.into_string().expect("read anime cards");
    assert!(body.contains("Steel Cavalry"));
    assert!(!body.contains("Rin the Archivist"));

    let skills_resp = client.get("/catalog/skills").dispatch();
    assert_eq!(skills_resp.status(), Status::Ok);
    let body = skills_resp.into_string().expect("read skills");
    assert!(body.contains("Second Wind"));
    assert!(body.contains("Genre Savvy"));
}

#[test]
fn test_seeded_api_battles_replay_identically() {
    let run = || {
        let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
        client
            .post("/battle/seed")
            .header(ContentType::JSON)
            .body(r#"{ "seed": 42 }"#)
            .dispatch();
        client.post("/battle").dispatch();
        for _ in 0..200 {
            let resp = client.post("/battle/ai").dispatch();
            if resp.status() != Status::Created {
                break;
            }
            let finished = client
                .get("/battle/result")
                .dispatch()
                .status()
                == Status::Ok;
            if finished {
                break;
            }
        }
        client
            .get("/battle/log")
            .dispatch()
            .into_string()
            .expect("read log")
    };
    assert_eq!(run(), run());
}
