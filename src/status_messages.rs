use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

/// Status body returned by endpoints for errors and plain acknowledgements.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StatusMessage {
    pub message: String,
}

pub fn new_status(message: impl Into<String>) -> Json<StatusMessage> {
    Json(StatusMessage {
        message: message.into(),
    })
}
