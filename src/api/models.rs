use serde::{Deserialize, Serialize};

/// Longest accepted `userMessage`, counted in UTF-16 code units so emoji and
/// other astral characters count twice.
pub const MAX_MESSAGE_UNITS: usize = 500;

/// Header carrying the caller's key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "userMessage")]
    pub user_message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
