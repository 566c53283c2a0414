use axum::Json;
use axum::http::StatusCode;

use crate::api::models::{ChatReply, ErrorResponse};

pub fn reply(text: String) -> (StatusCode, Json<ChatReply>) {
    (StatusCode::OK, Json(ChatReply { reply: text }))
}

pub fn error(status: StatusCode, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: message }))
}
