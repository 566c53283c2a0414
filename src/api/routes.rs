use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::AppState;
use crate::api::models::{ChatRequest, API_KEY_HEADER, MAX_MESSAGE_UNITS};
use crate::api::response;
use crate::catalog::builtin_catalog;
use crate::error::{AppError, Result};
use crate::llm::{CompletionRequest, Message};
use crate::parser;
use crate::prompt::{self, SYSTEM_PROMPT};
use crate::scraper;
use crate::secrets::{OPENAI_API_KEY, VALID_API_KEY};

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler).fallback(method_not_allowed))
        .route("/api/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}

// The body is taken as raw bytes so the key is checked before the payload is
// looked at.
async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();

    let result = process_chat_request(&state, &headers, &body).await;
    let elapsed = start_time.elapsed();

    match result {
        Ok(reply) => {
            info!(?elapsed, reply_len = reply.len(), "recommendation served");
            response::reply(reply).into_response()
        }
        Err(err) => {
            if err.status().is_server_error() {
                error!(?elapsed, error = %err, "recommendation request failed");
            } else {
                warn!(?elapsed, error = %err, "recommendation request rejected");
            }
            err.into_response()
        }
    }
}

async fn process_chat_request(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<String> {
    authorize(state, headers).await?;

    let req: ChatRequest =
        serde_json::from_slice(body).map_err(|_| AppError::InvalidRequestBody)?;
    if req.user_message.encode_utf16().count() > MAX_MESSAGE_UNITS {
        return Err(AppError::InputTooLong);
    }

    let api_key = state.secrets.resolve(OPENAI_API_KEY).await?;
    let client = state.completion.get_or_connect(&api_key)?;

    let parsed = parser::parse(&req.user_message);
    info!(urls = parsed.referenced_urls.len(), "parsed user message");

    let fetched = scraper::fetch_all(
        state.pages.as_ref(),
        &parsed.referenced_urls,
        state.config.fetch_timeout,
    )
    .await?;

    let prompt = prompt::compose(&builtin_catalog(), &fetched, &parsed.description);

    let request = CompletionRequest {
        model: state.config.completion_model.clone(),
        messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
        max_tokens: state.config.completion_max_tokens,
    };

    let llm_start = Instant::now();
    let timeout = state.config.completion_timeout;
    let reply = match tokio::time::timeout(timeout, client.complete(&request)).await {
        Ok(reply) => reply?,
        Err(_) => {
            return Err(AppError::LlmError(format!(
                "Completion request timed out after {:?}",
                timeout
            )));
        }
    };
    info!(elapsed = ?llm_start.elapsed(), model = %request.model, "completion received");

    Ok(reply.trim().to_string())
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let expected = state.secrets.resolve(VALID_API_KEY).await?;

    let given = headers
        .get(API_KEY_HEADER)
        .map(|value| value.as_bytes())
        .ok_or(AppError::Unauthorized)?;

    if keys_match(given, expected.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Compares without short-circuiting on the first differing byte.
fn keys_match(given: &[u8], expected: &[u8]) -> bool {
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
