use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

/// A chat-completions backend. Returns the trimmed text of the first choice,
/// or an empty string when the service sent none.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Builds a completion client bound to a credential.
pub trait CompletionConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn ChatCompletion>>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?;
        let parsed = serde_json::from_str::<serde_json::Value>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(AppError::LlmError(format!(
                "Completion service returned {}: {}",
                status, message
            )));
        }

        let json = parsed
            .map_err(|e| AppError::LlmError(format!("Invalid response from completion service: {}", e)))?;
        Ok(reply_text(&json))
    }
}

pub fn reply_text(json: &serde_json::Value) -> String {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

pub struct OpenAiConnector {
    pub base_url: String,
    pub timeout: Duration,
}

impl CompletionConnector for OpenAiConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn ChatCompletion>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build completion client: {}", e)))?;

        info!(base_url = %self.base_url, "completion client initialized");
        Ok(Arc::new(OpenAiClient {
            client,
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
        }))
    }
}

/// Builds the completion client on first use and hands out the same one after.
/// The credential seen by the first successful call is the one the client keeps.
pub struct LazyCompletion {
    connector: Box<dyn CompletionConnector>,
    client: OnceCell<Arc<dyn ChatCompletion>>,
}

impl LazyCompletion {
    pub fn new(connector: impl CompletionConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            client: OnceCell::new(),
        }
    }

    pub fn get_or_connect(&self, api_key: &str) -> Result<Arc<dyn ChatCompletion>> {
        self.client
            .get_or_try_init(|| self.connector.connect(api_key))
            .cloned()
    }
}
