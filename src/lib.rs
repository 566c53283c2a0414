pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod scraper;
pub mod secrets;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::llm::{LazyCompletion, OpenAiConnector};
use crate::scraper::{HttpPageSource, PageSource};
use crate::secrets::{EnvSecretStore, FileSecretStore, SecretResolver, SecretStore};

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub secrets: Arc<SecretResolver>,
    pub pages: Arc<dyn PageSource>,
    pub completion: Arc<LazyCompletion>,
}

impl AppState {
    /// Wires the production collaborators: the secret file (if configured)
    /// over the environment, HTTPS page fetching and the OpenAI client.
    pub fn from_config(config: Config) -> Result<Self> {
        let primary = config
            .secrets_file
            .clone()
            .map(|path| Arc::new(FileSecretStore::new(path)) as Arc<dyn SecretStore>);
        let ttl = chrono::Duration::from_std(config.secret_cache_ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let secrets = SecretResolver::new(primary, Arc::new(EnvSecretStore)).with_ttl(ttl);

        let pages = HttpPageSource::new(config.fetch_timeout)?;
        let completion = LazyCompletion::new(OpenAiConnector {
            base_url: config.openai_base_url.clone(),
            timeout: config.completion_timeout,
        });

        Ok(Self {
            config: Arc::new(config),
            secrets: Arc::new(secrets),
            pages: Arc::new(pages),
            completion: Arc::new(completion),
        })
    }
}
