use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Process-wide settings. The two API keys are not here; they are resolved
/// per request through [`crate::secrets::SecretResolver`].
#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub secrets_file: Option<PathBuf>,
    pub secret_cache_ttl: Duration,
    pub openai_base_url: String,
    pub completion_model: String,
    pub completion_max_tokens: u32,
    pub completion_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            secrets_file: None,
            secret_cache_ttl: Duration::ZERO,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            completion_model: "gpt-3.5-turbo".to_string(),
            completion_max_tokens: 150,
            completion_timeout: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or("PORT", &lookup, 3000)?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            secrets_file: lookup("SECRETS_FILE").filter(|p| !p.is_empty()).map(PathBuf::from),
            secret_cache_ttl: Duration::from_secs(parse_or("SECRET_CACHE_TTL_SECS", &lookup, 0)?),
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            completion_model: lookup("COMPLETION_MODEL").unwrap_or(defaults.completion_model),
            completion_max_tokens: parse_or(
                "COMPLETION_MAX_TOKENS",
                &lookup,
                defaults.completion_max_tokens,
            )?,
            completion_timeout: Duration::from_secs(parse_or("COMPLETION_TIMEOUT_SECS", &lookup, 30)?),
            fetch_timeout: Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", &lookup, 10)?),
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}
