//! Secret lookup: a primary store (usually a mounted JSON secret file) with the
//! process environment as fallback, plus an optional TTL cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

pub const VALID_API_KEY: &str = "VALID_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` means the store is reachable but has no such key.
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Reads a JSON object of string fields from disk on every lookup, so rotated
/// secrets are picked up without a restart.
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to read secrets from {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let blob: HashMap<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| AppError::ConfigError(format!("Malformed secrets file: {}", e)))?;

        Ok(blob
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }
}

pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(std::env::var(key).ok().filter(|v| !v.is_empty()))
    }
}

#[derive(Default)]
pub struct MemorySecretStore {
    values: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }
}

struct CachedSecret {
    value: String,
    fetched_at: DateTime<Utc>,
}

pub struct SecretResolver {
    primary: Option<Arc<dyn SecretStore>>,
    fallback: Arc<dyn SecretStore>,
    ttl: chrono::Duration,
    cache: Mutex<HashMap<String, CachedSecret>>,
}

impl SecretResolver {
    pub fn new(primary: Option<Arc<dyn SecretStore>>, fallback: Arc<dyn SecretStore>) -> Self {
        Self {
            primary,
            fallback,
            ttl: chrono::Duration::zero(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A zero TTL disables caching.
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolves `key` from the primary store, then the fallback.
    pub async fn resolve(&self, key: &str) -> Result<String> {
        if let Some(value) = self.cached(key) {
            return Ok(value);
        }

        let mut primary_error = None;
        if let Some(primary) = &self.primary {
            match primary.get(key).await {
                Ok(Some(value)) => return Ok(self.remember(key, value)),
                Ok(None) => debug!(key, "secret not in primary store, trying fallback"),
                Err(e) => {
                    warn!(key, error = %e, "secret store lookup failed, trying fallback");
                    primary_error = Some(e);
                }
            }
        }

        match self.fallback.get(key).await? {
            Some(value) => Ok(self.remember(key, value)),
            None => Err(match primary_error {
                Some(e) => AppError::ConfigError(format!("{} is not configured ({})", key, e)),
                None => AppError::ConfigError(format!("{} is not configured", key)),
            }),
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn cached(&self, key: &str) -> Option<String> {
        if self.ttl <= chrono::Duration::zero() {
            return None;
        }
        let cache = self.cache.lock().ok()?;
        cache
            .get(key)
            .filter(|entry| Utc::now() - entry.fetched_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    fn remember(&self, key: &str, value: String) -> String {
        if self.ttl > chrono::Duration::zero() {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(
                    key.to_string(),
                    CachedSecret {
                        value: value.clone(),
                        fetched_at: Utc::now(),
                    },
                );
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Unreachable;

    #[async_trait]
    impl SecretStore for Unreachable {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::ConfigError("store unreachable".into()))
        }
    }

    struct Counting {
        inner: MemorySecretStore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SecretStore for Counting {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }
    }

    fn memory(key: &str, value: &str) -> Arc<dyn SecretStore> {
        Arc::new(MemorySecretStore::new().with(key, value))
    }

    #[tokio::test]
    async fn primary_wins_over_fallback() {
        let resolver = SecretResolver::new(
            Some(memory(VALID_API_KEY, "from-store")),
            memory(VALID_API_KEY, "from-env"),
        );
        assert_eq!(resolver.resolve(VALID_API_KEY).await.unwrap(), "from-store");
    }

    #[tokio::test]
    async fn unreachable_store_falls_back() {
        let resolver = SecretResolver::new(Some(Arc::new(Unreachable)), memory(OPENAI_API_KEY, "sk"));
        assert_eq!(resolver.resolve(OPENAI_API_KEY).await.unwrap(), "sk");
    }

    #[tokio::test]
    async fn unresolvable_key_is_config_error() {
        let resolver = SecretResolver::new(Some(Arc::new(Unreachable)), Arc::new(MemorySecretStore::new()));
        let err = resolver.resolve(VALID_API_KEY).await.unwrap_err();
        match err {
            AppError::ConfigError(msg) => {
                assert!(msg.contains("VALID_API_KEY is not configured"));
                assert!(msg.contains("store unreachable"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn cache_serves_until_invalidated() {
        let store = Arc::new(Counting {
            inner: MemorySecretStore::new().with(VALID_API_KEY, "k"),
            calls: AtomicUsize::new(0),
        });
        let resolver = SecretResolver::new(None, store.clone()).with_ttl(chrono::Duration::minutes(5));

        resolver.resolve(VALID_API_KEY).await.unwrap();
        resolver.resolve(VALID_API_KEY).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);

        resolver.invalidate();
        resolver.resolve(VALID_API_KEY).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_resolves_every_time() {
        let store = Arc::new(Counting {
            inner: MemorySecretStore::new().with(VALID_API_KEY, "k"),
            calls: AtomicUsize::new(0),
        });
        let resolver = SecretResolver::new(None, store.clone());

        resolver.resolve(VALID_API_KEY).await.unwrap();
        resolver.resolve(VALID_API_KEY).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn file_store_reads_json_blob() {
        let path = std::env::temp_dir().join(format!("filmfinder-secrets-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"VALID_API_KEY":"abc","OPENAI_API_KEY":""}"#)
            .await
            .unwrap();

        let store = FileSecretStore::new(&path);
        assert_eq!(store.get(VALID_API_KEY).await.unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get(OPENAI_API_KEY).await.unwrap(), None);

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(store.get(VALID_API_KEY).await.is_err());
    }
}
