//! Secret lookup. Values are memoized by an explicit cache object owned by
//! the app state; nothing is cached implicitly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret '{0}' is not set")]
    Missing(String),

    #[error("secret backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<String, SecretError>;
}

/// Reads secrets from environment variables named after the secret.
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, name: &str) -> Result<String, SecretError> {
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => Ok(value),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(SecretError::Backend(format!("{name} is not valid UTF-8")))
            }
            _ => Err(SecretError::Missing(name.to_string())),
        }
    }
}

/// Memoizes successful lookups for the process lifetime unless invalidated.
/// Failures are never cached, so a secret provisioned later is picked up on
/// the next lookup.
pub struct CachedSecrets {
    inner: Arc<dyn SecretStore>,
    cache: RwLock<HashMap<String, String>>,
}

impl CachedSecrets {
    pub fn new(inner: Arc<dyn SecretStore>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, name: &str) -> Result<String, SecretError> {
        if let Some(value) = self.cache.read().await.get(name) {
            return Ok(value.clone());
        }

        let value = self.inner.get(name).await.map_err(|e| {
            error!("Failed to retrieve secret {name}: {e}");
            e
        })?;
        debug!("Cached secret {name}");
        self.cache
            .write()
            .await
            .insert(name.to_string(), value.clone());
        Ok(value)
    }

    pub async fn invalidate(&self, name: &str) {
        self.cache.write().await.remove(name);
    }
}
