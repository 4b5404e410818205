use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::storage::{BlobStore, GENERATOR_CONTAINER};

/// Loads the deployment profile once and keeps it until [`invalidate`] is
/// called. Owned by the app state.
///
/// [`invalidate`]: ProfileCache::invalidate
pub struct ProfileCache {
    name: String,
    current: RwLock<Option<Arc<Profile>>>,
}

impl ProfileCache {
    pub fn new(name: String) -> Self {
        Self {
            name,
            current: RwLock::new(None),
        }
    }

    pub async fn get(&self, storage: &dyn BlobStore) -> Result<Arc<Profile>, AppError> {
        if let Some(profile) = self.current.read().await.as_ref() {
            return Ok(profile.clone());
        }

        let mut slot = self.current.write().await;
        // Another request may have filled the slot while we waited.
        if let Some(profile) = slot.as_ref() {
            return Ok(profile.clone());
        }

        let raw = storage.read(GENERATOR_CONTAINER, &self.name).await?;
        let profile: Profile = serde_json::from_slice(&raw)
            .map_err(|e| anyhow::anyhow!("profile {} is malformed: {e}", self.name))?;
        info!(
            "Loaded profile {} (schema: {}, template: {})",
            self.name, profile.schema_file, profile.template
        );

        let profile = Arc::new(profile);
        *slot = Some(profile.clone());
        Ok(profile)
    }

    pub async fn invalidate(&self) {
        self.current.write().await.take();
    }
}
