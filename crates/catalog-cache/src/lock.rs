//! Entity lock backed by set-if-absent cache keys.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::cache::CacheProvider;
use catalog_core::traits::lock::EntityLockService;
use catalog_core::types::{EntityRootId, LockToken};

use crate::keys;

/// Lock service that stores one key per locked root, valued with the
/// token of the acquisition that holds it.
///
/// The key expires after `ttl`.
#[derive(Debug, Clone)]
pub struct CacheLockService {
    cache: Arc<dyn CacheProvider>,
    ttl: Duration,
}

impl CacheLockService {
    /// Create a lock service whose leases last `ttl`.
    pub fn new(cache: Arc<dyn CacheProvider>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    async fn holder(&self, key: &str) -> AppResult<Option<LockToken>> {
        Ok(self
            .cache
            .get(key)
            .await?
            .and_then(|value| value.parse().ok()))
    }
}

fn locked_elsewhere(root_id: EntityRootId) -> AppError {
    AppError::conflict(format!("Entity {root_id} is locked by another editor"))
}

#[async_trait]
impl EntityLockService for CacheLockService {
    async fn lock(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        let key = keys::entity_lock(root_id);
        if !self.cache.set_nx(&key, &token.to_string(), self.ttl).await? {
            return Err(locked_elsewhere(root_id));
        }
        info!(root_id = %root_id, "Entity locked");
        Ok(())
    }

    async fn refresh(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        let key = keys::entity_lock(root_id);
        if self.cache.set_nx(&key, &token.to_string(), self.ttl).await? {
            info!(root_id = %root_id, "Entity locked");
            return Ok(());
        }

        if self.holder(&key).await? != Some(token) {
            return Err(locked_elsewhere(root_id));
        }
        self.cache.set(&key, &token.to_string(), self.ttl).await?;
        info!(root_id = %root_id, "Entity lock refreshed");
        Ok(())
    }

    async fn unlock(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        let key = keys::entity_lock(root_id);
        match self.holder(&key).await? {
            Some(holder) if holder == token => {
                self.cache.delete(&key).await?;
                info!(root_id = %root_id, "Entity unlocked");
            }
            Some(_) => warn!(root_id = %root_id, "Refusing to release a lock held elsewhere"),
            None => {}
        }
        Ok(())
    }

    async fn is_locked(&self, root_id: EntityRootId) -> AppResult<bool> {
        self.cache.exists(&keys::entity_lock(root_id)).await
    }
}
