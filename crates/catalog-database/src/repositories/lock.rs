//! Entity lock backed by the `entity_lock` table.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::traits::lock::EntityLockService;
use catalog_core::types::{EntityRootId, LockToken};

/// Takes a free or expired row; `$4` also lets the current token renew.
const ACQUIRE: &str = "INSERT INTO entity_lock (root_id, token, locked_at, expires_at) \
     VALUES ($1, $2, NOW(), NOW() + make_interval(secs => $3)) \
     ON CONFLICT (root_id) DO UPDATE SET token = EXCLUDED.token, \
     locked_at = EXCLUDED.locked_at, expires_at = EXCLUDED.expires_at \
     WHERE entity_lock.expires_at < NOW() OR ($4 AND entity_lock.token = EXCLUDED.token)";

/// Lock service storing one row per locked root.
///
/// An expired row can be taken over by any token. Statements run on the
/// pool, outside any unit of work.
#[derive(Debug, Clone)]
pub struct PgLockService {
    pool: PgPool,
    ttl: Duration,
}

impl PgLockService {
    /// Create a lock service whose leases last `ttl`.
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    async fn acquire(&self, root_id: EntityRootId, token: LockToken, renew: bool) -> AppResult<()> {
        let result = sqlx::query(ACQUIRE)
            .bind(root_id)
            .bind(token)
            .bind(self.ttl.as_secs_f64())
            .bind(renew)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock entity", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Entity {root_id} is locked by another editor"
            )));
        }
        info!(root_id = %root_id, renew, "Entity locked");
        Ok(())
    }
}

#[async_trait]
impl EntityLockService for PgLockService {
    async fn lock(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        self.acquire(root_id, token, false).await
    }

    async fn refresh(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        self.acquire(root_id, token, true).await
    }

    async fn unlock(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM entity_lock WHERE root_id = $1 AND token = $2")
            .bind(root_id)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to unlock entity", e)
            })?;

        if result.rows_affected() == 0 {
            warn!(root_id = %root_id, "No lock held by this token to release");
        } else {
            info!(root_id = %root_id, "Entity unlocked");
        }
        Ok(())
    }

    async fn is_locked(&self, root_id: EntityRootId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM entity_lock WHERE root_id = $1 AND expires_at >= NOW())",
        )
        .bind(root_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check entity lock", e))
    }
}
