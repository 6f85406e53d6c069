//! Pessimistic lock taken on an entity root before publishing.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{EntityRootId, LockToken};

/// Exclusive lock over one entity root.
///
/// Ownership belongs to the [`LockToken`] presented on acquisition, not to
/// the service instance, so one shared service keeps concurrent callers
/// apart. A lease runs out after the service's TTL and may then be taken
/// by any token.
#[async_trait]
pub trait EntityLockService: Send + Sync + std::fmt::Debug + 'static {
    /// Acquire the lock for `root_id` as `token`.
    ///
    /// Fails with a `Conflict` error while any live lease exists, including
    /// one already held by `token`.
    async fn lock(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()>;

    /// Acquire the lock, or extend the lease when `token` already holds it.
    async fn refresh(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()>;

    /// Release the lock when `token` holds it. Otherwise a no-op.
    async fn unlock(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()>;

    /// Whether some token currently holds a live lease on `root_id`.
    async fn is_locked(&self, root_id: EntityRootId) -> AppResult<bool>;
}
