//! The validation seam used by the lifecycle engine.

use async_trait::async_trait;

use catalog_core::result::AppResult;
use catalog_core::types::EntityVersionId;
use catalog_entity::lifecycle::{HeaderLanguage, ValidationMessages};

/// Computes unresolved content rules for one entity inside an open unit of work.
///
/// Implementations must not write through `uow`. Only languages present in
/// `languages` are checked; the result holds violated rules only.
#[async_trait]
pub trait ValidationChecker<W: Send>: Send + Sync + 'static {
    /// Check `entity_id` against the language snapshot.
    async fn check_entity(
        &self,
        entity_id: EntityVersionId,
        uow: &mut W,
        languages: &[HeaderLanguage],
    ) -> AppResult<ValidationMessages>;
}
