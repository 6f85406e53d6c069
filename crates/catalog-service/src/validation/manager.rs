//! Validation manager for catalog content.

use async_trait::async_trait;
use tracing::debug;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::store::VersionStore;
use catalog_core::types::EntityVersionId;
use catalog_entity::content::ContentVersion;
use catalog_entity::lifecycle::{HeaderLanguage, ValidationMessages};

use super::checker::ValidationChecker;
use super::rules::ContentRules;

/// Loads a content version from the unit of work and applies [`ContentRules`].
#[derive(Debug, Clone, Default)]
pub struct ContentValidationManager {
    rules: ContentRules,
}

impl ContentValidationManager {
    /// Create a manager applying `rules`.
    pub fn new(rules: ContentRules) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl<W> ValidationChecker<W> for ContentValidationManager
where
    W: VersionStore<ContentVersion>,
{
    async fn check_entity(
        &self,
        entity_id: EntityVersionId,
        uow: &mut W,
        languages: &[HeaderLanguage],
    ) -> AppResult<ValidationMessages> {
        let version = uow
            .find_version(entity_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {entity_id} not found")))?;

        let messages = self
            .rules
            .check(&version, languages.iter().map(|l| l.language_id));
        debug!(
            entity_id = %entity_id,
            violations = messages.len(),
            "Content validated"
        );
        Ok(messages)
    }
}
