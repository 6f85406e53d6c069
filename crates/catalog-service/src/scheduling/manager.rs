//! Scheduling manager.
//!
//! Only records instants on language availability rows. The transition
//! itself happens later in the scheduled publishing job.

use chrono::Utc;
use tracing::info;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::store::VersionStore;
use catalog_entity::lifecycle::{PublishAction, ScheduleModel};
use catalog_entity::status::LanguageStatus;
use catalog_entity::traits::{LanguageAvailability, VersionedEntity};

/// Applies a [`ScheduleModel`] to the addressed version.
#[derive(Debug, Clone, Default)]
pub struct SchedulingManager;

impl SchedulingManager {
    /// Create a scheduling manager.
    pub fn new() -> Self {
        Self
    }

    /// Record the requested instants and store the version.
    ///
    /// `SchedulePublish` sets `publish_at` and keeps any archive instant;
    /// `ScheduleArchive` sets `archive_at` and keeps any publish instant.
    pub async fn apply<V, W>(&self, uow: &mut W, model: &ScheduleModel) -> AppResult<V>
    where
        V: VersionedEntity,
        W: VersionStore<V>,
    {
        let entity_id = model
            .id
            .ok_or_else(|| AppError::validation("Schedule request has no entity"))?;
        if model.languages.is_empty() {
            return Err(AppError::validation("Schedule request names no languages"));
        }

        let mut version = uow
            .find_version(entity_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {entity_id} not found")))?;

        for requested in &model.languages {
            let language = version.language_mut(requested.language_id).ok_or_else(|| {
                AppError::validation(format!(
                    "Language {} is not available on version {entity_id}",
                    requested.language_id
                ))
            })?;

            let (publish_at, archive_at) = match model.publish_action {
                PublishAction::SchedulePublish => {
                    let at = requested.publish_at.ok_or_else(|| {
                        AppError::validation(format!(
                            "No publish instant given for language {}",
                            requested.language_id
                        ))
                    })?;
                    if language.status() == LanguageStatus::Archived {
                        return Err(AppError::validation(format!(
                            "Language {} is archived and cannot be scheduled for publishing",
                            requested.language_id
                        )));
                    }
                    (Some(at), language.archive_at())
                }
                PublishAction::ScheduleArchive => {
                    let at = requested.archive_at.ok_or_else(|| {
                        AppError::validation(format!(
                            "No archive instant given for language {}",
                            requested.language_id
                        ))
                    })?;
                    (language.publish_at(), Some(at))
                }
            };

            if let (Some(publish_at), Some(archive_at)) = (publish_at, archive_at) {
                if archive_at <= publish_at {
                    return Err(AppError::validation(format!(
                        "Archive instant must follow the publish instant for language {}",
                        requested.language_id
                    )));
                }
            }
            language.set_schedule(publish_at, archive_at);
        }

        version.touch(model.requested_by, Utc::now());
        uow.update_version(&version).await?;

        info!(
            entity_id = %entity_id,
            action = %model.publish_action,
            languages = model.languages.len(),
            "Schedule recorded"
        );
        Ok(version)
    }
}
