//! Errors raised by lifecycle operations.

use thiserror::Error;

use catalog_core::error::AppError;
use catalog_core::types::EntityVersionId;
use catalog_entity::lifecycle::ValidationMessages;

/// Failure of a Get, Save, ScheduleEntity, or Validate operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The request did not address an existing entity.
    #[error("Entity not found")]
    EntityNotFound,

    /// A publication was scheduled over content with unresolved rules.
    #[error("Cannot schedule publishing of {entity_id}: {} unresolved validation message(s)", .messages.len())]
    SchedulePublish {
        /// The entity that was to be scheduled.
        entity_id: EntityVersionId,
        /// The violations, per language.
        messages: ValidationMessages,
    },

    /// Any other failure, propagated unchanged from collaborators.
    #[error(transparent)]
    App(#[from] AppError),
}

impl LifecycleError {
    /// Violations carried by a blocked schedule.
    pub fn validation_messages(&self) -> Option<&ValidationMessages> {
        match self {
            Self::SchedulePublish { messages, .. } => Some(messages),
            _ => None,
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::EntityNotFound => AppError::not_found("Entity not found"),
            LifecycleError::SchedulePublish { entity_id, messages } => {
                let languages: Vec<String> = messages
                    .languages()
                    .into_iter()
                    .map(|language| language.to_string())
                    .collect();
                AppError::publish_blocked(format!(
                    "Publishing of {entity_id} is blocked in languages: {}",
                    languages.join(", ")
                ))
            }
            LifecycleError::App(inner) => inner,
        }
    }
}
