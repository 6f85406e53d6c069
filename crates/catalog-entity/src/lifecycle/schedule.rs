//! Scheduling requests and publishing results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId, UserId};

use super::action::PublishAction;
use super::model::EntityModel;
use super::validation::ValidationRuleKey;

/// Instants requested for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleLanguage {
    /// Language to schedule.
    pub language_id: LanguageId,
    /// Publication instant, used by `SchedulePublish`.
    pub publish_at: Option<DateTime<Utc>>,
    /// Archival instant, used by `ScheduleArchive`.
    pub archive_at: Option<DateTime<Utc>>,
}

/// Request to record future publication or archival instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleModel {
    /// Version to schedule.
    pub id: Option<EntityVersionId>,
    /// Which instant is recorded.
    pub publish_action: PublishAction,
    /// Per-language instants.
    pub languages: Vec<ScheduleLanguage>,
    /// Acting editor.
    pub requested_by: Option<UserId>,
}

impl ScheduleModel {
    /// Languages named by the request.
    pub fn language_ids(&self) -> Vec<LanguageId> {
        self.languages.iter().map(|l| l.language_id).collect()
    }
}

impl EntityModel for ScheduleModel {
    fn entity_id(&self) -> Option<EntityVersionId> {
        self.id
    }
}

/// What happened to one language in a publish or archive pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PublishingOutcome {
    /// The language is now Published.
    Published,
    /// The language is now Archived.
    Archived,
    /// Publication was refused because of unresolved rules.
    Blocked {
        /// Violated rules in the language.
        rules: Vec<ValidationRuleKey>,
    },
    /// The transition failed for another reason.
    Failed {
        /// Error description.
        reason: String,
    },
}

/// Outcome of a publish or archive transition for one language of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingResult {
    /// Root of the entity.
    pub root_id: EntityRootId,
    /// Version that was transitioned.
    pub entity_id: EntityVersionId,
    /// Language that was transitioned.
    pub language_id: LanguageId,
    /// Result.
    #[serde(flatten)]
    pub outcome: PublishingOutcome,
}

impl PublishingResult {
    /// Whether the transition took effect.
    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            PublishingOutcome::Published | PublishingOutcome::Archived
        )
    }
}
