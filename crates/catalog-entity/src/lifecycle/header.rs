//! Result header returned by every lifecycle operation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId};

use super::action::EntityAction;
use super::validation::ValidationMessages;
use crate::status::{LanguageStatus, PublishingStatus};
use crate::traits::{LanguageAvailability, VersionedEntity};
use crate::versioning::VersionNumber;

/// Publication summary of one language in a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderLanguage {
    /// Language.
    pub language_id: LanguageId,
    /// Status.
    pub status: LanguageStatus,
    /// Scheduled (or effective) publication instant.
    pub valid_from: Option<DateTime<Utc>>,
    /// Scheduled archival instant.
    pub valid_to: Option<DateTime<Utc>>,
}

impl HeaderLanguage {
    /// Published now, or carrying a publication instant.
    pub fn is_published_or_scheduled(&self) -> bool {
        self.status == LanguageStatus::Published || self.valid_from.is_some()
    }
}

/// What the caller gets back from Get, Save, ScheduleEntity, and Validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHeader {
    /// Version identifier.
    pub id: EntityVersionId,
    /// Root identifier.
    pub root_id: EntityRootId,
    /// The action that produced the header, for saves.
    pub action: Option<EntityAction>,
    /// Aggregate status of the version.
    pub publishing_status: PublishingStatus,
    /// Version number.
    pub version: VersionNumber,
    /// Per-language summary.
    pub language_availabilities: Vec<HeaderLanguage>,
    /// Attached only when a published or scheduled language has violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_messages: Option<ValidationMessages>,
}

impl EntityHeader {
    /// Build a header from a version snapshot.
    pub fn from_version<V: VersionedEntity>(version: &V) -> Self {
        Self {
            id: version.id(),
            root_id: version.root_id(),
            action: None,
            publishing_status: version.publishing_status(),
            version: version.versioning().number,
            language_availabilities: version
                .language_availabilities()
                .iter()
                .map(|l| HeaderLanguage {
                    language_id: l.language_id(),
                    status: l.status(),
                    valid_from: l.publish_at(),
                    valid_to: l.archive_at(),
                })
                .collect(),
            validation_messages: None,
        }
    }

    /// Languages that are published or scheduled for publication.
    pub fn published_or_scheduled_languages(&self) -> BTreeSet<LanguageId> {
        self.language_availabilities
            .iter()
            .filter(|l| l.is_published_or_scheduled())
            .map(|l| l.language_id)
            .collect()
    }

    /// Whether any language is published or scheduled for publication.
    pub fn has_published_or_scheduled_language(&self) -> bool {
        self.language_availabilities
            .iter()
            .any(HeaderLanguage::is_published_or_scheduled)
    }

    /// All languages in the header.
    pub fn language_ids(&self) -> Vec<LanguageId> {
        self.language_availabilities
            .iter()
            .map(|l| l.language_id)
            .collect()
    }
}
