//! Language availability entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::types::{EntityVersionId, LanguageId, UserId};

use crate::status::LanguageStatus;
use crate::traits::LanguageAvailability;

/// Publication state of one language of one content version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLanguageAvailability {
    /// The version this row belongs to.
    pub version_id: EntityVersionId,
    /// The language.
    pub language_id: LanguageId,
    /// Current status.
    pub status: LanguageStatus,
    /// Scheduled publication instant.
    pub publish_at: Option<DateTime<Utc>>,
    /// Scheduled archival instant.
    pub archive_at: Option<DateTime<Utc>>,
    /// Who last reviewed (published or archived) the language.
    pub reviewed_by: Option<UserId>,
    /// When the language was last reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Last time a scheduled publish was refused because of validation messages.
    pub last_failed_publish_at: Option<DateTime<Utc>>,
    /// When the row last changed.
    pub modified_at: DateTime<Utc>,
}

impl ContentLanguageAvailability {
    /// A new draft row for `language_id` on `version_id`.
    pub fn draft(version_id: EntityVersionId, language_id: LanguageId) -> Self {
        Self {
            version_id,
            language_id,
            status: LanguageStatus::Draft,
            publish_at: None,
            archive_at: None,
            reviewed_by: None,
            reviewed_at: None,
            last_failed_publish_at: None,
            modified_at: Utc::now(),
        }
    }
}

impl LanguageAvailability for ContentLanguageAvailability {
    fn language_id(&self) -> LanguageId {
        self.language_id
    }

    fn status(&self) -> LanguageStatus {
        self.status
    }

    fn set_status(&mut self, status: LanguageStatus) {
        self.status = status;
        self.modified_at = Utc::now();
    }

    fn publish_at(&self) -> Option<DateTime<Utc>> {
        self.publish_at
    }

    fn archive_at(&self) -> Option<DateTime<Utc>> {
        self.archive_at
    }

    fn set_schedule(&mut self, publish_at: Option<DateTime<Utc>>, archive_at: Option<DateTime<Utc>>) {
        self.publish_at = publish_at;
        self.archive_at = archive_at;
        self.modified_at = Utc::now();
    }

    fn record_review(&mut self, reviewer: Option<UserId>, at: DateTime<Utc>) {
        self.reviewed_by = reviewer;
        self.reviewed_at = Some(at);
    }

    fn attach_to(&mut self, version_id: EntityVersionId) {
        self.version_id = version_id;
    }
}
