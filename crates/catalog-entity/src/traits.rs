//! The entity triple the lifecycle engine is generic over.

use chrono::{DateTime, Utc};

use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId, UserId};

use crate::status::{LanguageStatus, PublishingStatus};
use crate::versioning::VersioningInfo;

/// Stable identity of a content item across its versions.
pub trait RootEntity: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Root identifier.
    fn id(&self) -> EntityRootId;
}

/// Per-language publication state of one version.
pub trait LanguageAvailability: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// The language this row describes.
    fn language_id(&self) -> LanguageId;

    /// Current status of the language.
    fn status(&self) -> LanguageStatus;

    /// Overwrite the status of the language.
    fn set_status(&mut self, status: LanguageStatus);

    /// Instant at which the language should be published.
    fn publish_at(&self) -> Option<DateTime<Utc>>;

    /// Instant at which the language should be archived.
    fn archive_at(&self) -> Option<DateTime<Utc>>;

    /// Record (or clear) the scheduled instants.
    fn set_schedule(&mut self, publish_at: Option<DateTime<Utc>>, archive_at: Option<DateTime<Utc>>);

    /// Stamp reviewer metadata.
    fn record_review(&mut self, reviewer: Option<UserId>, at: DateTime<Utc>);

    /// Point the row at another version (used when content is copied).
    fn attach_to(&mut self, version_id: EntityVersionId);

    /// Published now, or scheduled for publication.
    fn is_published_or_scheduled(&self) -> bool {
        self.status() == LanguageStatus::Published || self.publish_at().is_some()
    }

    /// Back to an unscheduled draft.
    fn reset_to_draft(&mut self) {
        self.set_status(LanguageStatus::Draft);
        self.set_schedule(None, None);
    }
}

/// One point-in-time snapshot of a content item.
pub trait VersionedEntity: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// The root type owning the chain.
    type Root: RootEntity;
    /// The per-language availability row type.
    type Language: LanguageAvailability;

    /// Version identifier.
    fn id(&self) -> EntityVersionId;

    /// Identifier of the owning root.
    fn root_id(&self) -> EntityRootId;

    /// Aggregate status.
    fn publishing_status(&self) -> PublishingStatus;

    /// Overwrite the aggregate status.
    fn set_publishing_status(&mut self, status: PublishingStatus);

    /// Chain position.
    fn versioning(&self) -> &VersioningInfo;

    /// Mutable chain position.
    fn versioning_mut(&mut self) -> &mut VersioningInfo;

    /// Language availability rows.
    fn language_availabilities(&self) -> &[Self::Language];

    /// Mutable language availability rows.
    fn language_availabilities_mut(&mut self) -> &mut Vec<Self::Language>;

    /// Record who last changed the version and when.
    fn touch(&mut self, by: Option<UserId>, at: DateTime<Utc>);

    /// Copy the content of this version into a new, unlinked version.
    fn branch(&self, new_id: EntityVersionId) -> Self;

    /// Look up the availability row for one language.
    fn language(&self, language_id: LanguageId) -> Option<&Self::Language> {
        self.language_availabilities()
            .iter()
            .find(|l| l.language_id() == language_id)
    }

    /// Mutable lookup of the availability row for one language.
    fn language_mut(&mut self, language_id: LanguageId) -> Option<&mut Self::Language> {
        self.language_availabilities_mut()
            .iter_mut()
            .find(|l| l.language_id() == language_id)
    }

    /// Languages present on the version.
    fn language_ids(&self) -> Vec<LanguageId> {
        self.language_availabilities()
            .iter()
            .map(|l| l.language_id())
            .collect()
    }

    /// Superseded by a newer link, or archived in every language.
    fn is_retired(&self) -> bool {
        let languages = self.language_availabilities();
        self.versioning().has_successor()
            || (!languages.is_empty()
                && languages
                    .iter()
                    .all(|l| l.status() == LanguageStatus::Archived))
    }
}
