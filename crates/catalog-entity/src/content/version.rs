//! Content version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId, OrganizationId, UserId};

use super::kind::EntityKind;
use super::language::ContentLanguageAvailability;
use super::localized::LocalizedContent;
use super::root::ContentRoot;
use crate::status::PublishingStatus;
use crate::traits::{LanguageAvailability, VersionedEntity};
use crate::versioning::VersioningInfo;

/// One versioned snapshot of a service, channel, organization, or general description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentVersion {
    /// Version identifier.
    pub id: EntityVersionId,
    /// Owning root.
    pub root_id: EntityRootId,
    /// Kind of the owning root.
    pub kind: EntityKind,
    /// Responsible organization.
    pub organization_id: Option<OrganizationId>,
    /// Aggregate status, derived from `languages`.
    pub publishing_status: PublishingStatus,
    /// Chain position.
    pub versioning: VersioningInfo,
    /// Start of the validity window.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window.
    pub valid_to: Option<DateTime<Utc>>,
    /// Per-language publication state.
    pub languages: Vec<ContentLanguageAvailability>,
    /// Per-language texts.
    pub contents: Vec<LocalizedContent>,
    /// When the version was created.
    pub created_at: DateTime<Utc>,
    /// When the version last changed.
    pub modified_at: DateTime<Utc>,
    /// Who last changed the version.
    pub modified_by: Option<UserId>,
}

impl ContentVersion {
    /// The first version of a new root, in Draft for the given languages.
    pub fn first(root: &ContentRoot, languages: &[LanguageId]) -> Self {
        let id = EntityVersionId::new();
        let now = Utc::now();
        Self {
            id,
            root_id: root.id,
            kind: root.kind,
            organization_id: None,
            publishing_status: PublishingStatus::Draft,
            versioning: VersioningInfo::default(),
            valid_from: None,
            valid_to: None,
            languages: languages
                .iter()
                .map(|language_id| ContentLanguageAvailability::draft(id, *language_id))
                .collect(),
            contents: Vec::new(),
            created_at: now,
            modified_at: now,
            modified_by: None,
        }
    }

    /// Texts for one language.
    pub fn content(&self, language_id: LanguageId) -> Option<&LocalizedContent> {
        self.contents.iter().find(|c| c.language_id == language_id)
    }

    /// Insert or replace the texts for one language, adding a Draft
    /// availability row when the language is new to the version.
    pub fn upsert_content(&mut self, content: LocalizedContent) {
        let language_id = content.language_id;
        match self.contents.iter_mut().find(|c| c.language_id == language_id) {
            Some(existing) => *existing = content,
            None => self.contents.push(content),
        }
        if self.language(language_id).is_none() {
            self.languages
                .push(ContentLanguageAvailability::draft(self.id, language_id));
        }
    }
}

impl VersionedEntity for ContentVersion {
    type Root = ContentRoot;
    type Language = ContentLanguageAvailability;

    fn id(&self) -> EntityVersionId {
        self.id
    }

    fn root_id(&self) -> EntityRootId {
        self.root_id
    }

    fn publishing_status(&self) -> PublishingStatus {
        self.publishing_status
    }

    fn set_publishing_status(&mut self, status: PublishingStatus) {
        self.publishing_status = status;
    }

    fn versioning(&self) -> &VersioningInfo {
        &self.versioning
    }

    fn versioning_mut(&mut self) -> &mut VersioningInfo {
        &mut self.versioning
    }

    fn language_availabilities(&self) -> &[ContentLanguageAvailability] {
        &self.languages
    }

    fn language_availabilities_mut(&mut self) -> &mut Vec<ContentLanguageAvailability> {
        &mut self.languages
    }

    fn touch(&mut self, by: Option<UserId>, at: DateTime<Utc>) {
        self.modified_by = by;
        self.modified_at = at;
    }

    fn branch(&self, new_id: EntityVersionId) -> Self {
        let now = Utc::now();
        let mut copy = self.clone();
        copy.id = new_id;
        copy.versioning = VersioningInfo {
            number: self.versioning.number,
            predecessor_id: None,
            successor_id: None,
        };
        for language in &mut copy.languages {
            language.attach_to(new_id);
        }
        copy.created_at = now;
        copy.modified_at = now;
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::LanguageStatus;

    #[test]
    fn test_first_version_is_draft_in_every_language() {
        let root = ContentRoot::new(EntityKind::Service);
        let fi = LanguageId::new();
        let sv = LanguageId::new();
        let version = ContentVersion::first(&root, &[fi, sv]);

        assert_eq!(version.root_id, root.id);
        assert_eq!(version.publishing_status, PublishingStatus::Draft);
        assert_eq!(version.languages.len(), 2);
        assert!(
            version
                .languages
                .iter()
                .all(|l| l.status == LanguageStatus::Draft && l.version_id == version.id)
        );
    }

    #[test]
    fn test_branch_reattaches_languages() {
        let root = ContentRoot::new(EntityKind::Channel);
        let fi = LanguageId::new();
        let mut version = ContentVersion::first(&root, &[fi]);
        version.versioning.successor_id = Some(EntityVersionId::new());

        let new_id = EntityVersionId::new();
        let copy = version.branch(new_id);

        assert_eq!(copy.id, new_id);
        assert_eq!(copy.root_id, version.root_id);
        assert_eq!(copy.languages[0].version_id, new_id);
        assert!(copy.versioning.successor_id.is_none());
    }

    #[test]
    fn test_upsert_content_adds_language_row() {
        let root = ContentRoot::new(EntityKind::Service);
        let fi = LanguageId::new();
        let en = LanguageId::new();
        let mut version = ContentVersion::first(&root, &[fi]);

        version.upsert_content(LocalizedContent::named(en, "Parking permit"));
        version.upsert_content(LocalizedContent::named(en, "Resident parking permit"));

        assert_eq!(version.contents.len(), 1);
        assert_eq!(version.content(en).unwrap().name, "Resident parking permit");
        assert!(version.language(en).is_some());
    }

    #[test]
    fn test_retired_when_all_archived() {
        let root = ContentRoot::new(EntityKind::Organization);
        let fi = LanguageId::new();
        let mut version = ContentVersion::first(&root, &[fi]);
        assert!(!version.is_retired());

        version.languages[0].status = LanguageStatus::Archived;
        assert!(version.is_retired());
    }
}
