//! Versioning manager.
//!
//! Decides whether a save writes into the current version or into a new
//! chain link, what happens to per-language state, and how a publish moves
//! the chain forward.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::info;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::store::VersionStore;
use catalog_core::types::{EntityVersionId, LanguageId, UserId};
use catalog_entity::status::{LanguageStatus, PublishingStatus};
use catalog_entity::traits::{LanguageAvailability, VersionedEntity};
use catalog_entity::versioning::VersioningMode;

/// Stateless manager of version chains.
#[derive(Debug, Clone, Default)]
pub struct VersioningManager;

impl VersioningManager {
    /// Create a versioning manager.
    pub fn new() -> Self {
        Self
    }

    /// Produce the version a save of `current_id` writes into.
    ///
    /// Without `keep_previous_state` a new link is inserted after the
    /// current version and the two are linked; otherwise the current version
    /// itself is returned. Without `keep_language_state` every language of
    /// the returned version is reset to an unscheduled Draft.
    ///
    /// The returned version is already stored; the caller applies its
    /// changes and calls `update_version`.
    pub async fn create_version<V, W>(
        &self,
        uow: &mut W,
        current_id: EntityVersionId,
        mode: VersioningMode,
    ) -> AppResult<V>
    where
        V: VersionedEntity,
        W: VersionStore<V>,
    {
        let mut current = uow
            .find_version(current_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {current_id} not found")))?;

        if mode.keep_previous_state {
            if !mode.keep_language_state {
                reset_languages(&mut current);
                refresh_status(&mut current);
            }
            info!(
                entity_id = %current_id,
                version = %current.versioning().number,
                "Updating version in place"
            );
            return Ok(current);
        }

        let next_id = EntityVersionId::new();
        let mut next = current.branch(next_id);
        {
            let versioning = next.versioning_mut();
            versioning.number = current.versioning().number.next_minor();
            versioning.predecessor_id = Some(current_id);
            versioning.successor_id = None;
        }
        current.versioning_mut().successor_id = Some(next_id);

        if mode.keep_language_state {
            // The new link carries the published languages forward.
            if current.publishing_status().is_published() {
                retire(&mut current);
            }
        } else {
            reset_languages(&mut next);
        }
        refresh_status(&mut next);

        uow.insert_version(&next).await?;
        uow.update_version(&current).await?;

        info!(
            entity_id = %next_id,
            predecessor_id = %current_id,
            version = %next.versioning().number,
            "New version created"
        );
        Ok(next)
    }

    /// Publish `languages` of `version` (every language when empty).
    ///
    /// The previously published version of the same root is retired and the
    /// major version number moves forward. Both versions are stored.
    pub async fn publish<V, W>(
        &self,
        uow: &mut W,
        version: &mut V,
        languages: &[LanguageId],
        reviewer: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AppResult<()>
    where
        V: VersionedEntity,
        W: VersionStore<V>,
    {
        let targets = select_languages(version, languages)?;

        if let Some(mut previous) = uow.find_published_version(version.root_id()).await? {
            if previous.id() != version.id() {
                retire(&mut previous);
                uow.update_version(&previous).await?;
                info!(
                    entity_id = %previous.id(),
                    "Previously published version retired"
                );
            }
        }

        for language_id in &targets {
            if let Some(language) = version.language_mut(*language_id) {
                let archive_at = language.archive_at();
                language.set_status(LanguageStatus::Published);
                language.set_schedule(None, archive_at);
                language.record_review(reviewer, now);
            }
        }

        if !version.publishing_status().is_published() {
            let number = version.versioning().number.next_major();
            version.versioning_mut().number = number;
        }
        refresh_status(version);
        version.touch(reviewer, now);
        uow.update_version(version).await?;

        info!(
            entity_id = %version.id(),
            languages = targets.len(),
            version = %version.versioning().number,
            "Version published"
        );
        Ok(())
    }

    /// Archive `languages` of `version` (every language when empty) and store it.
    pub async fn archive<V, W>(
        &self,
        uow: &mut W,
        version: &mut V,
        languages: &[LanguageId],
        reviewer: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AppResult<()>
    where
        V: VersionedEntity,
        W: VersionStore<V>,
    {
        let targets = select_languages(version, languages)?;
        for language_id in &targets {
            if let Some(language) = version.language_mut(*language_id) {
                language.set_status(LanguageStatus::Archived);
                language.set_schedule(None, None);
                language.record_review(reviewer, now);
            }
        }
        refresh_status(version);
        version.touch(reviewer, now);
        uow.update_version(version).await?;

        info!(
            entity_id = %version.id(),
            languages = targets.len(),
            status = %version.publishing_status(),
            "Version archived"
        );
        Ok(())
    }
}

/// Recompute the aggregate status from language state.
///
/// A major number above zero means the chain was published before, so an
/// unpublished link is a working copy rather than a fresh draft.
pub fn refresh_status<V: VersionedEntity>(version: &mut V) {
    if version.publishing_status() == PublishingStatus::OldPublished {
        return;
    }
    let status = PublishingStatus::derive(
        version.language_availabilities().iter().map(|l| l.status()),
        version.versioning().number.major > 0,
    );
    version.set_publishing_status(status);
}

fn reset_languages<V: VersionedEntity>(version: &mut V) {
    for language in version.language_availabilities_mut() {
        language.reset_to_draft();
    }
}

fn retire<V: VersionedEntity>(version: &mut V) {
    for language in version.language_availabilities_mut() {
        language.set_status(LanguageStatus::Archived);
        language.set_schedule(None, None);
    }
    version.set_publishing_status(PublishingStatus::OldPublished);
}

fn select_languages<V: VersionedEntity>(
    version: &V,
    requested: &[LanguageId],
) -> AppResult<BTreeSet<LanguageId>> {
    if requested.is_empty() {
        return Ok(version.language_ids().into_iter().collect());
    }
    let present: BTreeSet<LanguageId> = version.language_ids().into_iter().collect();
    let mut selected = BTreeSet::new();
    for language_id in requested {
        if !present.contains(language_id) {
            return Err(AppError::validation(format!(
                "Language {language_id} is not available on version {}",
                version.id()
            )));
        }
        selected.insert(*language_id);
    }
    Ok(selected)
}
