//! Content service: the load and save steps for catalog content.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::{info, warn};

use catalog_cache::LanguageCache;
use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::lock::EntityLockService;
use catalog_core::traits::store::{RootStore, VersionStore};
use catalog_core::traits::unit_of_work::UnitOfWorkProvider;
use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId, LockToken};
use catalog_entity::content::{ContentRoot, ContentVersion};
use catalog_entity::lifecycle::{
    EntityAction, EntityHeader, EntityModel, GetEntityModel, HeaderLanguage, SaveContentModel,
    ScheduleModel,
};
use catalog_entity::traits::VersionedEntity;

use crate::error::LifecycleError;
use crate::lifecycle::{EntityLifecycleManager, LockAction};
use crate::validation::ValidationChecker;
use crate::versioning::VersioningManager;
use crate::versioning::manager::refresh_status;

/// Service for catalog content versions.
pub struct ContentService<P, C> {
    lifecycle: Arc<EntityLifecycleManager<ContentVersion, P, C>>,
    versioning: Arc<VersioningManager>,
    languages: Arc<LanguageCache>,
    locks: Arc<dyn EntityLockService>,
}

impl<P, C> std::fmt::Debug for ContentService<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentService")
            .field("languages", &self.languages.languages().len())
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl<P, C> ContentService<P, C>
where
    P: UnitOfWorkProvider,
    P::Read: VersionStore<ContentVersion>,
    P::Write: VersionStore<ContentVersion> + RootStore<ContentRoot>,
    C: ValidationChecker<P::Read> + ValidationChecker<P::Write>,
{
    /// Creates a new content service.
    pub fn new(
        lifecycle: Arc<EntityLifecycleManager<ContentVersion, P, C>>,
        versioning: Arc<VersioningManager>,
        languages: Arc<LanguageCache>,
        locks: Arc<dyn EntityLockService>,
    ) -> Self {
        Self {
            lifecycle,
            versioning,
            languages,
            locks,
        }
    }

    /// Load the header of one version.
    pub async fn get(&self, model: &GetEntityModel) -> Result<EntityHeader, LifecycleError> {
        self.lifecycle
            .get(model, |uow, model| {
                Box::pin(async move {
                    let id = model
                        .assigned_id()
                        .ok_or_else(|| AppError::not_found("Entity not found"))?;
                    load_header(uow, id).await
                })
            })
            .await
    }

    /// Save content, optionally publishing it.
    ///
    /// `SaveAndPublish` publishes only the requested languages the
    /// lifecycle validator finds clean. The others keep their saved state
    /// and the returned header shows them unpublished.
    pub async fn save(&self, model: &SaveContentModel) -> Result<EntityHeader, LifecycleError> {
        self.ensure_known_languages(model)?;

        let versioning = Arc::clone(&self.versioning);
        let validator = self.lifecycle.validator();
        self.lifecycle
            .save(
                model,
                move |uow, model| {
                    Box::pin(async move {
                        save_content(uow, model, &versioning, &*validator).await
                    })
                },
                |uow, id| Box::pin(async move { load_header(uow, id).await }),
            )
            .await
    }

    /// Record a future publication or archival.
    pub async fn schedule(
        &self,
        model: &ScheduleModel,
    ) -> Result<Option<EntityHeader>, LifecycleError> {
        self.lifecycle
            .schedule_entity(model, |uow, model| {
                Box::pin(async move {
                    let id = model
                        .assigned_id()
                        .ok_or_else(|| AppError::not_found("Entity not found"))?;
                    load_header(uow, id).await
                })
            })
            .await
    }

    /// Validate one version.
    ///
    /// With an `editor` token the root of the version is locked for that
    /// editor, or its lease renewed when the editor already holds it.
    pub async fn validate(
        &self,
        entity_id: EntityVersionId,
        editor: Option<LockToken>,
    ) -> Result<EntityHeader, LifecycleError> {
        let lock_action = editor.map(|token| {
            let locks = Arc::clone(&self.locks);
            Box::new(
                move |root_id: EntityRootId| -> BoxFuture<'static, AppResult<()>> {
                    Box::pin(async move { locks.refresh(root_id, token).await })
                },
            ) as LockAction
        });

        self.lifecycle
            .validate(lock_action, move |uow| {
                Box::pin(async move { load_header(uow, entity_id).await })
            })
            .await
    }

    /// Release an editor lock taken through [`validate`](Self::validate).
    pub async fn release(&self, root_id: EntityRootId, editor: LockToken) -> AppResult<()> {
        self.locks.unlock(root_id, editor).await
    }

    fn ensure_known_languages(&self, model: &SaveContentModel) -> AppResult<()> {
        let requested = model
            .contents
            .iter()
            .map(|c| c.language_id)
            .chain(model.publish_languages.iter().copied());
        for language_id in requested {
            if self.languages.code_of(language_id).is_none() {
                return Err(AppError::validation(format!(
                    "Unknown language {language_id}"
                )));
            }
        }
        Ok(())
    }
}

/// Build the header of a stored version.
pub async fn load_header<W>(uow: &mut W, id: EntityVersionId) -> AppResult<EntityHeader>
where
    W: VersionStore<ContentVersion>,
{
    uow.find_version(id)
        .await?
        .map(|version| EntityHeader::from_version(&version))
        .ok_or_else(|| AppError::not_found(format!("Version {id} not found")))
}

async fn save_content<W, C>(
    uow: &mut W,
    model: &SaveContentModel,
    versioning: &VersioningManager,
    validator: &C,
) -> AppResult<EntityVersionId>
where
    W: VersionStore<ContentVersion> + RootStore<ContentRoot>,
    C: ValidationChecker<W>,
{
    let now = Utc::now();

    let (mut version, is_new) = match model.id {
        None => {
            let root = ContentRoot::new(model.kind);
            let languages: Vec<LanguageId> = model.contents.iter().map(|c| c.language_id).collect();
            RootStore::insert_root(&mut *uow, &root).await?;
            info!(root_id = %root.id, kind = %root.kind, "Content root created");
            (ContentVersion::first(&root, &languages), true)
        }
        Some(id) => {
            let version: ContentVersion = versioning
                .create_version(&mut *uow, id, model.versioning_mode)
                .await?;
            if version.kind != model.kind {
                return Err(AppError::validation(format!(
                    "Version {id} is a {}, not a {}",
                    version.kind, model.kind
                )));
            }
            (version, false)
        }
    };

    version.organization_id = model.organization_id;
    for content in &model.contents {
        version.upsert_content(content.clone());
    }
    refresh_status(&mut version);
    version.touch(model.modified_by, now);

    if is_new {
        uow.insert_version(&version).await?;
    } else {
        uow.update_version(&version).await?;
    }

    if model.action == EntityAction::SaveAndPublish {
        let ready = publishable_languages(&mut *uow, &version, &model.publish_languages, validator)
            .await?;
        if !ready.is_empty() {
            versioning
                .publish(&mut *uow, &mut version, &ready, model.modified_by, now)
                .await?;
        }
    }

    Ok(version.id)
}

/// The requested languages (every language when none are named) that the
/// validator reports no unresolved rules for.
async fn publishable_languages<W, C>(
    uow: &mut W,
    version: &ContentVersion,
    requested: &[LanguageId],
    validator: &C,
) -> AppResult<Vec<LanguageId>>
where
    W: Send,
    C: ValidationChecker<W>,
{
    if let Some(missing) = requested.iter().find(|id| version.language(**id).is_none()) {
        return Err(AppError::validation(format!(
            "Language {missing} is not available on version {}",
            version.id
        )));
    }

    let targets: Vec<HeaderLanguage> = EntityHeader::from_version(version)
        .language_availabilities
        .into_iter()
        .filter(|l| requested.is_empty() || requested.contains(&l.language_id))
        .collect();
    let messages = validator.check_entity(version.id, uow, &targets).await?;

    let (ready, blocked): (Vec<LanguageId>, Vec<LanguageId>) = targets
        .iter()
        .map(|l| l.language_id)
        .partition(|id| messages.for_language(*id).is_empty());
    if !blocked.is_empty() {
        warn!(
            entity_id = %version.id,
            blocked = blocked.len(),
            "Languages with unresolved rules left unpublished"
        );
    }
    Ok(ready)
}

