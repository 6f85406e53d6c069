//! Entity lifecycle manager.
//!
//! Every operation opens exactly one unit of work and ends it with exactly
//! one commit (on success) or rollback (on any error). Callers supply the
//! entity-specific load and save steps as closures receiving the open unit
//! of work; the manager supplies locking, validation, and decoration.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, error, info, warn};

use catalog_core::result::AppResult;
use catalog_core::traits::lock::EntityLockService;
use catalog_core::traits::store::VersionStore;
use catalog_core::traits::unit_of_work::{UnitOfWork, UnitOfWorkProvider};
use catalog_core::types::{EntityRootId, EntityVersionId, LockToken};
use catalog_entity::lifecycle::{
    EntityAction, EntityHeader, EntityModel, PublishAction, SaveModel, ScheduleModel,
    ValidationMessages,
};
use catalog_entity::traits::VersionedEntity;

use super::decorator::validated_header;
use crate::error::LifecycleError;
use crate::scheduling::SchedulingManager;
use crate::validation::ValidationChecker;

/// Action run once at the end of a [`validate`](EntityLifecycleManager::validate) pass.
///
/// Receives the root of the validated entity.
pub type LockAction = Box<dyn FnOnce(EntityRootId) -> BoxFuture<'static, AppResult<()>> + Send>;

/// The orchestrator behind Get, Save, ScheduleEntity, and Validate.
///
/// Generic over the version type `V`, the unit-of-work provider `P`, and
/// the validation checker `C`.
pub struct EntityLifecycleManager<V, P, C> {
    provider: Arc<P>,
    validator: Arc<C>,
    locks: Arc<dyn EntityLockService>,
    scheduling: SchedulingManager,
    _version: PhantomData<fn() -> V>,
}

impl<V, P, C> std::fmt::Debug for EntityLifecycleManager<V, P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityLifecycleManager")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl<V, P, C> EntityLifecycleManager<V, P, C>
where
    V: VersionedEntity,
    P: UnitOfWorkProvider,
    P::Read: VersionStore<V>,
    P::Write: VersionStore<V>,
    C: ValidationChecker<P::Read> + ValidationChecker<P::Write>,
{
    /// Create a new lifecycle manager.
    pub fn new(provider: Arc<P>, validator: Arc<C>, locks: Arc<dyn EntityLockService>) -> Self {
        Self {
            provider,
            validator,
            locks,
            scheduling: SchedulingManager::new(),
            _version: PhantomData,
        }
    }

    /// The checker every validation pass of this manager goes through.
    pub fn validator(&self) -> Arc<C> {
        Arc::clone(&self.validator)
    }

    /// Load the header of one entity.
    ///
    /// Fails with [`LifecycleError::EntityNotFound`] before opening a unit
    /// of work when the model carries no identifier or the nil identifier.
    /// Validation runs when the model asks for it or when the loaded header
    /// has a published or scheduled language.
    pub async fn get<M, F>(&self, model: &M, load: F) -> Result<EntityHeader, LifecycleError>
    where
        M: EntityModel,
        F: for<'a> FnOnce(&'a mut P::Read, &'a M) -> BoxFuture<'a, AppResult<EntityHeader>> + Send,
    {
        if model.assigned_id().is_none() {
            return Err(LifecycleError::EntityNotFound);
        }

        let mut uow = self.provider.begin_read().await?;
        let outcome = self.get_in_unit(&mut uow, model, load).await;
        finish(uow, outcome).await
    }

    async fn get_in_unit<M, F>(
        &self,
        uow: &mut P::Read,
        model: &M,
        load: F,
    ) -> Result<EntityHeader, LifecycleError>
    where
        M: EntityModel,
        F: for<'a> FnOnce(&'a mut P::Read, &'a M) -> BoxFuture<'a, AppResult<EntityHeader>> + Send,
    {
        let header = load(&mut *uow, model).await?;
        self.validate_if_needed(uow, header, model.include_validation())
            .await
    }

    /// Persist a change and return the reloaded header.
    ///
    /// A model without an identifier creates new content. A model carrying
    /// the nil identifier fails with [`LifecycleError::EntityNotFound`].
    /// `SaveAndPublish` of an existing entity locks its root under a fresh
    /// [`LockToken`] before anything is saved, and releases it after the
    /// unit of work has ended, whether the save succeeded or failed.
    pub async fn save<M, S, L>(
        &self,
        model: &M,
        save: S,
        load: L,
    ) -> Result<EntityHeader, LifecycleError>
    where
        M: SaveModel,
        S: for<'a> FnOnce(&'a mut P::Write, &'a M) -> BoxFuture<'a, AppResult<EntityVersionId>>
            + Send,
        L: for<'a> FnOnce(&'a mut P::Write, EntityVersionId) -> BoxFuture<'a, AppResult<EntityHeader>>
            + Send,
    {
        if model.entity_id().is_some_and(|id| id.is_nil()) {
            return Err(LifecycleError::EntityNotFound);
        }

        let action = model.action();
        let lock_target = model
            .assigned_id()
            .filter(|_| action == EntityAction::SaveAndPublish);

        let mut uow = self.provider.begin_write().await?;
        let lease = match lock_target {
            Some(entity_id) => match self.lock_root(&mut uow, entity_id).await {
                Ok(lease) => Some(lease),
                Err(e) => return finish(uow, Err(e)).await,
            },
            None => None,
        };

        let outcome = self.save_in_unit(&mut uow, model, action, save, load).await;
        let outcome = finish(uow, outcome).await;

        if let Some((root_id, token)) = lease {
            if let Err(e) = self.locks.unlock(root_id, token).await {
                warn!(root_id = %root_id, error = %e, "Failed to release entity lock");
            }
        }

        if let Ok(header) = &outcome {
            info!(entity_id = %header.id, action = %action, "Entity saved");
        }
        outcome
    }

    /// Lock the root owning `entity_id`.
    async fn lock_root(
        &self,
        uow: &mut P::Write,
        entity_id: EntityVersionId,
    ) -> Result<(EntityRootId, LockToken), LifecycleError> {
        let root_id = VersionStore::<V>::find_version(&mut *uow, entity_id)
            .await?
            .ok_or(LifecycleError::EntityNotFound)?
            .root_id();
        let token = LockToken::new();
        self.locks.lock(root_id, token).await?;
        Ok((root_id, token))
    }

    async fn save_in_unit<M, S, L>(
        &self,
        uow: &mut P::Write,
        model: &M,
        action: EntityAction,
        save: S,
        load: L,
    ) -> Result<EntityHeader, LifecycleError>
    where
        M: SaveModel,
        S: for<'a> FnOnce(&'a mut P::Write, &'a M) -> BoxFuture<'a, AppResult<EntityVersionId>>
            + Send,
        L: for<'a> FnOnce(&'a mut P::Write, EntityVersionId) -> BoxFuture<'a, AppResult<EntityHeader>>
            + Send,
    {
        let saved_id = save(&mut *uow, model).await?;
        let mut header = load(&mut *uow, saved_id).await?;
        header.action = Some(action);
        self.validate_if_needed(uow, header, action.includes_validation())
            .await
    }

    /// Record future publication or archival instants.
    ///
    /// Returns `Ok(None)` without opening a unit of work when the model
    /// carries no identifier or the nil identifier. Validation always runs
    /// first; a `SchedulePublish` over content with violations fails with
    /// [`LifecycleError::SchedulePublish`] before anything is recorded and
    /// before `load` is called.
    pub async fn schedule_entity<F>(
        &self,
        model: &ScheduleModel,
        load: F,
    ) -> Result<Option<EntityHeader>, LifecycleError>
    where
        F: for<'a> FnOnce(&'a mut P::Write, &'a ScheduleModel) -> BoxFuture<'a, AppResult<EntityHeader>>
            + Send,
    {
        let Some(entity_id) = model.assigned_id() else {
            debug!("Schedule request has no target; nothing to do");
            return Ok(None);
        };

        let mut uow = self.provider.begin_write().await?;
        let outcome = self.schedule_in_unit(&mut uow, entity_id, model, load).await;
        finish(uow, outcome).await.map(Some)
    }

    async fn schedule_in_unit<F>(
        &self,
        uow: &mut P::Write,
        entity_id: EntityVersionId,
        model: &ScheduleModel,
        load: F,
    ) -> Result<EntityHeader, LifecycleError>
    where
        F: for<'a> FnOnce(&'a mut P::Write, &'a ScheduleModel) -> BoxFuture<'a, AppResult<EntityHeader>>
            + Send,
    {
        let current = VersionStore::<V>::find_version(&mut *uow, entity_id)
            .await?
            .ok_or(LifecycleError::EntityNotFound)?;
        let snapshot = EntityHeader::from_version(&current);
        let messages = self.check(&mut *uow, &snapshot).await?;

        if model.publish_action == PublishAction::SchedulePublish && !messages.is_empty() {
            warn!(
                entity_id = %entity_id,
                violations = messages.len(),
                "Scheduled publishing blocked by validation"
            );
            return Err(LifecycleError::SchedulePublish {
                entity_id,
                messages,
            });
        }

        self.scheduling.apply::<V, _>(&mut *uow, model).await?;
        let header = load(&mut *uow, model).await?;
        Ok(validated_header(header, messages))
    }

    /// Validate and decorate unconditionally, then run `lock_action` once.
    pub async fn validate<F>(
        &self,
        lock_action: Option<LockAction>,
        load: F,
    ) -> Result<EntityHeader, LifecycleError>
    where
        F: for<'a> FnOnce(&'a mut P::Read) -> BoxFuture<'a, AppResult<EntityHeader>> + Send,
    {
        let mut uow = self.provider.begin_read().await?;
        let outcome = self.validate_in_unit(&mut uow, lock_action, load).await;
        finish(uow, outcome).await
    }

    async fn validate_in_unit<F>(
        &self,
        uow: &mut P::Read,
        lock_action: Option<LockAction>,
        load: F,
    ) -> Result<EntityHeader, LifecycleError>
    where
        F: for<'a> FnOnce(&'a mut P::Read) -> BoxFuture<'a, AppResult<EntityHeader>> + Send,
    {
        let header = load(&mut *uow).await?;
        let messages = self.check(&mut *uow, &header).await?;
        let header = validated_header(header, messages);

        if let Some(action) = lock_action {
            action(header.root_id).await?;
        }
        Ok(header)
    }

    /// Run validation when asked for, or when the header has a published or
    /// scheduled language, and decorate the header with the result.
    async fn validate_if_needed<W>(
        &self,
        uow: &mut W,
        header: EntityHeader,
        include_validation: bool,
    ) -> Result<EntityHeader, LifecycleError>
    where
        W: Send,
        C: ValidationChecker<W>,
    {
        if !include_validation && !header.has_published_or_scheduled_language() {
            debug!(entity_id = %header.id, "Validation skipped");
            return Ok(header);
        }
        let messages = self.check(uow, &header).await?;
        Ok(validated_header(header, messages))
    }

    async fn check<W>(
        &self,
        uow: &mut W,
        header: &EntityHeader,
    ) -> Result<ValidationMessages, LifecycleError>
    where
        W: Send,
        C: ValidationChecker<W>,
    {
        let messages = ValidationChecker::<W>::check_entity(
            &*self.validator,
            header.id,
            uow,
            &header.language_availabilities,
        )
        .await?;
        Ok(messages)
    }
}

/// End a unit of work according to `outcome`.
async fn finish<U, T>(uow: U, outcome: Result<T, LifecycleError>) -> Result<T, LifecycleError>
where
    U: UnitOfWork,
{
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "Rolling back unit of work");
            if let Err(rollback_err) = uow.rollback().await {
                error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
