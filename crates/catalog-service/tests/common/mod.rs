//! Shared doubles and fixtures for lifecycle tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::lock::EntityLockService;
use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId, LockToken};
use catalog_database::MemoryUnitOfWorkProvider;
use catalog_entity::content::{ContentRoot, ContentVersion, EntityKind, LocalizedContent};
use catalog_entity::lifecycle::{HeaderLanguage, ValidationMessages, ValidationRuleKey};
use catalog_entity::status::LanguageStatus;
use catalog_service::versioning::manager::refresh_status;
use catalog_service::{EntityLifecycleManager, ValidationChecker};

/// Validator returning fixed messages and counting its calls.
#[derive(Debug, Default)]
pub struct CountingValidator {
    messages: ValidationMessages,
    calls: AtomicUsize,
}

impl CountingValidator {
    pub fn returning(messages: ValidationMessages) -> Self {
        Self {
            messages,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<W: Send> ValidationChecker<W> for CountingValidator {
    async fn check_entity(
        &self,
        _entity_id: EntityVersionId,
        _uow: &mut W,
        _languages: &[HeaderLanguage],
    ) -> AppResult<ValidationMessages> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.messages.clone())
    }
}

/// Lock double counting acquisitions and releases.
#[derive(Debug, Default)]
pub struct CountingLock {
    locks: AtomicUsize,
    refreshes: AtomicUsize,
    unlocks: AtomicUsize,
    holder: Mutex<Option<(EntityRootId, LockToken)>>,
    refuse: bool,
}

impl CountingLock {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn locks(&self) -> usize {
        self.locks.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn unlocks(&self) -> usize {
        self.unlocks.load(Ordering::SeqCst)
    }

    /// Root and token of the last acquisition.
    pub fn holder(&self) -> Option<(EntityRootId, LockToken)> {
        *self.holder.lock().unwrap()
    }
}

#[async_trait]
impl EntityLockService for CountingLock {
    async fn lock(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        self.locks.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(AppError::conflict(format!("Entity {root_id} is locked")));
        }
        *self.holder.lock().unwrap() = Some((root_id, token));
        Ok(())
    }

    async fn refresh(&self, root_id: EntityRootId, token: LockToken) -> AppResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(AppError::conflict(format!("Entity {root_id} is locked")));
        }
        *self.holder.lock().unwrap() = Some((root_id, token));
        Ok(())
    }

    async fn unlock(&self, _root_id: EntityRootId, _token: LockToken) -> AppResult<()> {
        self.unlocks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_locked(&self, _root_id: EntityRootId) -> AppResult<bool> {
        Ok(self.locks() > self.unlocks())
    }
}

pub type TestManager =
    EntityLifecycleManager<ContentVersion, MemoryUnitOfWorkProvider, CountingValidator>;

/// A lifecycle manager wired to counting doubles.
pub struct Harness {
    pub provider: Arc<MemoryUnitOfWorkProvider>,
    pub validator: Arc<CountingValidator>,
    pub locks: Arc<CountingLock>,
    pub manager: TestManager,
}

impl Harness {
    pub fn new(messages: ValidationMessages) -> Self {
        Self::with_lock(messages, CountingLock::default())
    }

    pub fn with_lock(messages: ValidationMessages, lock: CountingLock) -> Self {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let validator = Arc::new(CountingValidator::returning(messages));
        let locks = Arc::new(lock);
        let manager = EntityLifecycleManager::new(
            Arc::clone(&provider),
            Arc::clone(&validator),
            Arc::clone(&locks) as Arc<dyn EntityLockService>,
        );
        Self {
            provider,
            validator,
            locks,
            manager,
        }
    }

    /// Store a service whose languages carry the given statuses.
    pub async fn seed(&self, languages: &[(LanguageId, LanguageStatus)]) -> ContentVersion {
        let root = ContentRoot::new(EntityKind::Service);
        let ids: Vec<LanguageId> = languages.iter().map(|(id, _)| *id).collect();
        let mut version = ContentVersion::first(&root, &ids);
        for (language_id, status) in languages {
            version.upsert_content(LocalizedContent::named(*language_id, "Parking permit"));
            if let Some(row) = version.languages.iter_mut().find(|l| l.language_id == *language_id) {
                row.status = *status;
            }
        }
        refresh_status(&mut version);
        self.provider.seed(root, version.clone()).await;
        version
    }
}

/// A manager over `locks` that several tasks can drive at once.
pub fn shared_manager(
    locks: Arc<dyn EntityLockService>,
) -> (Arc<MemoryUnitOfWorkProvider>, Arc<TestManager>) {
    let provider = Arc::new(MemoryUnitOfWorkProvider::new());
    let manager = EntityLifecycleManager::new(
        Arc::clone(&provider),
        Arc::new(CountingValidator::default()),
        locks,
    );
    (provider, Arc::new(manager))
}

/// A single violation in `language_id`.
pub fn violation(language_id: LanguageId) -> ValidationMessages {
    let mut messages = ValidationMessages::new();
    messages.push(language_id, ValidationRuleKey::DescriptionRequired);
    messages
}
