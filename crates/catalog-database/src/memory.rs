//! In-memory unit of work.
//!
//! Each unit works on a private snapshot of the shared state taken when it
//! begins. Commit writes back only the rows the unit touched, so two
//! overlapping writers to the same row resolve as last writer wins.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::store::{DueLanguage, RootStore, ScheduleStore, VersionStore};
use catalog_core::traits::unit_of_work::{UnitOfWork, UnitOfWorkProvider};
use catalog_core::types::{EntityRootId, EntityVersionId};
use catalog_entity::content::{ContentRoot, ContentVersion};
use catalog_entity::status::PublishingStatus;
use catalog_entity::traits::VersionedEntity;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    roots: HashMap<EntityRootId, ContentRoot>,
    versions: HashMap<EntityVersionId, ContentVersion>,
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
}

/// How many units were opened and how each one ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitOfWorkCounts {
    /// Units begun, read and write.
    pub opened: usize,
    /// Units committed.
    pub committed: usize,
    /// Units rolled back.
    pub rolled_back: usize,
}

/// Provider of in-memory units of work sharing one state.
#[derive(Debug, Clone, Default)]
pub struct MemoryUnitOfWorkProvider {
    state: Arc<RwLock<MemoryState>>,
    counters: Arc<Counters>,
}

impl MemoryUnitOfWorkProvider {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root and its version directly, outside any unit of work.
    pub async fn seed(&self, root: ContentRoot, version: ContentVersion) {
        let mut state = self.state.write().await;
        state.roots.insert(root.id, root);
        state.versions.insert(version.id, version);
    }

    /// Committed state of one version.
    pub async fn version(&self, id: EntityVersionId) -> Option<ContentVersion> {
        self.state.read().await.versions.get(&id).cloned()
    }

    /// Committed versions of one root, oldest number first.
    pub async fn versions_of(&self, root_id: EntityRootId) -> Vec<ContentVersion> {
        let state = self.state.read().await;
        let mut versions: Vec<ContentVersion> = state
            .versions
            .values()
            .filter(|v| v.root_id == root_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.versioning.number);
        versions
    }

    /// Unit-of-work counters.
    pub fn counts(&self) -> UnitOfWorkCounts {
        UnitOfWorkCounts {
            opened: self.counters.opened.load(Ordering::SeqCst),
            committed: self.counters.committed.load(Ordering::SeqCst),
            rolled_back: self.counters.rolled_back.load(Ordering::SeqCst),
        }
    }

    async fn begin(&self, writable: bool) -> MemoryUnitOfWork {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.state.read().await.clone();
        MemoryUnitOfWork {
            shared: Arc::clone(&self.state),
            counters: Arc::clone(&self.counters),
            snapshot,
            dirty_roots: HashSet::new(),
            dirty_versions: HashSet::new(),
            writable,
        }
    }
}

#[async_trait]
impl UnitOfWorkProvider for MemoryUnitOfWorkProvider {
    type Read = MemoryUnitOfWork;
    type Write = MemoryUnitOfWork;

    async fn begin_read(&self) -> AppResult<MemoryUnitOfWork> {
        Ok(self.begin(false).await)
    }

    async fn begin_write(&self) -> AppResult<MemoryUnitOfWork> {
        Ok(self.begin(true).await)
    }
}

/// One in-memory unit of work.
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    shared: Arc<RwLock<MemoryState>>,
    counters: Arc<Counters>,
    snapshot: MemoryState,
    dirty_roots: HashSet<EntityRootId>,
    dirty_versions: HashSet<EntityVersionId>,
    writable: bool,
}

impl MemoryUnitOfWork {
    fn ensure_writable(&self) -> AppResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(AppError::internal("Write attempted on a read-only unit of work"))
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(mut self) -> AppResult<()> {
        if self.writable {
            let mut shared = self.shared.write().await;
            for id in self.dirty_roots.drain() {
                if let Some(root) = self.snapshot.roots.remove(&id) {
                    shared.roots.insert(id, root);
                }
            }
            for id in self.dirty_versions.drain() {
                if let Some(version) = self.snapshot.versions.remove(&id) {
                    shared.versions.insert(id, version);
                }
            }
        }
        self.counters.committed.fetch_add(1, Ordering::SeqCst);
        debug!("Memory unit of work committed");
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        self.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        debug!("Memory unit of work rolled back");
        Ok(())
    }
}

#[async_trait]
impl VersionStore<ContentVersion> for MemoryUnitOfWork {
    async fn find_version(&mut self, id: EntityVersionId) -> AppResult<Option<ContentVersion>> {
        Ok(self.snapshot.versions.get(&id).cloned())
    }

    async fn find_latest_version(
        &mut self,
        root_id: EntityRootId,
    ) -> AppResult<Option<ContentVersion>> {
        Ok(self
            .snapshot
            .versions
            .values()
            .filter(|v| v.root_id == root_id && !v.versioning.has_successor())
            .max_by_key(|v| v.versioning.number)
            .cloned())
    }

    async fn find_published_version(
        &mut self,
        root_id: EntityRootId,
    ) -> AppResult<Option<ContentVersion>> {
        Ok(self
            .snapshot
            .versions
            .values()
            .filter(|v| v.root_id == root_id && v.publishing_status == PublishingStatus::Published)
            .max_by_key(|v| v.versioning.number)
            .cloned())
    }

    async fn insert_version(&mut self, version: &ContentVersion) -> AppResult<()> {
        self.ensure_writable()?;
        if self.snapshot.versions.contains_key(&version.id) {
            return Err(AppError::conflict(format!(
                "Version {} already exists",
                version.id
            )));
        }
        self.snapshot.versions.insert(version.id, version.clone());
        self.dirty_versions.insert(version.id);
        Ok(())
    }

    async fn update_version(&mut self, version: &ContentVersion) -> AppResult<()> {
        self.ensure_writable()?;
        match self.snapshot.versions.get_mut(&version.id) {
            Some(existing) => {
                *existing = version.clone();
                self.dirty_versions.insert(version.id);
                Ok(())
            }
            None => Err(AppError::not_found(format!(
                "Version {} not found",
                version.id()
            ))),
        }
    }
}

#[async_trait]
impl RootStore<ContentRoot> for MemoryUnitOfWork {
    async fn find_root(&mut self, id: EntityRootId) -> AppResult<Option<ContentRoot>> {
        Ok(self.snapshot.roots.get(&id).cloned())
    }

    async fn insert_root(&mut self, root: &ContentRoot) -> AppResult<()> {
        self.ensure_writable()?;
        self.snapshot.roots.insert(root.id, root.clone());
        self.dirty_roots.insert(root.id);
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for MemoryUnitOfWork {
    async fn due_publications(
        &mut self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<DueLanguage>> {
        Ok(due(&self.snapshot, now, limit, |l| l.publish_at))
    }

    async fn due_archivals(&mut self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<DueLanguage>> {
        Ok(due(&self.snapshot, now, limit, |l| l.archive_at))
    }
}

fn due<F>(state: &MemoryState, now: DateTime<Utc>, limit: i64, instant: F) -> Vec<DueLanguage>
where
    F: Fn(&catalog_entity::content::ContentLanguageAvailability) -> Option<DateTime<Utc>>,
{
    let mut found: Vec<DueLanguage> = state
        .versions
        .values()
        .flat_map(|version| {
            version.languages.iter().filter_map(|language| {
                instant(language)
                    .filter(|at| *at <= now)
                    .map(|due_at| DueLanguage {
                        root_id: version.root_id,
                        entity_id: version.id,
                        language_id: language.language_id,
                        due_at,
                    })
            })
        })
        .collect();
    found.sort_by_key(|d| d.due_at);
    found.truncate(usize::try_from(limit).unwrap_or(0));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use catalog_core::error::ErrorKind;
    use catalog_core::types::LanguageId;
    use catalog_entity::content::EntityKind;
    use chrono::Duration;

    fn seeded_version() -> (ContentRoot, ContentVersion) {
        let root = ContentRoot::new(EntityKind::Service);
        let version = ContentVersion::first(&root, &[LanguageId::new()]);
        (root, version)
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let provider = MemoryUnitOfWorkProvider::new();
        let (root, version) = seeded_version();
        provider.seed(root, version.clone()).await;

        let mut uow = provider.begin_write().await.unwrap();
        let mut changed = version.clone();
        changed.organization_id = Some(catalog_core::types::OrganizationId::new());
        uow.update_version(&changed).await.unwrap();
        assert_eq!(provider.version(version.id).await, Some(version.clone()));

        uow.commit().await.unwrap();
        assert_eq!(provider.version(version.id).await, Some(changed));
        assert_eq!(provider.counts().committed, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let provider = MemoryUnitOfWorkProvider::new();
        let (root, version) = seeded_version();

        let mut uow = provider.begin_write().await.unwrap();
        uow.insert_root(&root).await.unwrap();
        uow.insert_version(&version).await.unwrap();
        uow.rollback().await.unwrap();

        assert_eq!(provider.version(version.id).await, None);
        assert_eq!(
            provider.counts(),
            UnitOfWorkCounts {
                opened: 1,
                committed: 0,
                rolled_back: 1
            }
        );
    }

    #[tokio::test]
    async fn test_read_unit_rejects_writes() {
        let provider = MemoryUnitOfWorkProvider::new();
        let (_, version) = seeded_version();
        let mut uow = provider.begin_read().await.unwrap();
        assert_matches!(
            uow.insert_version(&version).await,
            Err(e) if e.kind == ErrorKind::Internal
        );
    }

    #[tokio::test]
    async fn test_due_publications_sorted_and_limited() {
        let provider = MemoryUnitOfWorkProvider::new();
        let now = Utc::now();
        for offset in [3, 1, 2] {
            let (root, mut version) = seeded_version();
            version.languages[0].publish_at = Some(now - Duration::minutes(offset));
            provider.seed(root, version).await;
        }
        let (root, mut future) = seeded_version();
        future.languages[0].publish_at = Some(now + Duration::minutes(5));
        provider.seed(root, future).await;

        let mut uow = provider.begin_read().await.unwrap();
        let due = uow.due_publications(now, 2).await.unwrap();
        assert_eq!(due.len(), 2);
        assert!(due[0].due_at < due[1].due_at);
        assert_eq!(due[0].due_at, now - Duration::minutes(3));
    }
}
