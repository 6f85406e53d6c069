//! PostgreSQL unit of work.
//!
//! Each unit wraps one sqlx transaction. Dropping a unit without calling
//! `commit` rolls the transaction back.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::traits::store::{DueLanguage, RootStore, ScheduleStore, VersionStore};
use catalog_core::traits::unit_of_work::{UnitOfWork, UnitOfWorkProvider};
use catalog_core::types::{EntityRootId, EntityVersionId};
use catalog_entity::content::{ContentRoot, ContentVersion};

use crate::lookups::StatusLookups;
use crate::repositories::{RootRepository, ScheduleRepository, VersionRepository};

/// Opens transactions on a pool.
#[derive(Debug, Clone)]
pub struct PgUnitOfWorkProvider {
    pool: PgPool,
    repositories: Repositories,
}

#[derive(Debug, Clone)]
struct Repositories {
    roots: RootRepository,
    versions: VersionRepository,
    schedules: ScheduleRepository,
}

impl PgUnitOfWorkProvider {
    /// Create a provider for `pool` with loaded status lookups.
    pub fn new(pool: PgPool, lookups: &StatusLookups) -> Self {
        Self {
            pool,
            repositories: Repositories {
                roots: RootRepository,
                versions: VersionRepository::new(lookups),
                schedules: ScheduleRepository,
            },
        }
    }

    async fn begin(&self, read_only: bool) -> AppResult<PgUnitOfWork> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        if read_only {
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to set read-only mode", e)
                })?;
        }

        debug!(read_only, "Transaction started");
        Ok(PgUnitOfWork {
            tx,
            repositories: self.repositories.clone(),
        })
    }
}

#[async_trait]
impl UnitOfWorkProvider for PgUnitOfWorkProvider {
    type Read = PgUnitOfWork;
    type Write = PgUnitOfWork;

    async fn begin_read(&self) -> AppResult<PgUnitOfWork> {
        self.begin(true).await
    }

    async fn begin_write(&self) -> AppResult<PgUnitOfWork> {
        self.begin(false).await
    }
}

/// One open PostgreSQL transaction.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
    repositories: Repositories,
}

impl fmt::Debug for PgUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgUnitOfWork").finish_non_exhaustive()
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl VersionStore<ContentVersion> for PgUnitOfWork {
    async fn find_version(&mut self, id: EntityVersionId) -> AppResult<Option<ContentVersion>> {
        self.repositories.versions.find_by_id(&mut *self.tx, id).await
    }

    async fn find_latest_version(
        &mut self,
        root_id: EntityRootId,
    ) -> AppResult<Option<ContentVersion>> {
        self.repositories.versions.find_latest(&mut *self.tx, root_id).await
    }

    async fn find_published_version(
        &mut self,
        root_id: EntityRootId,
    ) -> AppResult<Option<ContentVersion>> {
        self.repositories
            .versions
            .find_published(&mut *self.tx, root_id)
            .await
    }

    async fn insert_version(&mut self, version: &ContentVersion) -> AppResult<()> {
        self.repositories.versions.create(&mut *self.tx, version).await
    }

    async fn update_version(&mut self, version: &ContentVersion) -> AppResult<()> {
        self.repositories.versions.update(&mut *self.tx, version).await
    }
}

#[async_trait]
impl RootStore<ContentRoot> for PgUnitOfWork {
    async fn find_root(&mut self, id: EntityRootId) -> AppResult<Option<ContentRoot>> {
        self.repositories.roots.find_by_id(&mut *self.tx, id).await
    }

    async fn insert_root(&mut self, root: &ContentRoot) -> AppResult<()> {
        self.repositories.roots.create(&mut *self.tx, root).await
    }
}

#[async_trait]
impl ScheduleStore for PgUnitOfWork {
    async fn due_publications(
        &mut self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<DueLanguage>> {
        self.repositories
            .schedules
            .due_publications(&mut *self.tx, now, limit)
            .await
    }

    async fn due_archivals(&mut self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<DueLanguage>> {
        self.repositories
            .schedules
            .due_archivals(&mut *self.tx, now, limit)
            .await
    }
}
