//! Persistence seams used inside a unit of work.
//!
//! The lifecycle engine never talks to a database directly; it asks the
//! open unit of work for versions and roots through these traits. Each
//! store implementation decides how the rows are mapped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;
use crate::types::id::{EntityRootId, EntityVersionId, LanguageId};

/// Versioned snapshots reachable from an open unit of work.
#[async_trait]
pub trait VersionStore<V>: Send
where
    V: Send + Sync + 'static,
{
    /// Load one version with its language rows and texts.
    async fn find_version(&mut self, id: EntityVersionId) -> AppResult<Option<V>>;

    /// The version of `root_id` that currently has no successor.
    async fn find_latest_version(&mut self, root_id: EntityRootId) -> AppResult<Option<V>>;

    /// The version of `root_id` whose aggregate status is Published.
    async fn find_published_version(&mut self, root_id: EntityRootId) -> AppResult<Option<V>>;

    /// Persist a new version.
    async fn insert_version(&mut self, version: &V) -> AppResult<()>;

    /// Persist changes to an existing version.
    async fn update_version(&mut self, version: &V) -> AppResult<()>;
}

/// Roots reachable from an open unit of work.
#[async_trait]
pub trait RootStore<R>: Send
where
    R: Send + Sync + 'static,
{
    /// Load one root.
    async fn find_root(&mut self, id: EntityRootId) -> AppResult<Option<R>>;

    /// Persist a new root.
    async fn insert_root(&mut self, root: &R) -> AppResult<()>;
}

/// One language of one version whose scheduled instant has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueLanguage {
    /// Root of the version.
    pub root_id: EntityRootId,
    /// The version carrying the schedule.
    pub entity_id: EntityVersionId,
    /// The scheduled language.
    pub language_id: LanguageId,
    /// The instant that passed.
    pub due_at: DateTime<Utc>,
}

/// Queries used by the time-driven publisher.
#[async_trait]
pub trait ScheduleStore: Send {
    /// Languages whose `publish_at` is at or before `now`, oldest first.
    async fn due_publications(&mut self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<DueLanguage>>;

    /// Languages whose `archive_at` is at or before `now`, oldest first.
    async fn due_archivals(&mut self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<DueLanguage>>;
}
