//! Content version repository.
//!
//! A version is stored as one `entity_version` row plus its
//! `language_availability` and `localized_content` children. Child rows
//! are rewritten as a set on every save.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use catalog_cache::LookupCache;
use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId, OrganizationId, UserId};
use catalog_entity::content::{
    ContentLanguageAvailability, ContentVersion, EntityKind, LocalizedContent,
};
use catalog_entity::status::{LanguageStatus, PublishingStatus};
use catalog_entity::versioning::{VersionNumber, VersioningInfo};

use crate::lookups::StatusLookups;

const SELECT_VERSION: &str = "SELECT id, root_id, kind, organization_id, publishing_status_id, \
     version_major, version_minor, predecessor_id, successor_id, valid_from, valid_to, \
     created_at, modified_at, modified_by FROM entity_version";

#[derive(Debug, sqlx::FromRow)]
struct VersionRow {
    id: EntityVersionId,
    root_id: EntityRootId,
    kind: String,
    organization_id: Option<OrganizationId>,
    publishing_status_id: Uuid,
    version_major: i32,
    version_minor: i32,
    predecessor_id: Option<EntityVersionId>,
    successor_id: Option<EntityVersionId>,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    modified_by: Option<UserId>,
}

#[derive(Debug, sqlx::FromRow)]
struct LanguageRow {
    version_id: EntityVersionId,
    language_id: LanguageId,
    status_id: Uuid,
    publish_at: Option<DateTime<Utc>>,
    archive_at: Option<DateTime<Utc>>,
    reviewed_by: Option<UserId>,
    reviewed_at: Option<DateTime<Utc>>,
    last_failed_publish_at: Option<DateTime<Utc>>,
    modified_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    language_id: LanguageId,
    name: String,
    alternate_name: Option<String>,
    summary: Option<String>,
    description: Option<String>,
}

impl From<ContentRow> for LocalizedContent {
    fn from(row: ContentRow) -> Self {
        Self {
            language_id: row.language_id,
            name: row.name,
            alternate_name: row.alternate_name,
            summary: row.summary,
            description: row.description,
        }
    }
}

/// Repository for content versions and their child rows.
#[derive(Debug, Clone)]
pub struct VersionRepository {
    publishing: Arc<LookupCache<PublishingStatus>>,
    language: Arc<LookupCache<LanguageStatus>>,
}

impl VersionRepository {
    /// Create a repository resolving statuses through `lookups`.
    pub fn new(lookups: &StatusLookups) -> Self {
        Self {
            publishing: Arc::clone(&lookups.publishing),
            language: Arc::clone(&lookups.language),
        }
    }

    /// Find a version by ID.
    pub async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        id: EntityVersionId,
    ) -> AppResult<Option<ContentVersion>> {
        let row = sqlx::query_as::<_, VersionRow>(&format!("{SELECT_VERSION} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find version", e))?;

        match row {
            Some(row) => self.assemble(conn, row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Find the end of the chain of `root_id`.
    pub async fn find_latest(
        &self,
        conn: &mut PgConnection,
        root_id: EntityRootId,
    ) -> AppResult<Option<ContentVersion>> {
        let row = sqlx::query_as::<_, VersionRow>(&format!(
            "{SELECT_VERSION} WHERE root_id = $1 AND successor_id IS NULL \
             ORDER BY version_major DESC, version_minor DESC LIMIT 1"
        ))
        .bind(root_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find latest version", e)
        })?;

        match row {
            Some(row) => self.assemble(conn, row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Find the currently published version of `root_id`.
    pub async fn find_published(
        &self,
        conn: &mut PgConnection,
        root_id: EntityRootId,
    ) -> AppResult<Option<ContentVersion>> {
        let published_id = self.publishing.id_of(PublishingStatus::Published)?;
        let row = sqlx::query_as::<_, VersionRow>(&format!(
            "{SELECT_VERSION} WHERE root_id = $1 AND publishing_status_id = $2 \
             ORDER BY version_major DESC LIMIT 1"
        ))
        .bind(root_id)
        .bind(published_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find published version", e)
        })?;

        match row {
            Some(row) => self.assemble(conn, row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Insert a new version and its child rows.
    pub async fn create(&self, conn: &mut PgConnection, version: &ContentVersion) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO entity_version (id, root_id, kind, organization_id, publishing_status_id, \
             version_major, version_minor, predecessor_id, successor_id, valid_from, valid_to, \
             created_at, modified_at, modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(version.id)
        .bind(version.root_id)
        .bind(version.kind.as_str())
        .bind(version.organization_id)
        .bind(self.publishing.id_of(version.publishing_status)?)
        .bind(version.versioning.number.major)
        .bind(version.versioning.number.minor)
        .bind(version.versioning.predecessor_id)
        .bind(version.versioning.successor_id)
        .bind(version.valid_from)
        .bind(version.valid_to)
        .bind(version.created_at)
        .bind(version.modified_at)
        .bind(version.modified_by)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create version", e))?;

        self.write_children(conn, version).await
    }

    /// Update a version and rewrite its child rows.
    pub async fn update(&self, conn: &mut PgConnection, version: &ContentVersion) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE entity_version SET organization_id = $2, publishing_status_id = $3, \
             version_major = $4, version_minor = $5, predecessor_id = $6, successor_id = $7, \
             valid_from = $8, valid_to = $9, modified_at = $10, modified_by = $11 \
             WHERE id = $1",
        )
        .bind(version.id)
        .bind(version.organization_id)
        .bind(self.publishing.id_of(version.publishing_status)?)
        .bind(version.versioning.number.major)
        .bind(version.versioning.number.minor)
        .bind(version.versioning.predecessor_id)
        .bind(version.versioning.successor_id)
        .bind(version.valid_from)
        .bind(version.valid_to)
        .bind(version.modified_at)
        .bind(version.modified_by)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update version", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Version {} not found", version.id)));
        }

        self.write_children(conn, version).await
    }

    async fn write_children(
        &self,
        conn: &mut PgConnection,
        version: &ContentVersion,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM language_availability WHERE version_id = $1")
            .bind(version.id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear languages", e)
            })?;

        for language in &version.languages {
            sqlx::query(
                "INSERT INTO language_availability (version_id, language_id, status_id, \
                 publish_at, archive_at, reviewed_by, reviewed_at, last_failed_publish_at, \
                 modified_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(version.id)
            .bind(language.language_id)
            .bind(self.language.id_of(language.status)?)
            .bind(language.publish_at)
            .bind(language.archive_at)
            .bind(language.reviewed_by)
            .bind(language.reviewed_at)
            .bind(language.last_failed_publish_at)
            .bind(language.modified_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to write language row", e)
            })?;
        }

        sqlx::query("DELETE FROM localized_content WHERE version_id = $1")
            .bind(version.id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear texts", e))?;

        for content in &version.contents {
            sqlx::query(
                "INSERT INTO localized_content (version_id, language_id, name, alternate_name, \
                 summary, description) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(version.id)
            .bind(content.language_id)
            .bind(&content.name)
            .bind(&content.alternate_name)
            .bind(&content.summary)
            .bind(&content.description)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write texts", e))?;
        }

        Ok(())
    }

    async fn assemble(&self, conn: &mut PgConnection, row: VersionRow) -> AppResult<ContentVersion> {
        let language_rows = sqlx::query_as::<_, LanguageRow>(
            "SELECT version_id, language_id, status_id, publish_at, archive_at, reviewed_by, \
             reviewed_at, last_failed_publish_at, modified_at \
             FROM language_availability WHERE version_id = $1 ORDER BY language_id",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load languages", e))?;

        let content_rows = sqlx::query_as::<_, ContentRow>(
            "SELECT language_id, name, alternate_name, summary, description \
             FROM localized_content WHERE version_id = $1 ORDER BY language_id",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load texts", e))?;

        let languages = language_rows
            .into_iter()
            .map(|l| {
                Ok(ContentLanguageAvailability {
                    version_id: l.version_id,
                    language_id: l.language_id,
                    status: self.language.key_of(l.status_id)?,
                    publish_at: l.publish_at,
                    archive_at: l.archive_at,
                    reviewed_by: l.reviewed_by,
                    reviewed_at: l.reviewed_at,
                    last_failed_publish_at: l.last_failed_publish_at,
                    modified_at: l.modified_at,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(ContentVersion {
            id: row.id,
            root_id: row.root_id,
            kind: row.kind.parse::<EntityKind>()?,
            organization_id: row.organization_id,
            publishing_status: self.publishing.key_of(row.publishing_status_id)?,
            versioning: VersioningInfo {
                number: VersionNumber {
                    major: row.version_major,
                    minor: row.version_minor,
                },
                predecessor_id: row.predecessor_id,
                successor_id: row.successor_id,
            },
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            languages,
            contents: content_rows.into_iter().map(LocalizedContent::from).collect(),
            created_at: row.created_at,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
        })
    }
}
