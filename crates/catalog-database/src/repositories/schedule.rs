//! Queries over scheduled publication and archival instants.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::traits::store::DueLanguage;
use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId};

#[derive(Debug, sqlx::FromRow)]
struct DueRow {
    root_id: EntityRootId,
    version_id: EntityVersionId,
    language_id: LanguageId,
    due_at: DateTime<Utc>,
}

impl From<DueRow> for DueLanguage {
    fn from(row: DueRow) -> Self {
        Self {
            root_id: row.root_id,
            entity_id: row.version_id,
            language_id: row.language_id,
            due_at: row.due_at,
        }
    }
}

/// Repository for the time-driven publisher.
#[derive(Debug, Clone, Default)]
pub struct ScheduleRepository;

impl ScheduleRepository {
    /// Languages whose publication instant has passed.
    pub async fn due_publications(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<DueLanguage>> {
        sqlx::query_as::<_, DueRow>(
            "SELECT v.root_id, la.version_id, la.language_id, la.publish_at AS due_at \
             FROM language_availability la JOIN entity_version v ON v.id = la.version_id \
             WHERE la.publish_at IS NOT NULL AND la.publish_at <= $1 \
             ORDER BY la.publish_at ASC LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map(|rows| rows.into_iter().map(DueLanguage::from).collect())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find due publications", e)
        })
    }

    /// Languages whose archival instant has passed.
    pub async fn due_archivals(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<DueLanguage>> {
        sqlx::query_as::<_, DueRow>(
            "SELECT v.root_id, la.version_id, la.language_id, la.archive_at AS due_at \
             FROM language_availability la JOIN entity_version v ON v.id = la.version_id \
             WHERE la.archive_at IS NOT NULL AND la.archive_at <= $1 \
             ORDER BY la.archive_at ASC LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map(|rows| rows.into_iter().map(DueLanguage::from).collect())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find due archivals", e)
        })
    }
}
