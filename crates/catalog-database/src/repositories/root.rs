//! Content root repository.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::types::EntityRootId;
use catalog_entity::content::{ContentRoot, EntityKind};

#[derive(Debug, sqlx::FromRow)]
struct RootRow {
    id: EntityRootId,
    kind: String,
    created_at: DateTime<Utc>,
}

impl RootRow {
    fn into_root(self) -> AppResult<ContentRoot> {
        Ok(ContentRoot {
            id: self.id,
            kind: self.kind.parse::<EntityKind>()?,
            created_at: self.created_at,
        })
    }
}

/// Repository for `entity_root` rows.
#[derive(Debug, Clone, Default)]
pub struct RootRepository;

impl RootRepository {
    /// Find a root by ID.
    pub async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        id: EntityRootId,
    ) -> AppResult<Option<ContentRoot>> {
        sqlx::query_as::<_, RootRow>("SELECT id, kind, created_at FROM entity_root WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find root", e))?
            .map(RootRow::into_root)
            .transpose()
    }

    /// Insert a new root.
    pub async fn create(&self, conn: &mut PgConnection, root: &ContentRoot) -> AppResult<()> {
        sqlx::query("INSERT INTO entity_root (id, kind, created_at) VALUES ($1, $2, $3)")
            .bind(root.id)
            .bind(root.kind.as_str())
            .bind(root.created_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create root", e))?;
        Ok(())
    }
}
