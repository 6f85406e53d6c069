//! Loading of type tables into lookup caches.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use catalog_cache::{LanguageCache, LookupCache};
use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::types::LanguageId;
use catalog_entity::status::{LanguageStatus, PublishingStatus};

/// Status caches for version rows and language rows.
///
/// Both are resolved from the single `publishing_status_type` table.
#[derive(Debug, Clone)]
pub struct StatusLookups {
    /// Aggregate statuses of versions.
    pub publishing: Arc<LookupCache<PublishingStatus>>,
    /// Statuses of language availability rows.
    pub language: Arc<LookupCache<LanguageStatus>>,
}

impl StatusLookups {
    /// Read `publishing_status_type` and build both caches.
    pub async fn load(pool: &PgPool) -> AppResult<Self> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, code FROM publishing_status_type")
                .fetch_all(pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to load status types", e)
                })?;

        let lookups = Self {
            publishing: Arc::new(LookupCache::from_rows(rows.iter().cloned())?),
            language: Arc::new(LookupCache::from_rows(rows)?),
        };
        info!(
            publishing = lookups.publishing.len(),
            language = lookups.language.len(),
            "Status lookups loaded"
        );
        Ok(lookups)
    }

    /// Caches with generated identifiers, for stores without type tables.
    pub fn seeded() -> Self {
        Self {
            publishing: Arc::new(LookupCache::seeded()),
            language: Arc::new(LookupCache::seeded()),
        }
    }
}

/// Read the `language` table.
pub async fn load_languages(pool: &PgPool) -> AppResult<LanguageCache> {
    let rows: Vec<(LanguageId, String)> = sqlx::query_as("SELECT id, code FROM language")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load languages", e))?;

    info!(count = rows.len(), "Languages loaded");
    Ok(LanguageCache::from_rows(rows))
}
