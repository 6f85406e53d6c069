//! PostgreSQL pool for the catalog and the services built on it.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use catalog_cache::LanguageCache;
use catalog_core::config::DatabaseConfig;
use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;

use crate::lookups::{StatusLookups, load_languages};
use crate::migration::run_migrations;
use crate::repositories::PgLockService;
use crate::unit_of_work::PgUnitOfWorkProvider;

/// Connected pool. Hands out the units of work, locks, and lookups that
/// share it.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect and, when `run_migrations` is set, bring the schema up to date.
    pub async fn open(config: &DatabaseConfig) -> AppResult<Self> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = pool_options(config)
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        if config.run_migrations {
            run_migrations(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Read the status and language type tables.
    pub async fn load_lookups(&self) -> AppResult<(StatusLookups, LanguageCache)> {
        let statuses = StatusLookups::load(&self.pool).await?;
        let languages = load_languages(&self.pool).await?;
        Ok((statuses, languages))
    }

    /// Transactions over this pool, decoding statuses with `lookups`.
    pub fn units_of_work(&self, lookups: &StatusLookups) -> PgUnitOfWorkProvider {
        PgUnitOfWorkProvider::new(self.pool.clone(), lookups)
    }

    /// Entity locks kept in the `entity_lock` table.
    pub fn locks(&self, ttl: Duration) -> PgLockService {
        PgLockService::new(self.pool.clone(), ttl)
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
}

/// Mask the password portion of a database URL for logging.
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
