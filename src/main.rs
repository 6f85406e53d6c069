//! Service Catalog Server
//!
//! Main entry point that wires the crates together and runs the scheduled
//! publishing processor until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use catalog_cache::{CacheLockService, CacheManager};
use catalog_core::config::AppConfig;
use catalog_core::error::AppError;
use catalog_core::traits::lock::EntityLockService;
use catalog_database::DatabasePool;
use catalog_service::{
    ContentService, ContentValidationManager, EntityLifecycleManager, VersioningManager,
};
use catalog_worker::{CronScheduler, ScheduledPublishingJob};

#[tokio::main]
async fn main() {
    let env = std::env::var("CATALOG_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Service Catalog v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::open(&config.database).await?;

    // ── Step 2: Lookup caches ────────────────────────────────────
    let (lookups, languages) = db.load_lookups().await?;
    let languages = Arc::new(languages);

    // ── Step 3: Locking ──────────────────────────────────────────
    let locks = build_lock_service(&config, &db)?;

    // ── Step 4: Lifecycle engine ─────────────────────────────────
    let provider = Arc::new(db.units_of_work(&lookups));
    let versioning = Arc::new(VersioningManager::new());
    let validator = Arc::new(ContentValidationManager::default());
    let lifecycle = Arc::new(EntityLifecycleManager::new(
        Arc::clone(&provider),
        Arc::clone(&validator),
        Arc::clone(&locks),
    ));
    let content = ContentService::new(lifecycle, Arc::clone(&versioning), languages, locks);
    tracing::debug!(service = ?content, "Content service ready");

    // ── Step 5: Scheduled publishing ─────────────────────────────
    let mut scheduler = if config.scheduler.enabled {
        let scheduler = CronScheduler::new().await?;
        let job = ScheduledPublishingJob::new(
            Arc::clone(&provider),
            versioning,
            validator,
            config.scheduler.batch_size,
        );
        scheduler
            .register(&config.scheduler.expression, Arc::new(job))
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Scheduled publishing disabled");
        None
    };

    // ── Step 6: Wait for shutdown ────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;
    tracing::info!("Shutdown signal received");

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    db.close().await;

    tracing::info!("Service Catalog stopped");
    Ok(())
}

/// Select the entity lock backend named in configuration.
fn build_lock_service(
    config: &AppConfig,
    db: &DatabasePool,
) -> Result<Arc<dyn EntityLockService>, AppError> {
    let ttl = Duration::from_secs(config.locking.lock_ttl_seconds);
    match config.locking.backend.as_str() {
        "database" => {
            tracing::info!("Using database entity locks");
            Ok(Arc::new(db.locks(ttl)))
        }
        "cache" => {
            tracing::info!(provider = %config.cache.provider, "Using cache entity locks");
            let cache = CacheManager::new(&config.cache)?;
            Ok(Arc::new(CacheLockService::new(cache.shared(), ttl)))
        }
        other => Err(AppError::configuration(format!(
            "Unknown lock backend: '{other}'. Supported: database, cache"
        ))),
    }
}
