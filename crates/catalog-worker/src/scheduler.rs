//! Cron scheduler for periodic jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use catalog_core::error::AppError;

use crate::jobs::ScheduledJob;

/// Cron-based scheduler for periodic background jobs
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Run `job` on the six-field cron `expression`.
    ///
    /// A pass that fails is logged; the next tick runs again.
    pub async fn register(
        &self,
        expression: &str,
        job: Arc<dyn ScheduledJob>,
    ) -> Result<(), AppError> {
        let name = job.name().to_string();
        let cron_job = CronJob::new_async(expression, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                tracing::debug!(job = job.name(), "Running scheduled job");
                if let Err(e) = job.execute().await {
                    tracing::error!(job = job.name(), error = %e, "Scheduled job failed");
                }
            })
        })
        .map_err(|e| {
            AppError::scheduler(format!("Failed to create {name} schedule '{expression}': {e}"))
        })?;

        self.scheduler
            .add(cron_job)
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to add {name} schedule: {e}")))?;

        tracing::info!(job = %name, expression, "Registered scheduled job");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
