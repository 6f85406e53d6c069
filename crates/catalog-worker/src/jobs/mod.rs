//! Jobs run by the cron scheduler.

pub mod publishing;

use async_trait::async_trait;
use serde_json::Value;

use catalog_core::error::AppError;

pub use publishing::ScheduledPublishingJob;

/// A unit of periodic work.
#[async_trait]
pub trait ScheduledJob: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run one pass and return a summary of what happened.
    async fn execute(&self) -> Result<Value, JobExecutionError>;
}

/// Error from a job pass.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Failure expected to clear up by the next pass
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}
