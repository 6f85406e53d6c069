//! Scheduled publishing configuration.

use serde::{Deserialize, Serialize};

/// Settings for the time-driven publish/archive processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the processor runs in this process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression (seconds first) for the sweep.
    #[serde(default = "default_expression")]
    pub expression: String,
    /// Maximum language availabilities handled per sweep.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            expression: default_expression(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_expression() -> String {
    "0 * * * * *".to_string()
}

fn default_batch_size() -> i64 {
    200
}
