//! Entity locking configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the lock taken by `SaveAndPublish` on existing entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockingConfig {
    /// Lock backend: `"database"` (lock table) or `"cache"` (set-if-absent key).
    #[serde(default = "default_backend")]
    pub backend: String,
    /// How long an abandoned lock survives before it may be taken over.
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            lock_ttl_seconds: default_lock_ttl(),
        }
    }
}

fn default_backend() -> String {
    "database".to_string()
}

fn default_lock_ttl() -> u64 {
    900
}
