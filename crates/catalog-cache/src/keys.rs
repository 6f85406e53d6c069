//! Cache key builders for every catalog cache entry.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use catalog_core::types::EntityRootId;

/// Prefix applied to all catalog cache keys.
const PREFIX: &str = "catalog";

// ── Lock keys ──────────────────────────────────────────────

/// Cache key holding the lock on one entity root.
pub fn entity_lock(root_id: EntityRootId) -> String {
    format!("{PREFIX}:lock:entity:{root_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key() {
        assert_eq!(
            entity_lock(EntityRootId::nil()),
            "catalog:lock:entity:00000000-0000-0000-0000-000000000000"
        );
    }
}
