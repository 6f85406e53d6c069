//! Lookup caches resolving stable codes to row identifiers.
//!
//! Both caches are built once at startup from their type tables and passed
//! by `Arc` to whoever needs them. There is no global instance.

use std::marker::PhantomData;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::types::LanguageId;
use catalog_entity::status::LookupKey;

/// Bidirectional map between a closed set of codes and type-row identifiers.
#[derive(Debug)]
pub struct LookupCache<K: LookupKey> {
    ids: DashMap<K, Uuid>,
    keys: DashMap<Uuid, K>,
    _kind: PhantomData<K>,
}

impl<K: LookupKey> LookupCache<K> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
            keys: DashMap::new(),
            _kind: PhantomData,
        }
    }

    /// Build from `(id, code)` rows. Rows with unknown codes are skipped;
    /// every variant of `K` must be present.
    pub fn from_rows<I>(rows: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (Uuid, String)>,
    {
        let cache = Self::new();
        for (id, code) in rows {
            match K::from_code(&code) {
                Some(key) => cache.insert(key, id),
                None => debug!(code = %code, "Skipping lookup code of another type"),
            }
        }
        cache.ensure_complete()?;
        Ok(cache)
    }

    /// A cache with a fresh identifier for every variant (for tests and
    /// stores that do not persist type rows).
    pub fn seeded() -> Self {
        let cache = Self::new();
        for key in K::ALL {
            cache.insert(*key, Uuid::new_v4());
        }
        cache
    }

    /// Register one mapping.
    pub fn insert(&self, key: K, id: Uuid) {
        self.ids.insert(key, id);
        self.keys.insert(id, key);
    }

    /// Identifier of the row for `key`.
    pub fn id_of(&self, key: K) -> AppResult<Uuid> {
        self.ids
            .get(&key)
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::configuration(format!("No type row for code '{}'", key.code())))
    }

    /// Variant for a row identifier.
    pub fn key_of(&self, id: Uuid) -> AppResult<K> {
        self.keys
            .get(&id)
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::not_found(format!("Unknown type row {id}")))
    }

    /// Number of mapped variants.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn ensure_complete(&self) -> AppResult<()> {
        let missing: Vec<&str> = K::ALL
            .iter()
            .filter(|key| !self.ids.contains_key(key))
            .map(|key| key.code())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::configuration(format!(
                "Type table is missing codes: {}",
                missing.join(", ")
            )))
        }
    }
}

impl<K: LookupKey> Default for LookupCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Language code (`fi`, `sv`, `en`, ...) to identifier map.
#[derive(Debug, Default)]
pub struct LanguageCache {
    by_code: DashMap<String, LanguageId>,
    by_id: DashMap<LanguageId, String>,
}

impl LanguageCache {
    /// Build from `(id, code)` rows.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (LanguageId, String)>,
    {
        let cache = Self::default();
        for (id, code) in rows {
            cache.insert(id, &code);
        }
        cache
    }

    /// Register one language.
    pub fn insert(&self, id: LanguageId, code: &str) {
        let code = code.to_lowercase();
        self.by_id.insert(id, code.clone());
        self.by_code.insert(code, id);
    }

    /// Identifier of a language code.
    pub fn id_of(&self, code: &str) -> AppResult<LanguageId> {
        self.by_code
            .get(&code.to_lowercase())
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::validation(format!("Unknown language code '{code}'")))
    }

    /// Code of a language identifier.
    pub fn code_of(&self, id: LanguageId) -> Option<String> {
        self.by_id.get(&id).map(|entry| entry.value().clone())
    }

    /// Every known language.
    pub fn languages(&self) -> Vec<LanguageId> {
        self.by_id.iter().map(|entry| *entry.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use catalog_core::error::ErrorKind;
    use catalog_entity::status::{LanguageStatus, PublishingStatus};

    #[test]
    fn test_from_rows_roundtrip() {
        let rows: Vec<(Uuid, String)> = LanguageStatus::ALL
            .iter()
            .map(|s| (Uuid::new_v4(), s.code().to_string()))
            .collect();
        let cache = LookupCache::<LanguageStatus>::from_rows(rows.clone()).unwrap();

        let published_id = cache.id_of(LanguageStatus::Published).unwrap();
        assert_eq!(cache.key_of(published_id).unwrap(), LanguageStatus::Published);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_missing_code_is_configuration_error() {
        let rows = vec![(Uuid::new_v4(), "draft".to_string())];
        let err = LookupCache::<PublishingStatus>::from_rows(rows).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("published"));
    }

    #[test]
    fn test_unknown_id() {
        let cache = LookupCache::<PublishingStatus>::seeded();
        assert_matches!(cache.key_of(Uuid::new_v4()), Err(e) if e.kind == ErrorKind::NotFound);
    }

    #[test]
    fn test_language_codes_are_case_insensitive() {
        let fi = LanguageId::new();
        let cache = LanguageCache::from_rows([(fi, "FI".to_string())]);
        assert_eq!(cache.id_of("fi").unwrap(), fi);
        assert_eq!(cache.code_of(fi).as_deref(), Some("fi"));
        assert!(cache.id_of("de").is_err());
    }
}
