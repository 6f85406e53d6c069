//! # catalog-cache
//!
//! Cache infrastructure for the service catalog:
//!
//! - **memory**: in-process [`CacheProvider`](catalog_core::traits::CacheProvider)
//!   using [moka](https://crates.io/crates/moka) with per-entry TTLs
//! - **lookup**: explicitly constructed language and status-type caches that
//!   map stable codes to row identifiers
//! - **lock**: an [`EntityLockService`](catalog_core::traits::EntityLockService)
//!   built on set-if-absent cache keys
//!
//! The cache provider is selected at runtime based on configuration.

pub mod keys;
pub mod lock;
pub mod lookup;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;

pub use lock::CacheLockService;
pub use lookup::{LanguageCache, LookupCache};
pub use provider::CacheManager;
