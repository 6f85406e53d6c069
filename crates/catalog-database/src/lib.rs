//! # catalog-database
//!
//! PostgreSQL connection management, the transactional unit of work used
//! by the lifecycle engine, and the repositories behind it. An in-memory
//! unit of work with the same seams is provided for tests and local runs.

pub mod connection;
pub mod lookups;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod unit_of_work;

pub use connection::DatabasePool;
pub use lookups::StatusLookups;
pub use memory::{MemoryUnitOfWork, MemoryUnitOfWorkProvider, UnitOfWorkCounts};
pub use repositories::PgLockService;
pub use unit_of_work::{PgUnitOfWork, PgUnitOfWorkProvider};
