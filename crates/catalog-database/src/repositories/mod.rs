//! Repository implementations for catalog entities.
//!
//! Repositories that run inside a unit of work take the open connection
//! per call; the lock repository owns the pool because a lock must be
//! visible to other editors before the surrounding transaction commits.

pub mod lock;
pub mod root;
pub mod schedule;
pub mod version;

pub use lock::PgLockService;
pub use root::RootRepository;
pub use schedule::ScheduleRepository;
pub use version::VersionRepository;
