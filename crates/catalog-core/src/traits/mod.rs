//! Collaborator traits defined in `catalog-core` and implemented by other crates.

pub mod cache;
pub mod lock;
pub mod store;
pub mod unit_of_work;

pub use cache::CacheProvider;
pub use lock::EntityLockService;
pub use store::{DueLanguage, RootStore, ScheduleStore, VersionStore};
pub use unit_of_work::{UnitOfWork, UnitOfWorkProvider};
