//! Recording of scheduled publication and archival instants.

pub mod manager;

pub use manager::SchedulingManager;
