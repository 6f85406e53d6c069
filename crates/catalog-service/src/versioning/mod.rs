//! Version chain management.

pub mod manager;

pub use manager::VersioningManager;
