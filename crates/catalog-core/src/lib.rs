//! # catalog-core
//!
//! Core crate for the service catalog back office. Contains the collaborator
//! traits the lifecycle engine programs against (unit of work, locking,
//! caching), configuration schemas, typed identifiers, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other catalog crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
