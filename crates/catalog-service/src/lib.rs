//! # catalog-service
//!
//! The entity versioning and publication lifecycle engine. The
//! [`EntityLifecycleManager`] wraps caller-supplied load and save closures
//! in one consistent protocol: a unit of work per operation, locking for
//! publishes of existing content, validation gating, and result decoration.
//! Entity-specific services such as [`ContentService`] supply the closures.
//!
//! Services follow constructor injection: every collaborator is handed in
//! at construction time as an `Arc`.

pub mod content;
pub mod error;
pub mod lifecycle;
pub mod scheduling;
pub mod validation;
pub mod versioning;

pub use content::ContentService;
pub use error::LifecycleError;
pub use lifecycle::{EntityLifecycleManager, LockAction, validated_header};
pub use scheduling::SchedulingManager;
pub use validation::{ContentRules, ContentValidationManager, ValidationChecker};
pub use versioning::VersioningManager;
