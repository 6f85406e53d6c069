//! Content validation: the checker seam, the content rules, and the
//! manager that applies the rules to a stored version.

pub mod checker;
pub mod manager;
pub mod rules;

pub use checker::ValidationChecker;
pub use manager::ContentValidationManager;
pub use rules::ContentRules;
