//! Convenience result type alias for the service catalog.

use crate::error::AppError;

/// A specialized `Result` type for catalog operations.
///
/// Every crate returns this instead of spelling out `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
