//! Convenience result type alias for stl2step.

use crate::error::AppError;

/// A specialized `Result` type for stl2step operations.
pub type AppResult<T> = Result<T, AppError>;
