//! Convenience result type alias for Homni.

use crate::error::AppError;

/// A specialized `Result` type for Homni operations.
pub type AppResult<T> = Result<T, AppError>;
