pub mod auth;
pub mod health;
pub mod ranking;

use crate::error::AppError;

/// Fallback for unknown paths.
pub async fn not_found() -> AppError {
    AppError::PathNotFound
}
