//! # AppError
//!
//! Centralized error handling for the Mini-Catalog ecosystem.
//! Ports, plugins and services all speak this one type.

use thiserror::Error;

/// The primary error type for all mc-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Resource not found (e.g., User, Listing, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., rating out of range, empty name)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No authenticated identity on the request
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Ownership check failed (e.g., editing someone else's listing)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness violation (e.g., liking the same listing twice)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }
}

/// A specialized Result type for Mini-Catalog logic.
pub type Result<T> = std::result::Result<T, AppError>;
