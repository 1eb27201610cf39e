//! # AppError
//!
//! Centralized error handling for the Inkwell ecosystem.
//! Every port and service returns this type; adapters translate their own
//! failures into it at the boundary.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., Story, Volume, Chapter, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty comment, malformed reorder permutation)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing, expired or otherwise invalid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role does not allow the operation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate username or story slug)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A dependent write outside the datastore failed
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    /// Infrastructure failure (e.g., DB down, corrupted row)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        AppError::NotFound(entity.to_string(), id.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    /// Stable machine-readable name used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(..) => "not_found",
            AppError::ValidationError(_) => "validation_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::UpstreamFailure(_) => "upstream_failure",
            AppError::Internal(_) => "internal",
        }
    }
}

/// A specialized Result type for Inkwell logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = AppError::not_found("Story", "my-story");
        assert_eq!(err.to_string(), "Story not found with ID my-story");
        assert_eq!(err.code(), "not_found");
    }
}
