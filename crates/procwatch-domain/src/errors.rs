//! Domain errors for procwatch

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound { entity_type: String, id: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("Concurrency conflict: {resource}")]
    ConcurrencyConflict { resource: String },

    #[error("Storage failure: {reason}")]
    Storage { reason: String },
}

impl DomainError {
    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::EntityNotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Whether a retry of the same read-modify-write may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
