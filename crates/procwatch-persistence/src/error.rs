//! Persistence Layer Error Types
//!
//! Error mapping to domain types

use thiserror::Error;

/// Errors that can occur during persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Stored revision differs from the one the writer read
    #[error("Stale write on {entity_type} {id}: expected revision {expected}, found {actual}")]
    StaleRevision {
        entity_type: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Unique constraint violated
    #[error("Duplicate {entity_type}: {detail}")]
    Duplicate {
        entity_type: &'static str,
        detail: String,
    },
}

impl PersistenceError {
    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn stale(entity_type: &'static str, id: impl ToString, expected: u64, actual: u64) -> Self {
        Self::StaleRevision {
            entity_type,
            id: id.to_string(),
            expected,
            actual,
        }
    }
}

/// Convert persistence errors to domain errors
impl From<PersistenceError> for procwatch_domain::DomainError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity_type, id } => {
                procwatch_domain::DomainError::EntityNotFound {
                    entity_type: entity_type.to_string(),
                    id,
                }
            }
            stale @ PersistenceError::StaleRevision { .. } => {
                procwatch_domain::DomainError::ConcurrencyConflict {
                    resource: stale.to_string(),
                }
            }
            PersistenceError::Duplicate { detail, .. } => {
                procwatch_domain::DomainError::Conflict { reason: detail }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procwatch_domain::DomainError;

    #[test]
    fn test_not_found_error() {
        let err = PersistenceError::not_found("AutomatedProcess", "proc-123");
        assert!(err.to_string().contains("AutomatedProcess"));
        assert!(err.to_string().contains("proc-123"));
    }

    #[test]
    fn test_stale_revision_maps_to_concurrency_conflict() {
        let err: DomainError = PersistenceError::stale("Alert", "a-1", 2, 3).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err: DomainError = PersistenceError::Duplicate {
            entity_type: "ProcessMonitor",
            detail: "already monitored".into(),
        }
        .into();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }
}
