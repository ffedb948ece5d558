//! Domain-level error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A validation failure attached to a single input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<FieldError>),

    #[error("Duplicate entity: {message}")]
    Duplicate {
        message: String,
        errors: Vec<FieldError>,
    },

    /// Caller is anonymous or does not own the target.
    #[error("Unauthorized access")]
    Unauthorized,

    /// Store conflict or outage. Safe to retry.
    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn post_not_found(id: Uuid) -> Self {
        DomainError::NotFound {
            entity_type: "post",
            id,
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Transient(_))
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Lost a race with a concurrent transaction.
    #[error("Transaction conflict: {0}")]
    Conflict(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Connection(msg) | RepoError::Conflict(msg) => DomainError::Transient(msg),
            RepoError::Query(msg) => DomainError::Internal(msg),
            RepoError::NotFound => DomainError::Internal("row vanished mid-operation".to_string()),
            RepoError::Constraint(msg) => DomainError::Duplicate {
                message: msg,
                errors: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_and_outages_are_transient() {
        assert!(DomainError::from(RepoError::Conflict("40001".into())).is_transient());
        assert!(DomainError::from(RepoError::Connection("refused".into())).is_transient());
        assert!(!DomainError::from(RepoError::Query("syntax".into())).is_transient());
    }

    #[test]
    fn test_validation_display_lists_fields() {
        let err = DomainError::Validation(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("text", "Text is required"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: title: Title is required, text: Text is required"
        );
    }
}
