//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use std::fmt;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
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

#[derive(Debug)]
pub enum DomainError {
    /// Input failed schema validation; carries field-level details
    Validation(Vec<FieldError>),
    /// Entity absent, soft-deleted, or owned by another user
    NotFound,
    /// Persistence failure, wrapped with the operation that hit it
    Database { operation: String, message: String },
    /// Builder misconfiguration; fatal at startup
    Construction(String),
}

impl DomainError {
    pub fn database(operation: impl Into<String>, err: impl fmt::Display) -> Self {
        DomainError::Database {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn construction(message: impl Into<String>) -> Self {
        DomainError::Construction(message.into())
    }

    /// Shorthand for a validation failure on a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![FieldError::new(field, message)])
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::Validation(fields) => {
                write!(f, "Validation error")?;
                for fe in fields {
                    write!(f, "; {}: {}", fe.field, fe.message)?;
                }
                Ok(())
            }
            DomainError::NotFound => write!(f, "Resource not found"),
            DomainError::Database { operation, message } => {
                write!(f, "Database error during {}: {}", operation, message)
            }
            DomainError::Construction(msg) => write!(f, "Construction error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
