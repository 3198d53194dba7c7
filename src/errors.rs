// Copyright 2025 Cowboy AI, LLC.

//! Error types for livestock movement operations
//!
//! Every workflow returns [`DomainResult`]. The variants line up with the
//! surfaced error kinds ([`ErrorKind`]) so a transport layer can map them
//! onto status codes without inspecting messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// ID that was searched for
        id: String,
    },

    /// Unique constraint violated
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic version check failed
    #[error("Concurrency conflict on {entity_type} {id}: expected version {expected}, but found {actual}")]
    ConcurrencyConflict {
        /// Type of the contended entity
        entity_type: String,
        /// ID of the contended entity
        id: String,
        /// Expected version
        expected: u64,
        /// Actual version
        actual: u64,
    },

    /// Operation attempted from a state that does not permit it
    #[error("Invalid state transition: cannot {operation} {entity_type} in state {from}")]
    InvalidStateTransition {
        /// Type of the entity
        entity_type: String,
        /// Current state
        from: String,
        /// Attempted operation
        operation: String,
    },

    /// Business rule violation
    #[error("Business rule violation: {rule}")]
    BusinessRuleViolation {
        /// Description of the violated rule
        rule: String,
    },

    /// Validation error for a single input field
    #[error("Validation error on {field}: {message}")]
    ValidationError {
        /// Offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Authorization error
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Storage error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// External service error
    #[error("External service error: {service} - {message}")]
    ExternalServiceError {
        /// Name of the external service
        service: String,
        /// Error message from the service
        message: String,
    },
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Surfaced error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Referenced entity does not exist
    NotFound,
    /// Unique constraint or concurrent write conflict
    Conflict,
    /// Operation not allowed from the current state
    InvalidTransition,
    /// Cross-entity rule failed
    BusinessRuleViolation,
    /// Missing or malformed input
    Validation,
    /// Acting officer may not perform the operation
    Forbidden,
    /// Infrastructure failure
    Internal,
    /// Collaborator failure
    ExternalService,
}

impl ErrorKind {
    /// HTTP-equivalent status code
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidTransition
            | ErrorKind::BusinessRuleViolation
            | ErrorKind::Validation => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::Internal => 500,
            ErrorKind::ExternalService => 502,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl DomainError {
    /// Shorthand for [`DomainError::EntityNotFound`]
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        DomainError::EntityNotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Shorthand for [`DomainError::BusinessRuleViolation`]
    pub fn rule(rule: impl Into<String>) -> Self {
        DomainError::BusinessRuleViolation { rule: rule.into() }
    }

    /// Shorthand for [`DomainError::ValidationError`]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The surfaced category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EntityNotFound { .. } => ErrorKind::NotFound,
            DomainError::AlreadyExists(_) | DomainError::ConcurrencyConflict { .. } => {
                ErrorKind::Conflict
            }
            DomainError::InvalidStateTransition { .. } => ErrorKind::InvalidTransition,
            DomainError::BusinessRuleViolation { .. } => ErrorKind::BusinessRuleViolation,
            DomainError::ValidationError { .. } => ErrorKind::Validation,
            DomainError::AuthorizationError(_) => ErrorKind::Forbidden,
            DomainError::StorageError(_) | DomainError::SerializationError(_) => {
                ErrorKind::Internal
            }
            DomainError::ExternalServiceError { .. } => ErrorKind::ExternalService,
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::EntityNotFound { .. })
    }

    /// Check if this is a duplicate or concurrent-write conflict
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Check if this is a concurrency error
    pub fn is_concurrency_error(&self) -> bool {
        matches!(self, DomainError::ConcurrencyConflict { .. })
    }

    /// Check if this is a rejected state transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DomainError::InvalidStateTransition { .. })
    }

    /// Check if this is a business rule violation
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, DomainError::BusinessRuleViolation { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, DomainError::ValidationError { .. })
    }

    /// The offending field, for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            DomainError::ValidationError { field, .. } => Some(field),
            _ => None,
        }
    }
}
