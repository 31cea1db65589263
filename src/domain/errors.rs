//! Domain-specific error types

use thiserror::Error;

/// Domain-level errors for tool discovery
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid input for field {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Malformed {source_type} record: {message}")]
    MalformedRecord {
        source_type: String,
        message: String,
    },
}
