//! Application layer error types

use crate::domain::{DomainError, SourceType};
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("All {} sources failed: {}", failures.len(), failures.join("; "))]
    AllSourcesFailed { failures: Vec<String> },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },
}

impl ApplicationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ApplicationError::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApplicationError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure talking to one external catalog
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{source_type} returned HTTP {status}: {message}")]
    Http {
        source_type: SourceType,
        status: u16,
        message: String,
    },

    #[error("Rate limit exceeded for {source_type}{}", retry_hint(.retry_after_secs))]
    RateLimited {
        source_type: SourceType,
        retry_after_secs: Option<u64>,
    },

    #[error("{source_type} request timed out after {seconds}s")]
    Timeout { source_type: SourceType, seconds: u64 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode {source_type} response: {message}")]
    Decode {
        source_type: SourceType,
        message: String,
    },
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    }
}
