//! Error types for identifier parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier string is empty.
    #[error("identifier cannot be empty")]
    Empty,

    /// The identifier carries a URN namespace other than `uuid`.
    #[error("unsupported URN namespace: expected '{expected}', got '{actual}'")]
    InvalidNamespace {
        expected: &'static str,
        actual: String,
    },

    /// The identifier contains characters that cannot appear in a URN.
    #[error("invalid identifier format: {message}")]
    InvalidFormat { message: String },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if this error indicates a namespace mismatch.
    pub fn is_namespace_error(&self) -> bool {
        matches!(self, IdError::InvalidNamespace { .. })
    }
}
