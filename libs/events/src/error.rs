//! Error types for event generation.

use thiserror::Error;

/// Errors that can occur when generating events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The entity or actor has not been persisted and cannot be addressed.
    #[error("unresolved {subject} reference: missing {missing}")]
    UnresolvedReference {
        subject: &'static str,
        missing: &'static str,
    },

    /// The action label is not one we know how to serialize.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A required part of the activity was never set.
    #[error("incomplete activity: {0} is required")]
    Incomplete(&'static str),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EventError {
    /// Returns true if the event could not be built because an input was
    /// not yet persisted.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, EventError::UnresolvedReference { .. })
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}
