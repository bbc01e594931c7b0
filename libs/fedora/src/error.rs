//! Repository error types.

use thiserror::Error;

/// Failures talking to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The resource does not exist (or answered with a non-200 status).
    #[error("{path} not found (status {status})")]
    NotFound { path: String, status: u16 },

    /// The repository could not be reached or answered with something
    /// unusable.
    #[error("repository unavailable for {path}: {reason}")]
    Unavailable { path: String, reason: String },

    /// A PUT or DELETE came back with a status other than success.
    #[error("write to {path} failed (status {status})")]
    WriteFailed { path: String, status: u16 },

    /// The client could not be built from the supplied settings.
    #[error("invalid repository client configuration: {0}")]
    InvalidConfig(String),
}

impl RepositoryError {
    pub(crate) fn unavailable(path: &str, reason: impl ToString) -> Self {
        Self::Unavailable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the repository was unreachable or misbehaving.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Path the failed operation addressed, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path, .. }
            | Self::Unavailable { path, .. }
            | Self::WriteFailed { path, .. } => Some(path),
            Self::InvalidConfig(_) => None,
        }
    }
}

/// Failure of a copy-then-delete rename.
///
/// Rename is not atomic. The variant says which phase failed and so which
/// paths now hold content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    /// Copying failed; only the source path holds content.
    #[error("rename failed while copying: {0}")]
    Copy(#[source] RepositoryError),

    /// The copy landed but the source could not be removed; both paths hold
    /// content.
    #[error("rename copied the resource but failed to delete the source: {0}")]
    DeleteSource(#[source] RepositoryError),
}

impl RenameError {
    /// True when both the old and new paths are populated.
    pub fn left_both(&self) -> bool {
        matches!(self, Self::DeleteSource(_))
    }

    pub fn cause(&self) -> &RepositoryError {
        match self {
            Self::Copy(cause) | Self::DeleteSource(cause) => cause,
        }
    }
}
