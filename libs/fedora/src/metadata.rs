//! Filesystem-style metadata projected from repository response headers.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LINK};
use serde::{Deserialize, Serialize};

use crate::{link, RepositoryError};

/// Content type reported for files whose response omits one.
pub const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// Access level of a resource. The repository exposes everything as public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// File or directory, with the fields only files carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceKind {
    /// An LDP NonRDFSource.
    File { size: u64, mimetype: String },
    /// Any other LDP resource, usually a container.
    Dir,
}

/// Metadata for one repository path, fetched fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Repository-relative path, as the caller addressed it.
    pub path: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub visibility: Visibility,
    #[serde(flatten)]
    pub kind: ResourceKind,
}

impl Metadata {
    /// Builds metadata from the headers of a 200 HEAD or GET response.
    pub fn from_headers(path: &str, headers: &HeaderMap) -> Result<Self, RepositoryError> {
        let timestamp = last_modified(path, headers)?;

        let links = headers.get_all(LINK).iter().filter_map(|v| v.to_str().ok());
        let kind = if link::is_non_rdf_source(links) {
            let size = match header_str(headers, CONTENT_LENGTH) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                    RepositoryError::unavailable(path, format!("invalid Content-Length: {raw}"))
                })?,
                None => 0,
            };
            let mimetype = header_str(headers, CONTENT_TYPE)
                .unwrap_or(DEFAULT_MIMETYPE)
                .to_string();
            ResourceKind::File { size, mimetype }
        } else {
            ResourceKind::Dir
        };

        Ok(Self {
            path: path.to_string(),
            timestamp,
            visibility: Visibility::Public,
            kind,
        })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, ResourceKind::File { .. })
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, ResourceKind::Dir)
    }

    /// Byte size; `None` for directories.
    pub fn size(&self) -> Option<u64> {
        match &self.kind {
            ResourceKind::File { size, .. } => Some(*size),
            ResourceKind::Dir => None,
        }
    }

    /// Content type; `None` for directories.
    pub fn mimetype(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::File { mimetype, .. } => Some(mimetype),
            ResourceKind::Dir => None,
        }
    }
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn last_modified(path: &str, headers: &HeaderMap) -> Result<DateTime<Utc>, RepositoryError> {
    let raw = header_str(headers, LAST_MODIFIED)
        .ok_or_else(|| RepositoryError::unavailable(path, "missing Last-Modified header"))?;
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::unavailable(path, format!("invalid Last-Modified {raw:?}: {e}")))
}
