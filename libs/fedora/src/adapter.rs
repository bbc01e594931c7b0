//! Filesystem operations over LDP resources.
//!
//! NonRDFSources are files; every other resource is a directory whose
//! children are the objects of its `ldp:contains` triples.

use std::collections::HashSet;

use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::{Body, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{FedoraClient, Issue, Metadata, RenameError, RepositoryError, Visibility};

/// JSON-LD media type requested when walking containers.
pub const JSON_LD: &str = "application/ld+json";

/// Predicate linking a container to its children.
pub const LDP_CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";

/// Body chunks of a file resource.
pub type ByteStream = BoxStream<'static, Result<Bytes, RepositoryError>>;

/// Metadata plus the full body. Directories have empty contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contents {
    pub metadata: Metadata,
    pub contents: Bytes,
}

/// Metadata plus a body stream; `stream` is `None` for directories.
pub struct ResourceStream {
    pub metadata: Metadata,
    pub stream: Option<ByteStream>,
}

impl std::fmt::Debug for ResourceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStream")
            .field("metadata", &self.metadata)
            .field("stream", &self.stream.is_some())
            .finish()
    }
}

/// Filesystem-style view of a Fedora repository.
///
/// Stateless: every call is a fresh HTTP exchange.
#[derive(Debug, Clone)]
pub struct FedoraAdapter {
    client: FedoraClient,
}

impl FedoraAdapter {
    pub fn new(client: FedoraClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &FedoraClient {
        &self.client
    }

    /// Whether the resource exists. Any status other than 200 is `false`.
    pub async fn has(&self, path: &str) -> Result<bool, RepositoryError> {
        let response = self
            .client
            .get_resource_headers(path)
            .await
            .map_err(|e| transport_error(path, e))?;
        Ok(response.status() == StatusCode::OK)
    }

    pub async fn get_metadata(&self, path: &str) -> Result<Metadata, RepositoryError> {
        let response = self
            .client
            .get_resource_headers(path)
            .await
            .map_err(|e| transport_error(path, e))?;
        let response = expect_ok(path, response)?;
        Metadata::from_headers(path, response.headers())
    }

    /// Size in bytes; `None` for directories.
    pub async fn get_size(&self, path: &str) -> Result<Option<u64>, RepositoryError> {
        Ok(self.get_metadata(path).await?.size())
    }

    /// Content type; `None` for directories.
    pub async fn get_mimetype(&self, path: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.get_metadata(path).await?.mimetype().map(str::to_string))
    }

    pub async fn get_timestamp(
        &self,
        path: &str,
    ) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
        Ok(self.get_metadata(path).await?.timestamp)
    }

    pub async fn get_visibility(&self, path: &str) -> Result<Visibility, RepositoryError> {
        Ok(self.get_metadata(path).await?.visibility)
    }

    /// Reads the resource. The body is only fetched for files.
    pub async fn read(&self, path: &str) -> Result<Contents, RepositoryError> {
        let response = self.fetch(path).await?;
        let metadata = Metadata::from_headers(path, response.headers())?;

        let contents = if metadata.is_file() {
            response
                .bytes()
                .await
                .map_err(|e| transport_error(path, e))?
        } else {
            Bytes::new()
        };

        debug!(path, bytes = contents.len(), "Read resource");
        Ok(Contents { metadata, contents })
    }

    /// Like [`read`](Self::read) but hands back the body as a stream.
    pub async fn read_stream(&self, path: &str) -> Result<ResourceStream, RepositoryError> {
        let response = self.fetch(path).await?;
        let metadata = Metadata::from_headers(path, response.headers())?;

        let stream = metadata.is_file().then(|| {
            let owned = path.to_string();
            response
                .bytes_stream()
                .map_err(move |e| RepositoryError::unavailable(&owned, e))
                .boxed()
        });

        Ok(ResourceStream { metadata, stream })
    }

    /// Stores `contents` at `path`.
    ///
    /// Without a `content_type` the type is guessed from the path.
    pub async fn write(
        &self,
        path: &str,
        contents: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<Metadata, RepositoryError> {
        let contents = contents.into();
        let bytes = contents.len();
        let metadata = self
            .put(path, Some(Body::from(contents)), Some(&resolve_mimetype(path, content_type)))
            .await?;
        info!(path, bytes, "Wrote resource");
        Ok(metadata)
    }

    /// Stores a streamed body at `path`.
    pub async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        content_type: Option<&str>,
    ) -> Result<Metadata, RepositoryError> {
        let metadata = self
            .put(
                path,
                Some(Body::wrap_stream(stream)),
                Some(&resolve_mimetype(path, content_type)),
            )
            .await?;
        info!(path, "Wrote streamed resource");
        Ok(metadata)
    }

    /// Same as [`write`](Self::write); PUT replaces in place.
    pub async fn update(
        &self,
        path: &str,
        contents: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<Metadata, RepositoryError> {
        self.write(path, contents, content_type).await
    }

    /// Creates an empty container.
    pub async fn create_dir(&self, path: &str) -> Result<Metadata, RepositoryError> {
        let metadata = self.put(path, None, None).await?;
        info!(path, "Created container");
        Ok(metadata)
    }

    /// Deletes the resource. A resource that is already gone counts as
    /// deleted.
    pub async fn delete(&self, path: &str) -> Result<(), RepositoryError> {
        let response = self
            .client
            .delete_resource(path)
            .await
            .map_err(|e| transport_error(path, e))?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                info!(path, "Deleted resource");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                debug!(path, "Resource already absent");
                Ok(())
            }
            status => {
                warn!(path, status = %status, "Delete rejected");
                Err(RepositoryError::WriteFailed {
                    path: path.to_string(),
                    status: status.as_u16(),
                })
            }
        }
    }

    pub async fn delete_dir(&self, path: &str) -> Result<(), RepositoryError> {
        self.delete(path).await
    }

    /// Copies `path` to `new_path`, streaming file bodies. Copying a
    /// directory creates an empty container; children are not copied.
    pub async fn copy(&self, path: &str, new_path: &str) -> Result<Metadata, RepositoryError> {
        let source = self.read_stream(path).await?;
        match source.stream {
            Some(stream) => {
                let mimetype = source.metadata.mimetype().map(str::to_string);
                self.write_stream(new_path, stream, mimetype.as_deref())
                    .await
            }
            None => self.create_dir(new_path).await,
        }
    }

    /// Copies then deletes the source. Not atomic: see [`RenameError`].
    pub async fn rename(&self, path: &str, new_path: &str) -> Result<Metadata, RenameError> {
        let metadata = self.copy(path, new_path).await.map_err(RenameError::Copy)?;
        self.delete(path).await.map_err(|e| {
            warn!(path, new_path, error = %e, "Rename left both paths populated");
            RenameError::DeleteSource(e)
        })?;
        Ok(metadata)
    }

    /// Lists the children of a directory, and with `recursive` all of its
    /// descendants. Listing a file yields nothing. Order is not meaningful.
    /// A resource reachable more than once, including the root itself, is
    /// listed at most once.
    pub async fn list_contents(
        &self,
        path: &str,
        recursive: bool,
    ) -> Result<Vec<Metadata>, RepositoryError> {
        let normalized = normalize(path);

        if self.get_metadata(normalized).await?.is_file() {
            return Ok(Vec::new());
        }

        let mut listing = Vec::new();
        let mut pending = vec![normalized.to_string()];
        // Containment is a graph, not a tree. Each resource is listed once.
        let mut seen = HashSet::from([normalized.to_string()]);

        while let Some(dir) = pending.pop() {
            for child in self.children(&dir).await? {
                if !seen.insert(normalize(&child).to_string()) {
                    warn!(container = %dir, child = %child, "Skipping resource already listed");
                    continue;
                }
                let metadata = self.get_metadata(&child).await?;
                if recursive && metadata.is_dir() {
                    pending.push(child);
                }
                listing.push(metadata);
            }
        }

        debug!(path = normalized, recursive, entries = listing.len(), "Listed contents");
        Ok(listing)
    }

    /// Visibility is fixed; returns the current metadata unchanged.
    pub async fn set_visibility(
        &self,
        path: &str,
        _visibility: Visibility,
    ) -> Result<Metadata, RepositoryError> {
        self.get_metadata(path).await
    }

    /// Checks the repository root answers 200.
    pub async fn ensure(&self) -> Vec<Issue> {
        let url = self.client.base_uri();
        match self.client.get_resource_headers("").await {
            Ok(response) if response.status() == StatusCode::OK => Vec::new(),
            Ok(response) => {
                let status = response.status().as_u16();
                warn!(url, status, "Repository root check failed");
                vec![Issue::error(format!("{url} returned {status}"))]
            }
            Err(e) => {
                warn!(url, error = %e, "Repository root unreachable");
                vec![Issue::error(format!("{url} unreachable: {e}"))]
            }
        }
    }

    async fn fetch(&self, path: &str) -> Result<Response, RepositoryError> {
        let response = self
            .client
            .get_resource(path, None)
            .await
            .map_err(|e| transport_error(path, e))?;
        expect_ok(path, response)
    }

    async fn put(
        &self,
        path: &str,
        body: Option<Body>,
        content_type: Option<&str>,
    ) -> Result<Metadata, RepositoryError> {
        let response = self
            .client
            .save_resource(path, body, content_type)
            .await
            .map_err(|e| transport_error(path, e))?;

        match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT => self.get_metadata(path).await,
            status => {
                warn!(path, status = %status, "Write rejected");
                Err(RepositoryError::WriteFailed {
                    path: path.to_string(),
                    status: status.as_u16(),
                })
            }
        }
    }

    /// Repository-relative paths of the resources `dir` contains.
    async fn children(&self, dir: &str) -> Result<Vec<String>, RepositoryError> {
        let response = self
            .client
            .get_resource(dir, Some(JSON_LD))
            .await
            .map_err(|e| transport_error(dir, e))?;
        let response = expect_ok(dir, response)?;

        let graph: Value = response
            .json()
            .await
            .map_err(|e| RepositoryError::unavailable(dir, format!("invalid JSON-LD: {e}")))?;

        let uri = self.client.url(dir);
        let mut children = Vec::new();
        for child_uri in contained_uris(&graph, &uri) {
            match self.client.relative_path(child_uri) {
                Some(child) if !child.is_empty() => children.push(child.to_string()),
                _ => warn!(container = %uri, child = child_uri, "Skipping child outside repository"),
            }
        }
        Ok(children)
    }
}

/// Trims whitespace, then slashes.
fn normalize(path: &str) -> &str {
    path.trim().trim_matches('/')
}

fn resolve_mimetype(path: &str, hint: Option<&str>) -> String {
    match hint {
        Some(hint) if !hint.trim().is_empty() => hint.to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

fn transport_error(path: &str, error: reqwest::Error) -> RepositoryError {
    warn!(path, error = %error, "Repository request failed");
    RepositoryError::unavailable(path, error)
}

/// Maps anything but 200 to an error: 5xx means the repository is
/// unavailable, everything else is not found.
fn expect_ok(path: &str, response: Response) -> Result<Response, RepositoryError> {
    let status = response.status();
    if status == StatusCode::OK {
        Ok(response)
    } else if status.is_server_error() {
        Err(RepositoryError::unavailable(path, format!("status {status}")))
    } else {
        Err(RepositoryError::NotFound {
            path: path.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Child URIs of the node whose `@id` is `uri` in a JSON-LD document.
///
/// Accepts an expanded array of nodes, an object with `@graph`, or a single
/// node. Trailing slashes are ignored when matching ids.
fn contained_uris<'a>(document: &'a Value, uri: &str) -> Vec<&'a str> {
    let nodes: Vec<&Value> = match document {
        Value::Array(nodes) => nodes.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(nodes)) => nodes.iter().collect(),
            _ => vec![document],
        },
        _ => Vec::new(),
    };

    let wanted = uri.trim_end_matches('/');
    let Some(node) = nodes.into_iter().find(|node| {
        node.get("@id")
            .and_then(Value::as_str)
            .is_some_and(|id| id.trim_end_matches('/') == wanted)
    }) else {
        return Vec::new();
    };

    let references = match node.get(LDP_CONTAINS) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) => vec![item],
        None => Vec::new(),
    };

    references
        .into_iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(id.as_str()),
            Value::Object(_) => item.get("@id").and_then(Value::as_str),
            _ => None,
        })
        .collect()
}
