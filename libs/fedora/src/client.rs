//! Thin HTTP client for a Fedora repository.
//!
//! Provides the four raw calls the adapter is built on:
//! - HEAD for resource headers
//! - GET for resource bodies (optionally as JSON-LD)
//! - PUT to create or replace a resource
//! - DELETE

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Body, Response};
use tracing::debug;

use crate::RepositoryError;

/// Default bound on a single repository request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one repository base URI.
#[derive(Debug, Clone)]
pub struct FedoraClient {
    client: reqwest::Client,
    base_uri: String,
}

impl FedoraClient {
    /// Creates a client for `base_uri`. When `token` is given every request
    /// carries `Authorization: Bearer <token>`.
    pub fn new(
        base_uri: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let base_uri = base_uri.trim();
        if !(base_uri.starts_with("http://") || base_uri.starts_with("https://")) {
            return Err(RepositoryError::InvalidConfig(format!(
                "base URI must be http(s): {base_uri:?}"
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| RepositoryError::InvalidConfig("invalid token format".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_uri: format!("{}/", base_uri.trim_end_matches('/')),
        })
    }

    /// Repository root, always ending in `/`.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Absolute URI for a repository-relative path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path.trim_start_matches('/'))
    }

    /// Repository-relative path for an absolute URI under the base, if it is
    /// under the base.
    pub fn relative_path<'a>(&self, uri: &'a str) -> Option<&'a str> {
        uri.strip_prefix(&self.base_uri)
            .or_else(|| (uri == self.base_uri.trim_end_matches('/')).then_some(""))
    }

    /// HEAD the resource.
    pub async fn get_resource_headers(&self, path: &str) -> reqwest::Result<Response> {
        let url = self.url(path);
        debug!(url = %url, "Fetching resource headers");
        self.client.head(&url).send().await
    }

    /// GET the resource, optionally negotiating the representation.
    pub async fn get_resource(&self, path: &str, accept: Option<&str>) -> reqwest::Result<Response> {
        let url = self.url(path);
        debug!(url = %url, accept, "Fetching resource");
        let mut request = self.client.get(&url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        request.send().await
    }

    /// PUT the resource. With no body this creates an empty container.
    pub async fn save_resource(
        &self,
        path: &str,
        body: Option<Body>,
        content_type: Option<&str>,
    ) -> reqwest::Result<Response> {
        let url = self.url(path);
        debug!(url = %url, content_type, has_body = body.is_some(), "Saving resource");
        let mut request = self.client.put(&url);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = body {
            request = request.body(body);
        }
        request.send().await
    }

    /// DELETE the resource.
    pub async fn delete_resource(&self, path: &str) -> reqwest::Result<Response> {
        let url = self.url(path);
        debug!(url = %url, "Deleting resource");
        self.client.delete(&url).send().await
    }
}
