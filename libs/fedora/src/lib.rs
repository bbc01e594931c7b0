//! # isle-fedora
//!
//! Filesystem-style access to a Fedora (LDP) repository.
//!
//! ## Model
//!
//! - A resource advertising `Link: <http://www.w3.org/ns/ldp#NonRDFSource>;
//!   rel="type"` is a **file**; anything else is a **dir**
//! - Files carry size and mimetype; dirs never do
//! - A dir's children are the objects of its `ldp:contains` relation, read
//!   from the JSON-LD representation
//! - Metadata is fetched fresh on every call; nothing is cached
//!
//! ## Failure semantics
//!
//! Errors surface as [`RepositoryError`]. Only two cases turn a status into
//! a success value: [`FedoraAdapter::has`] answers `false` for non-200, and
//! [`FedoraAdapter::delete`] treats 404 as already deleted.

mod adapter;
mod client;
mod error;
mod issue;
pub mod link;
mod metadata;

pub use adapter::{ByteStream, Contents, FedoraAdapter, ResourceStream, JSON_LD, LDP_CONTAINS};
pub use client::{FedoraClient, DEFAULT_TIMEOUT};
pub use error::{RenameError, RepositoryError};
pub use issue::{Issue, Severity};
pub use metadata::{Metadata, ResourceKind, Visibility, DEFAULT_MIMETYPE};
