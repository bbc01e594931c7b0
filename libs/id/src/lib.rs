//! # isle-id
//!
//! Durable identifiers and unique token generation for isle.
//!
//! ## Design Principles
//!
//! - Entities are identified by their durable UUID, never by a mutable
//!   numeric key
//! - The UUID is opaque: the CMS owns its format, we only require it to be a
//!   non-empty token without whitespace
//! - Identifiers render as URNs (`urn:uuid:{uuid}`) on the wire
//! - Fresh tokens (receipts, correlation ids) come from an injected
//!   [`IdGenerator`] rather than a global
//!
//! ## Examples
//!
//! - `urn:uuid:6f1a3b2c-04d5-4a7e-9b1f-2c3d4e5f6a7b`
//! - `urn:uuid:abc-123`

mod error;
mod generator;
mod macros;
mod types;

pub use error::IdError;
pub use generator::{IdGenerator, SequenceGenerator, UuidGenerator};
pub use types::*;

/// Re-export uuid for consumers that need raw UUID operations
pub use uuid::Uuid;
