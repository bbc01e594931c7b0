//! # isle-events
//!
//! Activity Streams 2.0 event documents describing entity lifecycle changes.
//!
//! ## Design Principles
//!
//! - Events are immutable records built from pre-resolved strings; they hold
//!   no references to live entities
//! - Identity is the entity's durable UUID rendered as `urn:uuid:{uuid}`
//! - Serialization is deterministic: identical inputs produce identical bytes
//! - Unpersisted entities (no UUID or URL) are rejected, never guessed at
//!
//! ## Event Shape
//!
//! Every event carries:
//! - The ActivityStreams `@context`
//! - A `type` (`Create`, `Update`, `Delete`, or `Activity` with a `summary`)
//! - The `actor` (a `Person`) with links to its representations
//! - The `object` with links to its representations and an optional
//!   `attachment` carrying auxiliary data
//!
//! ## Entity Kinds
//!
//! - Generic entities link to their HTML page plus JSON-LD and JSON alternates
//! - Files link canonically to the binary itself, typed with its MIME type
//! - Media link like generic entities, plus their source binary when present

mod activity;
mod entity;
mod error;
mod generator;

pub use activity::*;
pub use entity::*;
pub use error::EventError;
pub use generator::*;
