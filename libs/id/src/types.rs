//! Typed identifier definitions.
//!
//! Every identifier wraps the durable UUID the CMS assigns at creation time.
//! On the wire they are rendered in the `urn:uuid:` namespace.

use crate::define_urn_id;

/// Leading scheme of every rendered identifier.
pub const URN_PREFIX: &str = "urn:";

/// The only URN namespace identifiers are rendered in.
pub const URN_NAMESPACE: &str = "uuid";

// =============================================================================
// Content
// =============================================================================

define_urn_id!(EntityUuid);

// =============================================================================
// People
// =============================================================================

define_urn_id!(UserUuid);

// =============================================================================
// Tests
// =============================================================================
