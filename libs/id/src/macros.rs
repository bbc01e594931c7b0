//! Macros for defining typed URN identifiers.

/// Macro to define a typed identifier rendered in the `urn:uuid:` namespace.
///
/// This generates a newtype wrapper around the durable UUID string with:
/// - `parse()` accepting either the bare UUID or its URN form
/// - `urn()` rendering `urn:uuid:{uuid}`
/// - `Display` (bare UUID) and `FromStr` implementations
/// - `Serialize` and `Deserialize` implementations (bare UUID)
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_urn_id!(EntityUuid);
///
/// let id: EntityUuid = "urn:uuid:abc-123".parse()?;
/// assert_eq!(id.as_str(), "abc-123");
/// assert_eq!(id.urn(), "urn:uuid:abc-123");
/// ```
#[macro_export]
macro_rules! define_urn_id {
    ($name:ident) => {
        /// A durable identifier for this kind of entity.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Parses an identifier from either `{uuid}` or `urn:uuid:{uuid}`.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                let s = s.trim();
                if s.is_empty() {
                    return Err($crate::IdError::Empty);
                }

                let value = match s.strip_prefix($crate::URN_PREFIX) {
                    Some(rest) => {
                        let Some((namespace, value)) = rest.split_once(':') else {
                            return Err($crate::IdError::InvalidFormat {
                                message: format!("URN without namespace: {s}"),
                            });
                        };
                        if namespace != $crate::URN_NAMESPACE {
                            return Err($crate::IdError::InvalidNamespace {
                                expected: $crate::URN_NAMESPACE,
                                actual: namespace.to_string(),
                            });
                        }
                        value
                    }
                    None => s,
                };

                if value.is_empty() {
                    return Err($crate::IdError::Empty);
                }
                if let Some(c) = value.chars().find(|c| c.is_whitespace() || c.is_control()) {
                    return Err($crate::IdError::InvalidFormat {
                        message: format!("unexpected character {c:?} in {value:?}"),
                    });
                }

                Ok(Self(value.to_string()))
            }

            /// Returns the bare UUID.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Renders the identifier as `urn:uuid:{uuid}`.
            #[must_use]
            pub fn urn(&self) -> String {
                format!(
                    "{}{}:{}",
                    $crate::URN_PREFIX,
                    $crate::URN_NAMESPACE,
                    self.0
                )
            }
        }

        impl From<$crate::Uuid> for $name {
            fn from(uuid: $crate::Uuid) -> Self {
                Self(uuid.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}
