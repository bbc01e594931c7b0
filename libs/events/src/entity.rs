//! References to the entities and users an event describes.
//!
//! These are snapshots taken by the caller: a UUID and an absolute URL per
//! entity, plus whatever the entity kind needs to describe its binary. A
//! missing UUID or URL means the entity was never saved.

use isle_id::{EntityUuid, UserUuid};

use crate::EventError;

/// The binary a media entity displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    /// Absolute URL of the source file.
    pub url: String,
    /// MIME type of the source file.
    pub mime_type: String,
}

/// The closed set of entity shapes an event can describe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntityKind {
    /// Any content entity (nodes, terms, ...).
    #[default]
    Generic,

    /// A managed file. Its canonical URL is the binary itself.
    File {
        mime_type: String,
        /// REST endpoint for the file entity, without a `_format` query.
        rest_url: Option<String>,
        /// Endpoint reporting the file's checksum, without a `_format` query.
        checksum_url: Option<String>,
    },

    /// A media entity, optionally wrapping a source binary.
    Media { source: Option<MediaSource> },
}

impl EntityKind {
    /// Returns true if the entity has a binary that can be linked directly.
    pub fn has_displayable_binary(&self) -> bool {
        match self {
            EntityKind::Generic => false,
            EntityKind::File { .. } => true,
            EntityKind::Media { source } => source.is_some(),
        }
    }
}

/// A snapshot of the entity an action was performed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub uuid: Option<EntityUuid>,
    /// Absolute canonical URL.
    pub url: Option<String>,
    pub kind: EntityKind,
}

impl EntityRef {
    pub fn generic(uuid: EntityUuid, url: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid),
            url: Some(url.into()),
            kind: EntityKind::Generic,
        }
    }

    pub fn file(uuid: EntityUuid, url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid),
            url: Some(url.into()),
            kind: EntityKind::File {
                mime_type: mime_type.into(),
                rest_url: None,
                checksum_url: None,
            },
        }
    }

    pub fn media(uuid: EntityUuid, url: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid),
            url: Some(url.into()),
            kind: EntityKind::Media { source: None },
        }
    }

    /// An entity that has not been saved yet.
    pub fn unsaved(kind: EntityKind) -> Self {
        Self {
            uuid: None,
            url: None,
            kind,
        }
    }

    /// Sets the REST endpoint of a file entity. Ignored for other kinds.
    pub fn with_rest_url(mut self, rest_url: impl Into<String>) -> Self {
        if let EntityKind::File { rest_url: slot, .. } = &mut self.kind {
            *slot = Some(rest_url.into());
        }
        self
    }

    /// Sets the checksum endpoint of a file entity. Ignored for other kinds.
    pub fn with_checksum_url(mut self, checksum_url: impl Into<String>) -> Self {
        if let EntityKind::File {
            checksum_url: slot, ..
        } = &mut self.kind
        {
            *slot = Some(checksum_url.into());
        }
        self
    }

    /// Sets the source binary of a media entity. Ignored for other kinds.
    pub fn with_source(mut self, url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        if let EntityKind::Media { source } = &mut self.kind {
            *source = Some(MediaSource {
                url: url.into(),
                mime_type: mime_type.into(),
            });
        }
        self
    }

    pub(crate) fn resolve(&self) -> Result<(&EntityUuid, &str), EventError> {
        let uuid = self.uuid.as_ref().ok_or(EventError::UnresolvedReference {
            subject: "entity",
            missing: "uuid",
        })?;
        let url = resolved_url(self.url.as_deref()).ok_or(EventError::UnresolvedReference {
            subject: "entity",
            missing: "url",
        })?;
        Ok((uuid, url))
    }
}

/// A snapshot of the user performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRef {
    pub uuid: Option<UserUuid>,
    /// Absolute URL of the user's page.
    pub url: Option<String>,
}

impl ActorRef {
    pub fn new(uuid: UserUuid, url: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid),
            url: Some(url.into()),
        }
    }

    pub(crate) fn resolve(&self) -> Result<(&UserUuid, &str), EventError> {
        let uuid = self.uuid.as_ref().ok_or(EventError::UnresolvedReference {
            subject: "actor",
            missing: "uuid",
        })?;
        let url = resolved_url(self.url.as_deref()).ok_or(EventError::UnresolvedReference {
            subject: "actor",
            missing: "url",
        })?;
        Ok((uuid, url))
    }
}

fn resolved_url(url: Option<&str>) -> Option<&str> {
    url.map(str::trim).filter(|u| !u.is_empty())
}
