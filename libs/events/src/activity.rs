//! Activity Streams document types - the wire shape of every event.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::EventError;

/// JSON-LD context shared by every event.
pub const ACTIVITYSTREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// Media type of the attachment content.
pub const ATTACHMENT_MEDIA_TYPE: &str = "application/json";

/// Activity type, serialized verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    Create,
    Update,
    Delete,
    /// Generic activity; always paired with a `summary`.
    Activity,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityType::Create => "Create",
            ActivityType::Update => "Update",
            ActivityType::Delete => "Delete",
            ActivityType::Activity => "Activity",
        };
        write!(f, "{}", s)
    }
}

/// Relation of a link to the thing it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRel {
    Canonical,
    Alternate,
}

/// A typed link to one representation of an actor or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,

    #[serde(rename = "type")]
    pub link_type: String,

    pub href: String,

    #[serde(rename = "mediaType")]
    pub media_type: String,

    pub rel: LinkRel,
}

impl Link {
    pub fn new(
        name: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
        rel: LinkRel,
    ) -> Self {
        Self {
            name: name.into(),
            link_type: "Link".to_string(),
            href: href.into(),
            media_type: media_type.into(),
            rel,
        }
    }
}

/// The party performing the activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "type")]
    pub actor_type: String,

    /// `urn:uuid:{uuid}` of the acting user.
    pub id: String,

    pub url: Vec<Link>,
}

/// Auxiliary structured data carried alongside the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub attachment_type: String,

    /// Sorted so the serialized form is stable.
    pub content: BTreeMap<String, String>,

    #[serde(rename = "mediaType")]
    pub media_type: String,
}

impl Attachment {
    pub fn json(content: BTreeMap<String, String>) -> Self {
        Self {
            attachment_type: "Object".to_string(),
            content,
            media_type: ATTACHMENT_MEDIA_TYPE.to_string(),
        }
    }
}

/// The entity the activity was performed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// `urn:uuid:{uuid}` of the entity.
    pub id: String,

    pub url: Vec<Link>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

/// A complete Activity Streams event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "@context")]
    pub context: String,

    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Human-readable description, present only for generic activities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub actor: Actor,

    pub object: Object,
}

impl Activity {
    /// Creates a new activity builder.
    pub fn builder() -> ActivityBuilder {
        ActivityBuilder::new()
    }

    /// Serializes the activity to its canonical JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EventError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Builder for constructing activities.
#[derive(Debug, Default)]
pub struct ActivityBuilder {
    activity_type: Option<ActivityType>,
    summary: Option<String>,
    actor: Option<Actor>,
    object: Option<Object>,
    attachment: Option<Attachment>,
}

impl ActivityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity_type(mut self, activity_type: ActivityType) -> Self {
        self.activity_type = Some(activity_type);
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn actor(mut self, id: impl Into<String>, url: Vec<Link>) -> Self {
        self.actor = Some(Actor {
            actor_type: "Person".to_string(),
            id: id.into(),
            url,
        });
        self
    }

    pub fn object(mut self, id: impl Into<String>, url: Vec<Link>) -> Self {
        self.object = Some(Object {
            id: id.into(),
            url,
            attachment: None,
        });
        self
    }

    /// Attaches auxiliary data to the object. Empty content attaches nothing.
    pub fn attachment(mut self, content: BTreeMap<String, String>) -> Self {
        self.attachment = (!content.is_empty()).then(|| Attachment::json(content));
        self
    }

    /// Builds the activity.
    pub fn build(self) -> Result<Activity, EventError> {
        let mut object = self.object.ok_or(EventError::Incomplete("object"))?;
        object.attachment = self.attachment;

        Ok(Activity {
            context: ACTIVITYSTREAMS_CONTEXT.to_string(),
            activity_type: self
                .activity_type
                .ok_or(EventError::Incomplete("activity type"))?,
            summary: self.summary,
            actor: self.actor.ok_or(EventError::Incomplete("actor"))?,
            object,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_rel_serialization() {
        assert_eq!(
            serde_json::to_string(&LinkRel::Canonical).unwrap(),
            "\"canonical\""
        );
        assert_eq!(
            serde_json::to_string(&LinkRel::Alternate).unwrap(),
            "\"alternate\""
        );
    }

    #[test]
    fn test_activity_type_display() {
        assert_eq!(ActivityType::Create.to_string(), "Create");
        assert_eq!(ActivityType::Activity.to_string(), "Activity");
    }

    #[test]
    fn test_builder_requires_actor() {
        let err = Activity::builder()
            .activity_type(ActivityType::Create)
            .object("urn:uuid:abc", vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, EventError::Incomplete("actor"));
    }

    #[test]
    fn test_field_order() {
        let activity = Activity::builder()
            .activity_type(ActivityType::Activity)
            .summary("Generate Derivative")
            .actor("urn:uuid:user-1", vec![])
            .object("urn:uuid:abc-123", vec![])
            .build()
            .unwrap();

        let json = String::from_utf8(activity.to_bytes().unwrap()).unwrap();
        assert!(json.starts_with(
            "{\"@context\":\"https://www.w3.org/ns/activitystreams\",\"type\":\"Activity\",\"summary\":"
        ));
    }

    #[test]
    fn test_empty_attachment_is_omitted() {
        let activity = Activity::builder()
            .activity_type(ActivityType::Update)
            .actor("urn:uuid:user-1", vec![])
            .object("urn:uuid:abc-123", vec![])
            .attachment(BTreeMap::new())
            .build()
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&activity.to_bytes().unwrap()).unwrap();
        assert!(value["object"].get("attachment").is_none());
        assert!(value.get("summary").is_none());
    }
}
