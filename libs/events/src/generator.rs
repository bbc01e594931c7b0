//! Event generation: entity + actor + action -> serialized activity.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{Activity, ActivityType, ActorRef, EntityKind, EntityRef, EventError, Link, LinkRel};

/// Auxiliary data keys consumed by dispatch and never serialized.
pub const CONTROL_KEYS: [&str; 2] = ["event", "queue"];

/// Summary of the synthetic derivative action.
pub const GENERATE_DERIVATIVE_SUMMARY: &str = "Generate Derivative";

/// The lifecycle action an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
    /// Request to derive a new binary from an existing one.
    GenerateDerivative,
}

impl Action {
    /// Returns the serialized activity type.
    pub fn activity_type(&self) -> ActivityType {
        match self {
            Action::Create => ActivityType::Create,
            Action::Update => ActivityType::Update,
            Action::Delete => ActivityType::Delete,
            Action::GenerateDerivative => ActivityType::Activity,
        }
    }

    /// Returns the human-readable summary, if the activity type needs one.
    pub fn summary(&self) -> Option<&'static str> {
        match self {
            Action::GenerateDerivative => Some(GENERATE_DERIVATIVE_SUMMARY),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Create => "Create",
            Action::Update => "Update",
            Action::Delete => "Delete",
            Action::GenerateDerivative => GENERATE_DERIVATIVE_SUMMARY,
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Action {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "generate derivative" | "derivative" => Ok(Action::GenerateDerivative),
            _ => Err(EventError::UnknownAction(s.to_string())),
        }
    }
}

/// Builds Activity Streams events for entity lifecycle changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventGenerator;

impl EventGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates a serialized event.
    ///
    /// `data` is auxiliary information to attach; the dispatch control keys
    /// (`event`, `queue`) are dropped before attaching.
    pub fn generate_event(
        &self,
        entity: &EntityRef,
        actor: &ActorRef,
        action: Action,
        data: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, EventError> {
        let activity = self.build_activity(entity, actor, action, data)?;
        let bytes = activity.to_bytes()?;
        debug!(
            object_id = %activity.object.id,
            actor_id = %activity.actor.id,
            activity_type = %activity.activity_type,
            bytes = bytes.len(),
            "Generated event"
        );
        Ok(bytes)
    }

    pub fn generate_create_event(
        &self,
        entity: &EntityRef,
        actor: &ActorRef,
    ) -> Result<Vec<u8>, EventError> {
        self.generate_event(entity, actor, Action::Create, &BTreeMap::new())
    }

    pub fn generate_update_event(
        &self,
        entity: &EntityRef,
        actor: &ActorRef,
    ) -> Result<Vec<u8>, EventError> {
        self.generate_event(entity, actor, Action::Update, &BTreeMap::new())
    }

    pub fn generate_delete_event(
        &self,
        entity: &EntityRef,
        actor: &ActorRef,
    ) -> Result<Vec<u8>, EventError> {
        self.generate_event(entity, actor, Action::Delete, &BTreeMap::new())
    }

    /// Builds the activity without serializing it.
    pub fn build_activity(
        &self,
        entity: &EntityRef,
        actor: &ActorRef,
        action: Action,
        data: &BTreeMap<String, String>,
    ) -> Result<Activity, EventError> {
        let (actor_uuid, actor_url) = actor.resolve()?;
        let (entity_uuid, entity_url) = entity.resolve()?;

        let attachment: BTreeMap<String, String> = data
            .iter()
            .filter(|(key, _)| !CONTROL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut builder = Activity::builder()
            .activity_type(action.activity_type())
            .actor(actor_uuid.urn(), page_links(actor_url))
            .object(entity_uuid.urn(), entity_links(&entity.kind, entity_url))
            .attachment(attachment);

        if let Some(summary) = action.summary() {
            builder = builder.summary(summary);
        }

        builder.build()
    }
}

/// Canonical HTML page plus its JSON-LD and JSON serializations.
fn page_links(url: &str) -> Vec<Link> {
    vec![
        Link::new("Canonical", url, "text/html", LinkRel::Canonical),
        Link::new(
            "JSONLD",
            with_format(url, "jsonld"),
            "application/ld+json",
            LinkRel::Alternate,
        ),
        Link::new(
            "JSON",
            with_format(url, "json"),
            "application/json",
            LinkRel::Alternate,
        ),
    ]
}

fn entity_links(kind: &EntityKind, url: &str) -> Vec<Link> {
    match kind {
        EntityKind::Generic => page_links(url),
        EntityKind::File {
            mime_type,
            rest_url,
            checksum_url,
        } => {
            let mut links = vec![Link::new("Canonical", url, mime_type, LinkRel::Canonical)];
            if let Some(checksum_url) = checksum_url {
                links.push(Link::new(
                    "Checksum",
                    with_format(checksum_url, "json"),
                    "application/json",
                    LinkRel::Alternate,
                ));
            }
            if let Some(rest_url) = rest_url {
                links.push(Link::new(
                    "JSON",
                    with_format(rest_url, "json"),
                    "application/json",
                    LinkRel::Alternate,
                ));
            }
            links
        }
        EntityKind::Media { source } => {
            let mut links = page_links(url);
            if let Some(source) = source {
                links.push(Link::new(
                    "Source",
                    &source.url,
                    &source.mime_type,
                    LinkRel::Alternate,
                ));
            }
            links
        }
    }
}

fn with_format(url: &str, format: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}_format={format}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_id::{EntityUuid, UserUuid};
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::Value;

    fn actor() -> ActorRef {
        ActorRef::new(
            UserUuid::parse("user-1").unwrap(),
            "http://localhost:8000/user/1",
        )
    }

    fn node() -> EntityRef {
        EntityRef::generic(
            EntityUuid::parse("abc-123").unwrap(),
            "http://localhost:8000/node/1",
        )
    }

    fn generate(entity: &EntityRef, action: Action, data: &[(&str, &str)]) -> Value {
        let data: BTreeMap<String, String> = data
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let bytes = EventGenerator::new()
            .generate_event(entity, &actor(), action, &data)
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_create_scenario() {
        let event = generate(&node(), Action::Create, &[]);

        assert_eq!(event["@context"], "https://www.w3.org/ns/activitystreams");
        assert_eq!(event["type"], "Create");
        assert_eq!(event["actor"]["type"], "Person");
        assert_eq!(event["actor"]["id"], "urn:uuid:user-1");
        assert_eq!(event["object"]["id"], "urn:uuid:abc-123");
        assert!(event["object"].get("attachment").is_none());
        assert!(event.get("summary").is_none());
    }

    #[rstest]
    #[case(Action::Create, "Create")]
    #[case(Action::Update, "Update")]
    #[case(Action::Delete, "Delete")]
    fn test_type_matches_action(#[case] action: Action, #[case] expected: &str) {
        let event = generate(&node(), action, &[]);
        assert_eq!(event["type"], expected);
        assert!(event.get("summary").is_none());
    }

    #[test]
    fn test_generate_derivative_is_activity() {
        let event = generate(&node(), Action::GenerateDerivative, &[]);
        assert_eq!(event["type"], "Activity");
        assert_eq!(event["summary"], "Generate Derivative");
    }

    #[test]
    fn test_attachment_excludes_control_keys() {
        let event = generate(
            &node(),
            Action::Update,
            &[
                ("event", "Update"),
                ("queue", "islandora-indexing-fcrepo"),
                ("source_field", "field_media_image"),
                ("mimetype", "image/jpeg"),
            ],
        );

        let attachment = &event["object"]["attachment"];
        assert_eq!(attachment["type"], "Object");
        assert_eq!(attachment["mediaType"], "application/json");
        assert_eq!(
            attachment["content"],
            serde_json::json!({"mimetype": "image/jpeg", "source_field": "field_media_image"})
        );
    }

    #[test]
    fn test_only_control_keys_means_no_attachment() {
        let event = generate(&node(), Action::Delete, &[("event", "Delete"), ("queue", "q")]);
        assert!(event["object"].get("attachment").is_none());
    }

    #[test]
    fn test_generic_links() {
        let event = generate(&node(), Action::Create, &[]);
        let links = event["object"]["url"].as_array().unwrap();

        assert_eq!(links.len(), 3);
        assert_eq!(links[0]["href"], "http://localhost:8000/node/1");
        assert_eq!(links[0]["mediaType"], "text/html");
        assert_eq!(links[0]["rel"], "canonical");
        assert_eq!(links[0]["type"], "Link");
        assert_eq!(links[1]["href"], "http://localhost:8000/node/1?_format=jsonld");
        assert_eq!(links[1]["mediaType"], "application/ld+json");
        assert_eq!(links[1]["rel"], "alternate");
        assert_eq!(links[2]["href"], "http://localhost:8000/node/1?_format=json");
    }

    #[test]
    fn test_file_canonical_uses_own_mime_type() {
        let file = EntityRef::file(
            EntityUuid::parse("file-9").unwrap(),
            "http://localhost:8000/sites/default/files/test.jpeg",
            "image/jpeg",
        )
        .with_rest_url("http://localhost:8000/entity/file/9")
        .with_checksum_url("http://localhost:8000/checksum/9");

        let event = generate(&file, Action::Create, &[]);
        let links = event["object"]["url"].as_array().unwrap();

        assert_eq!(links[0]["mediaType"], "image/jpeg");
        assert_eq!(links[0]["rel"], "canonical");
        assert_eq!(links[1]["name"], "Checksum");
        assert_eq!(links[1]["href"], "http://localhost:8000/checksum/9?_format=json");
        assert_eq!(links[2]["href"], "http://localhost:8000/entity/file/9?_format=json");
    }

    #[test]
    fn test_media_links_include_source() {
        let media = EntityRef::media(
            EntityUuid::parse("media-3").unwrap(),
            "http://localhost:8000/media/3",
        )
        .with_source("http://localhost:8000/files/test.tiff", "image/tiff");

        let event = generate(&media, Action::Update, &[]);
        let links = event["object"]["url"].as_array().unwrap();

        assert_eq!(links.len(), 4);
        assert_eq!(links[0]["mediaType"], "text/html");
        assert_eq!(links[3]["href"], "http://localhost:8000/files/test.tiff");
        assert_eq!(links[3]["mediaType"], "image/tiff");
    }

    #[test]
    fn test_unsaved_entity_is_rejected() {
        let err = EventGenerator::new()
            .generate_create_event(&EntityRef::unsaved(EntityKind::Generic), &actor())
            .unwrap_err();
        assert!(err.is_unresolved());
    }

    #[test]
    fn test_actor_without_url_is_rejected() {
        let actor = ActorRef {
            uuid: Some(UserUuid::parse("user-1").unwrap()),
            url: None,
        };
        let err = EventGenerator::new()
            .generate_update_event(&node(), &actor)
            .unwrap_err();
        assert_eq!(
            err,
            EventError::UnresolvedReference {
                subject: "actor",
                missing: "url"
            }
        );
    }

    #[rstest]
    #[case("Create", Action::Create)]
    #[case("update", Action::Update)]
    #[case(" DELETE ", Action::Delete)]
    #[case("Generate Derivative", Action::GenerateDerivative)]
    #[case("generate_derivative", Action::GenerateDerivative)]
    fn test_action_from_str(#[case] label: &str, #[case] expected: Action) {
        assert_eq!(label.parse::<Action>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            "Publish".parse::<Action>().unwrap_err(),
            EventError::UnknownAction("Publish".to_string())
        );
    }

    #[test]
    fn test_format_appends_to_existing_query() {
        assert_eq!(with_format("http://x/a?b=1", "json"), "http://x/a?b=1&_format=json");
    }

    proptest! {
        #[test]
        fn prop_generation_is_deterministic(
            data in proptest::collection::btree_map("[a-z_]{1,8}", "[ -~]{0,16}", 0..6),
            derivative in any::<bool>(),
        ) {
            let action = if derivative { Action::GenerateDerivative } else { Action::Update };
            let generator = EventGenerator::new();
            let first = generator.generate_event(&node(), &actor(), action, &data).unwrap();
            let second = generator.generate_event(&node(), &actor(), action, &data).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
