//! Emitting events end to end through the scripted broker.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use isle_bridge::{BridgeError, EventEmitter};
use isle_events::{Action, ActorRef, EntityRef, EventError};
use isle_id::{EntityUuid, UserUuid};
use isle_messaging::{Headers, MessagePublisher, MessagingError, StompPublisher};
use isle_testing::{BrokerBehavior, FakeBroker};
use serde_json::Value;

const QUEUE: &str = "/queue/islandora-indexing-fcrepo-content";

fn entity() -> EntityRef {
    EntityRef::generic(
        EntityUuid::parse("abc-123").unwrap(),
        "http://localhost:8000/node/1",
    )
}

fn actor() -> ActorRef {
    ActorRef::new(
        UserUuid::parse("user-1").unwrap(),
        "http://localhost:8000/user/1",
    )
}

/// Captures publishes instead of sending them.
#[derive(Default)]
struct Recorder {
    published: Mutex<Vec<(String, Vec<u8>, Headers)>>,
}

#[async_trait]
impl MessagePublisher for Recorder {
    async fn publish(
        &self,
        destination: &str,
        message: &[u8],
        headers: Headers,
    ) -> Result<(), MessagingError> {
        self.published
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_vec(), headers));
        Ok(())
    }
}

#[tokio::test]
async fn test_emit_through_broker() {
    let broker = FakeBroker::spawn(BrokerBehavior::Acknowledge).await.unwrap();
    let publisher = StompPublisher::with_uuid_receipts(&broker.url()).unwrap();
    let emitter = EventEmitter::new(Arc::new(publisher)).with_token("jwt.token.here");

    emitter
        .emit(QUEUE, &entity(), &actor(), Action::Create, &BTreeMap::new())
        .await
        .unwrap();

    let sent = broker.sent();
    assert_eq!(sent.len(), 1);
    let frame = &sent[0];
    assert_eq!(frame.get("destination"), Some(QUEUE));
    assert_eq!(frame.get("Authorization"), Some("Bearer jwt.token.here"));
    assert!(frame.get("receipt").is_some());

    let event: Value = serde_json::from_slice(&frame.body).unwrap();
    assert_eq!(event["type"], "Create");
    assert_eq!(event["actor"]["id"], "urn:uuid:user-1");
    assert_eq!(event["object"]["id"], "urn:uuid:abc-123");
    assert!(event["object"].get("attachment").is_none());
}

#[tokio::test]
async fn test_emit_surfaces_broker_rejection() {
    let broker = FakeBroker::spawn(BrokerBehavior::RejectSend("no room".into()))
        .await
        .unwrap();
    let publisher = StompPublisher::with_uuid_receipts(&broker.url()).unwrap();
    let emitter = EventEmitter::new(Arc::new(publisher));

    let err = emitter
        .emit(QUEUE, &entity(), &actor(), Action::Update, &BTreeMap::new())
        .await
        .unwrap_err();
    assert!(err.is_delivery_failure());
}

#[tokio::test]
async fn test_emit_without_token_sends_no_authorization() {
    let recorder = Arc::new(Recorder::default());
    let emitter = EventEmitter::new(recorder.clone());

    emitter
        .emit(QUEUE, &entity(), &actor(), Action::Delete, &BTreeMap::new())
        .await
        .unwrap();

    let published = recorder.published.lock().unwrap();
    assert!(published[0].2.is_empty());
}

#[tokio::test]
async fn test_emit_from_data_reads_control_keys() {
    let recorder = Arc::new(Recorder::default());
    let emitter = EventEmitter::new(recorder.clone());

    let data = BTreeMap::from([
        ("event".to_string(), "Generate Derivative".to_string()),
        ("queue".to_string(), "/queue/houdini".to_string()),
        ("mimetype".to_string(), "image/jpeg".to_string()),
    ]);
    emitter
        .emit_from_data(&entity(), &actor(), &data)
        .await
        .unwrap();

    let published = recorder.published.lock().unwrap();
    let (destination, message, _) = &published[0];
    assert_eq!(destination, "/queue/houdini");

    let event: Value = serde_json::from_slice(message).unwrap();
    assert_eq!(event["type"], "Activity");
    assert_eq!(event["summary"], "Generate Derivative");
    let content = &event["object"]["attachment"]["content"];
    assert_eq!(content["mimetype"], "image/jpeg");
    assert!(content.get("event").is_none());
    assert!(content.get("queue").is_none());
}

#[tokio::test]
async fn test_emit_from_data_falls_back_to_default_queue() {
    let recorder = Arc::new(Recorder::default());
    let emitter = EventEmitter::new(recorder.clone()).with_default_queue("/queue/default");

    let data = BTreeMap::from([("event".to_string(), "update".to_string())]);
    emitter
        .emit_from_data(&entity(), &actor(), &data)
        .await
        .unwrap();

    assert_eq!(recorder.published.lock().unwrap()[0].0, "/queue/default");
}

#[tokio::test]
async fn test_emit_from_data_errors() {
    let emitter = EventEmitter::new(Arc::new(Recorder::default()));

    let no_event = BTreeMap::from([("queue".to_string(), "/queue/x".to_string())]);
    assert!(matches!(
        emitter.emit_from_data(&entity(), &actor(), &no_event).await,
        Err(BridgeError::MissingControlKey("event"))
    ));

    let no_queue = BTreeMap::from([("event".to_string(), "create".to_string())]);
    assert!(matches!(
        emitter.emit_from_data(&entity(), &actor(), &no_queue).await,
        Err(BridgeError::MissingControlKey("queue"))
    ));

    let bad_event = BTreeMap::from([
        ("event".to_string(), "explode".to_string()),
        ("queue".to_string(), "/queue/x".to_string()),
    ]);
    assert!(matches!(
        emitter.emit_from_data(&entity(), &actor(), &bad_event).await,
        Err(BridgeError::Event(EventError::UnknownAction(_)))
    ));
}

#[tokio::test]
async fn test_unsaved_entity_is_never_published() {
    let recorder = Arc::new(Recorder::default());
    let emitter = EventEmitter::new(recorder.clone());

    let err = emitter
        .emit(
            QUEUE,
            &EntityRef::unsaved(Default::default()),
            &actor(),
            Action::Create,
            &BTreeMap::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Event(ref e) if e.is_unresolved()));
    assert!(recorder.published.lock().unwrap().is_empty());
}
