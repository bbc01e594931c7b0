//! Event emission: generate an event for an entity change and publish it.

use std::collections::BTreeMap;
use std::sync::Arc;

use isle_events::{Action, ActorRef, EntityRef, EventGenerator};
use isle_messaging::{Headers, MessagePublisher};
use tracing::{info, warn};

use crate::BridgeError;

/// Auxiliary data key naming the action.
pub const EVENT_KEY: &str = "event";

/// Auxiliary data key naming the destination queue.
pub const QUEUE_KEY: &str = "queue";

/// Generates events and hands them to a publisher.
#[derive(Clone)]
pub struct EventEmitter {
    generator: EventGenerator,
    publisher: Arc<dyn MessagePublisher>,
    token: Option<String>,
    default_queue: Option<String>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("default_queue", &self.default_queue)
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    pub fn new(publisher: Arc<dyn MessagePublisher>) -> Self {
        Self {
            generator: EventGenerator::new(),
            publisher,
            token: None,
            default_queue: None,
        }
    }

    /// Sends `Authorization: Bearer <token>` with every event.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Queue used by [`emit_from_data`](Self::emit_from_data) when the data
    /// names none.
    pub fn with_default_queue(mut self, queue: impl Into<String>) -> Self {
        self.default_queue = Some(queue.into());
        self
    }

    /// Generates the event and publishes it to `queue`, returning once the
    /// broker has acknowledged it.
    pub async fn emit(
        &self,
        queue: &str,
        entity: &EntityRef,
        actor: &ActorRef,
        action: Action,
        data: &BTreeMap<String, String>,
    ) -> Result<(), BridgeError> {
        let message = self
            .generator
            .generate_event(entity, actor, action, data)
            .inspect_err(|e| warn!(queue, action = %action, error = %e, "Could not generate event"))?;

        let mut headers = Headers::new();
        if let Some(token) = &self.token {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }

        self.publisher.publish(queue, &message, headers).await?;
        info!(queue, action = %action, bytes = message.len(), "Emitted event");
        Ok(())
    }

    /// Like [`emit`](Self::emit) with the action and queue read from the
    /// `event` and `queue` keys of `data`.
    pub async fn emit_from_data(
        &self,
        entity: &EntityRef,
        actor: &ActorRef,
        data: &BTreeMap<String, String>,
    ) -> Result<(), BridgeError> {
        let action: Action = data
            .get(EVENT_KEY)
            .ok_or(BridgeError::MissingControlKey(EVENT_KEY))?
            .parse()?;
        let queue = data
            .get(QUEUE_KEY)
            .or(self.default_queue.as_ref())
            .ok_or(BridgeError::MissingControlKey(QUEUE_KEY))?;

        self.emit(queue, entity, actor, action, data).await
    }
}
