//! Errors surfaced by the bridge.

use isle_events::EventError;
use isle_fedora::RepositoryError;
use isle_messaging::MessagingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("event generation failed: {0}")]
    Event(#[from] EventError),

    #[error("event delivery failed: {0}")]
    Messaging(#[from] MessagingError),

    #[error("repository request failed: {0}")]
    Repository(#[from] RepositoryError),

    /// Auxiliary data lacked a control key and no default was configured.
    #[error("no {0} given and no default configured")]
    MissingControlKey(&'static str),
}

impl BridgeError {
    /// True when the failure came from the broker or the network path to it.
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, Self::Messaging(_))
    }
}
