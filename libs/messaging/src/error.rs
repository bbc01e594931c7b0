//! Error types for broker messaging.

use std::time::Duration;

use thiserror::Error;

/// Transport and protocol failures on a single STOMP connection.
#[derive(Debug, Error)]
pub enum StompError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS setup failed.
    #[error("tls error: {0}")]
    Tls(String),

    /// The broker did not answer in time.
    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        after: Duration,
        waiting_for: &'static str,
    },

    /// The broker closed the connection mid-exchange.
    #[error("connection closed by broker")]
    ConnectionClosed,

    /// The broker answered with an ERROR frame.
    #[error("broker error: {message}")]
    Broker { message: String, details: String },

    /// The broker sent something that is not valid STOMP.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl StompError {
    /// Returns true if the failure was a deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StompError::Timeout { .. })
    }
}

/// Errors surfaced to callers of the publisher.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The configured broker URL cannot be used.
    #[error("invalid broker url '{url}': {reason}")]
    InvalidBrokerUrl { url: String, reason: String },

    /// Connection establishment failed.
    #[error("connection to STOMP broker {broker} failed: {cause}")]
    BrokerUnavailable {
        broker: String,
        #[source]
        cause: StompError,
    },

    /// The message was not acknowledged.
    #[error("failure publishing message to {destination}: {cause}")]
    PublishFailed {
        destination: String,
        #[source]
        cause: StompError,
    },
}

impl MessagingError {
    /// Returns true if the broker could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, MessagingError::BrokerUnavailable { .. })
    }

    /// Returns true if the broker was reached but did not confirm delivery.
    pub fn is_publish_failure(&self) -> bool {
        matches!(self, MessagingError::PublishFailed { .. })
    }
}
