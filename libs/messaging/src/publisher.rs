//! Receipt-confirmed publishing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use isle_id::{IdGenerator, UuidGenerator};
use tracing::{debug, info, warn};

use crate::{BrokerUrl, MessagingError, StompConnection};

/// Header requesting broker acknowledgment.
pub const RECEIPT_HEADER: &str = "receipt";

/// Message headers; ordered so frames are reproducible.
pub type Headers = BTreeMap<String, String>;

/// Delivers messages to named queues or topics.
///
/// Returning `Ok` means the broker confirmed receipt; every other outcome is
/// an error.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(
        &self,
        destination: &str,
        message: &[u8],
        headers: Headers,
    ) -> Result<(), MessagingError>;
}

/// Publisher deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Bound on TCP/TLS connect plus the CONNECT handshake.
    pub connect_timeout: Duration,
    /// Bound on waiting for the RECEIPT after SEND.
    pub receipt_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            receipt_timeout: Duration::from_secs(10),
        }
    }
}

/// STOMP implementation of [`MessagePublisher`].
///
/// Holds only read-only configuration; each publish opens its own
/// connection and always closes it.
#[derive(Clone)]
pub struct StompPublisher {
    broker: BrokerUrl,
    config: PublisherConfig,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for StompPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StompPublisher")
            .field("broker", &self.broker.redacted())
            .field("config", &self.config)
            .finish()
    }
}

impl StompPublisher {
    /// Creates a publisher whose receipts come from `ids`.
    pub fn new(broker_url: &str, ids: Arc<dyn IdGenerator>) -> Result<Self, MessagingError> {
        Ok(Self {
            broker: BrokerUrl::parse(broker_url)?,
            config: PublisherConfig::default(),
            ids,
        })
    }

    /// Creates a publisher using random UUID receipts.
    pub fn with_uuid_receipts(broker_url: &str) -> Result<Self, MessagingError> {
        Self::new(broker_url, Arc::new(UuidGenerator))
    }

    pub fn with_config(mut self, config: PublisherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn broker(&self) -> &BrokerUrl {
        &self.broker
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Opens and closes one connection to check the broker is reachable.
    pub async fn check_connection(&self) -> Result<(), MessagingError> {
        let connection = self.connect().await?;
        connection.close().await;
        debug!(broker = %self.broker, "Broker connection check succeeded");
        Ok(())
    }

    async fn connect(&self) -> Result<StompConnection, MessagingError> {
        StompConnection::open(&self.broker, self.config.connect_timeout)
            .await
            .map_err(|cause| {
                warn!(broker = %self.broker, error = %cause, "Connection to broker failed");
                MessagingError::BrokerUnavailable {
                    broker: self.broker.redacted(),
                    cause,
                }
            })
    }
}

#[async_trait]
impl MessagePublisher for StompPublisher {
    async fn publish(
        &self,
        destination: &str,
        message: &[u8],
        mut headers: Headers,
    ) -> Result<(), MessagingError> {
        let mut connection = self.connect().await?;

        let receipt = headers
            .entry(RECEIPT_HEADER.to_string())
            .or_insert_with(|| self.ids.generate())
            .clone();
        let headers: Vec<(String, String)> = headers.into_iter().collect();

        let result = connection
            .send(
                destination,
                message,
                &headers,
                &receipt,
                self.config.receipt_timeout,
            )
            .await;

        connection.close().await;

        match result {
            Ok(()) => {
                info!(destination, receipt = %receipt, bytes = message.len(), "Published message");
                Ok(())
            }
            Err(cause) => {
                warn!(destination, receipt = %receipt, error = %cause, "Publish not acknowledged");
                Err(MessagingError::PublishFailed {
                    destination: destination.to_string(),
                    cause,
                })
            }
        }
    }
}
