//! Configuration for the bridge.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use isle_fedora::{FedoraAdapter, FedoraClient};
use isle_messaging::{BrokerUrl, PublisherConfig, StompPublisher};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "compact" | "text" => Ok(Self::Compact),
            other => bail!("unknown log format {other:?} (expected json or compact)"),
        }
    }
}

/// Bridge configuration.
#[derive(Clone)]
pub struct Config {
    /// STOMP broker URL, e.g. `tcp://activemq:61613`.
    pub broker_url: String,

    /// Fedora REST root, e.g. `http://fcrepo:8080/fcrepo/rest`.
    pub fedora_url: String,

    /// Bearer token for the repository and outgoing events.
    pub jwt_token: Option<String>,

    /// Per-request repository timeout in seconds.
    pub http_timeout_secs: u64,

    /// Broker connect + handshake timeout in seconds.
    pub broker_connect_timeout_secs: u64,

    /// Broker receipt timeout in seconds.
    pub broker_receipt_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let broker = BrokerUrl::parse(&self.broker_url)
            .map(|url| url.redacted())
            .unwrap_or_else(|_| "<invalid>".to_string());
        f.debug_struct("Config")
            .field("broker_url", &broker)
            .field("fedora_url", &self.fedora_url)
            .field("jwt_token", &self.jwt_token.as_ref().map(|_| "***"))
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("broker_connect_timeout_secs", &self.broker_connect_timeout_secs)
            .field("broker_receipt_timeout_secs", &self.broker_receipt_timeout_secs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let broker_url = lookup("ISLE_BROKER_URL")
            .unwrap_or_else(|| "tcp://127.0.0.1:61613".to_string());
        BrokerUrl::parse(&broker_url).context("ISLE_BROKER_URL is not a valid broker URL")?;

        let fedora_url = lookup("ISLE_FEDORA_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8080/fcrepo/rest".to_string());

        let jwt_token = lookup("ISLE_JWT_TOKEN").filter(|token| !token.trim().is_empty());

        let http_timeout_secs = seconds(&lookup, "ISLE_HTTP_TIMEOUT", 30)?;
        let broker_connect_timeout_secs = seconds(&lookup, "ISLE_BROKER_CONNECT_TIMEOUT", 5)?;
        let broker_receipt_timeout_secs = seconds(&lookup, "ISLE_BROKER_RECEIPT_TIMEOUT", 10)?;

        let log_level = lookup("ISLE_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = match lookup("ISLE_LOG_FORMAT") {
            Some(raw) => raw.parse().context("ISLE_LOG_FORMAT")?,
            None => LogFormat::default(),
        };

        Ok(Self {
            broker_url,
            fedora_url,
            jwt_token,
            http_timeout_secs,
            broker_connect_timeout_secs,
            broker_receipt_timeout_secs,
            log_level,
            log_format,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            connect_timeout: Duration::from_secs(self.broker_connect_timeout_secs),
            receipt_timeout: Duration::from_secs(self.broker_receipt_timeout_secs),
        }
    }

    /// Builds a publisher with random receipt ids.
    pub fn publisher(&self) -> Result<StompPublisher> {
        Ok(StompPublisher::with_uuid_receipts(&self.broker_url)?
            .with_config(self.publisher_config()))
    }

    pub fn adapter(&self) -> Result<FedoraAdapter> {
        let client = FedoraClient::new(
            &self.fedora_url,
            self.jwt_token.as_deref(),
            self.http_timeout(),
        )
        .context("Failed to build repository client")?;
        Ok(FedoraAdapter::new(client))
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => bail!("{key} must be greater than zero"),
            Ok(secs) => Ok(secs),
            Err(_) => bail!("{key} must be a whole number of seconds, got {raw:?}"),
        },
    }
}
