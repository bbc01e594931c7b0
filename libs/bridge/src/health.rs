//! Startup sanity checks.

use isle_fedora::{FedoraAdapter, Issue};
use isle_messaging::StompPublisher;
use tracing::info;

/// Checks the repository root and broker. An empty result means healthy.
pub async fn check(adapter: &FedoraAdapter, publisher: &StompPublisher) -> Vec<Issue> {
    let mut issues = adapter.ensure().await;

    if let Err(e) = publisher.check_connection().await {
        issues.push(Issue::error(format!(
            "broker {} unavailable: {}",
            publisher.broker(),
            e
        )));
    }

    if issues.is_empty() {
        info!(
            repository = adapter.client().base_uri(),
            broker = %publisher.broker(),
            "Health check passed"
        );
    }
    issues
}
