//! # isle-bridge
//!
//! Ties the isle crates together for a deployment:
//!
//! - [`Config`] reads `ISLE_*` environment variables
//! - [`telemetry::init`] installs structured logging
//! - [`EventEmitter`] turns an entity change into an acknowledged broker
//!   message
//! - [`health::check`] verifies the repository root and the broker

mod config;
mod emit;
mod error;
pub mod health;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use emit::{EventEmitter, EVENT_KEY, QUEUE_KEY};
pub use error::BridgeError;
pub use isle_fedora::{Issue, Severity};
