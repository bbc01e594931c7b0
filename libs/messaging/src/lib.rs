//! # isle-messaging
//!
//! Confirmed delivery of event messages to a STOMP broker.
//!
//! ## Design Principles
//!
//! - One connection per publish: opened, used once, always closed
//! - Every SEND carries a `receipt` header; a publish completes only when the
//!   broker acknowledges that receipt, turning fire-and-forget messaging into
//!   a confirmed-delivery primitive
//! - Failures are typed and surfaced; nothing is retried here
//! - No shared mutable state between publishes, so concurrent publishes are
//!   independent
//!
//! ## Protocol
//!
//! STOMP 1.2 over TCP (`tcp://`, `stomp://`) or TLS (`ssl://`,
//! `stomp+ssl://`):
//!
//! 1. `CONNECT` → `CONNECTED`
//! 2. `SEND` with `receipt` → `RECEIPT` with matching `receipt-id`
//! 3. `DISCONNECT`, then the socket is shut down

mod broker_url;
mod connection;
mod error;
mod frame;
mod publisher;

pub use broker_url::BrokerUrl;
pub use connection::{StompConnection, CLOSE_TIMEOUT};
pub use error::{MessagingError, StompError};
pub use frame::{Command, Frame, MAX_FRAME_BYTES};
pub use publisher::{Headers, MessagePublisher, PublisherConfig, StompPublisher, RECEIPT_HEADER};
