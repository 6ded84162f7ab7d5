//! GitHub Relay - verifies GitHub webhooks and republishes them to message sinks.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → Web Server → verify → decode → validate → map → fan-out → AMQP exchange, event bus
//! ```
//!
//! Each request is handled independently; the secret, source identity and
//! sink list are fixed at startup and shared read-only.

pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod publish;
pub mod web;
pub mod webhook;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::WebhookError;
pub use handler::{WebhookHandler, WebhookResponse};
pub use message::{CanonicalMessage, MessageKind, SourceConfig};
pub use publish::{sinks_from_config, AmqpSink, EventBusSink, PublishReport, Sink};
pub use web::AppState;
pub use webhook::{RawRequest, VerifiedPayload};
