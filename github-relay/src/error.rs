//! Error taxonomy for webhook handling.
//!
//! Every failure in the pipeline maps to exactly one variant, and every
//! variant maps to exactly one HTTP status. Error text is returned to the
//! webhook sender, so no variant ever carries the shared secret or the raw
//! signature value.

use axum::http::StatusCode;
use thiserror::Error;

/// Failure while handling a single webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature did not match, or could not be interpreted.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Request is missing a required header or has an undecodable body.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Payload is not valid JSON for the claimed event kind.
    #[error("parsing {kind} payload: {source}")]
    Parse {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Event kind is not one this relay forwards.
    #[error("webhooks should only be configured for push or check_run events, got '{0}'")]
    UnsupportedEvent(String),

    /// A required field is absent from an otherwise well-formed payload.
    #[error("nil '{field}' on {kind} event")]
    Validation {
        kind: &'static str,
        field: &'static str,
    },

    /// A sink rejected the message; remaining sinks were not attempted.
    #[error("publishing to {sink_id}: {source:#}")]
    Publish {
        sink_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WebhookError {
    /// HTTP status the transport should answer with.
    ///
    /// Everything the sender can fix is a 400. Publish failures are a 500 so
    /// that GitHub redelivers the webhook.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Publish { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
