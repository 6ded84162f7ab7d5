//! Per-request orchestration of the webhook pipeline.
//!
//! ```text
//! Received → Authenticated → Decoded → Validated → Skipped | Mapped → Published → Responded
//! ```
//!
//! Any stage can fail, which responds immediately with the error's status.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::WebhookError;
use crate::message::{to_canonical, Mapped, SourceConfig};
use crate::publish::{publish, PublishReport, Sink};
use crate::webhook::{decode, validate, verify_request, RawRequest};

/// Pipeline stage a request reached; reported when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Authenticated,
    Decoded,
    Validated,
    Mapped,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Authenticated => "authenticated",
            Stage::Decoded => "decoded",
            Stage::Validated => "validated",
            Stage::Mapped => "mapped",
        };
        f.write_str(name)
    }
}

/// Plain-text HTTP-level result of handling one webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: StatusCode,
    pub body: String,
}

impl WebhookResponse {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }
}

impl From<WebhookError> for WebhookResponse {
    fn from(error: WebhookError) -> Self {
        Self {
            status: error.status_code(),
            body: error.to_string(),
        }
    }
}

enum Outcome {
    Skipped(&'static str),
    Published(PublishReport),
}

/// Verifies, normalizes and republishes GitHub webhooks.
///
/// Holds only immutable state and is shared across concurrent requests.
pub struct WebhookHandler {
    secret: Vec<u8>,
    source: SourceConfig,
    sinks: Vec<Arc<dyn Sink>>,
}

impl WebhookHandler {
    pub fn new(secret: impl Into<Vec<u8>>, source: SourceConfig, sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self {
            secret: secret.into(),
            source,
            sinks,
        }
    }

    pub fn sink_ids(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.sink_id()).collect()
    }

    /// Handle one webhook delivery.
    ///
    /// `cancel` bounds the fan-out; it is handed to every sink call.
    pub async fn handle(&self, cancel: &CancellationToken, request: &RawRequest) -> WebhookResponse {
        let delivery_id = request.delivery_id().unwrap_or("-").to_string();
        let event_type = request.event_type().unwrap_or_default().to_string();

        info!(
            delivery_id = %delivery_id,
            event_type = %event_type,
            body_length = request.body().len(),
            is_base64_encoded = request.is_base64_encoded(),
            "webhook_received"
        );

        let mut stage = Stage::Received;
        match self.process(cancel, request, &mut stage).await {
            Ok(Outcome::Skipped(reason)) => {
                info!(delivery_id = %delivery_id, reason, "webhook_skipped");
                WebhookResponse::ok(reason)
            }
            Ok(Outcome::Published(report)) => {
                info!(
                    delivery_id = %delivery_id,
                    message_id = %report.message_id,
                    sinks = report.results.len(),
                    "webhook_published"
                );
                WebhookResponse::ok(format!("OK\n{}", report.trace_lines().join("\n")))
            }
            Err(error) => {
                warn!(
                    delivery_id = %delivery_id,
                    event_type = %event_type,
                    stage = %stage,
                    status = error.status_code().as_u16(),
                    error = %error,
                    "webhook_rejected"
                );
                error.into()
            }
        }
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        request: &RawRequest,
        stage: &mut Stage,
    ) -> Result<Outcome, WebhookError> {
        let payload = verify_request(request, &self.secret)?;
        *stage = Stage::Authenticated;
        debug!(payload_length = payload.as_bytes().len(), "webhook_authenticated");

        let delivery_id = request.delivery_id().ok_or_else(|| {
            WebhookError::MalformedRequest("missing X-GitHub-Delivery header".to_string())
        })?;
        let event_type = request.event_type().ok_or_else(|| {
            WebhookError::MalformedRequest("missing X-GitHub-Event header".to_string())
        })?;

        let envelope = decode(event_type, payload.as_bytes())?;
        *stage = Stage::Decoded;

        let event = validate(&envelope)?;
        *stage = Stage::Validated;

        let message = match to_canonical(&event, delivery_id, &self.source) {
            Mapped::Skip(reason) => return Ok(Outcome::Skipped(reason)),
            Mapped::Message(message) => message,
        };
        *stage = Stage::Mapped;

        let report = publish(cancel, &message, &self.sinks).await?;
        Ok(Outcome::Published(report))
    }
}
