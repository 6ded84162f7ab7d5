//! Ordered, fail-fast fan-out of one message to every sink.
//!
//! Sinks are called in configuration order. The first failure stops the
//! fan-out: later sinks are not called and sinks already called are not
//! compensated, so a failed request may have reached a prefix of the sinks.
//! GitHub redelivers on the resulting 500 and the deterministic message id
//! lets consumers drop the duplicates.

use std::sync::Arc;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::Sink;
use crate::error::WebhookError;
use crate::message::CanonicalMessage;

/// Outcome of delivering to one sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub sink_id: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Outcome of a successful fan-out.
///
/// Holds only successful results; a failing sink ends the fan-out with
/// [`WebhookError::Publish`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub message_id: String,
    pub results: Vec<PublishResult>,
}

impl PublishReport {
    /// Human-readable trace for the response body.
    pub fn trace_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.results.len() + 1);
        lines.push(format!("Message ID: {}", self.message_id));
        lines.extend(
            self.results
                .iter()
                .map(|r| format!("published to {}", r.sink_id)),
        );
        lines
    }
}

/// Publish `message` to each sink in order, stopping at the first failure.
///
/// Cancellation of `cancel` fails the in-flight sink call and is treated like
/// any other sink error.
pub async fn publish(
    cancel: &CancellationToken,
    message: &CanonicalMessage,
    sinks: &[Arc<dyn Sink>],
) -> Result<PublishReport, WebhookError> {
    let mut results = Vec::with_capacity(sinks.len());

    for sink in sinks {
        let sink_id = sink.sink_id();

        let outcome = if cancel.is_cancelled() {
            Err(anyhow!("request cancelled before publish"))
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(anyhow!("request cancelled during publish")),
                result = sink.publish(cancel, message) => result,
            }
        };

        if let Err(e) = outcome {
            error!(
                sink_id = %sink_id,
                message_id = %message.message_id,
                delivered = results.len(),
                skipped = sinks.len() - results.len() - 1,
                error = %e,
                "sink_publish_failed"
            );
            return Err(WebhookError::Publish {
                sink_id: sink_id.to_string(),
                source: e,
            });
        }

        info!(
            sink_id = %sink_id,
            message_id = %message.message_id,
            "sink_published"
        );
        results.push(PublishResult {
            sink_id: sink_id.to_string(),
            ok: true,
            error: None,
        });
    }

    Ok(PublishReport {
        message_id: message.message_id.clone(),
        results,
    })
}
