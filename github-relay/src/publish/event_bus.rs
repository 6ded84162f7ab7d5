//! HTTP event bus sink.
//!
//! Posts one entry per message to an event bus ingest endpoint:
//!
//! ```json
//! {"eventBusName": "default", "source": "github-relay", "detailType": "github:push", "detail": {...}}
//! ```
//!
//! Any non-2xx response is a delivery failure.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use super::Sink;
use crate::message::CanonicalMessage;

/// Sink posting messages to an HTTP event bus.
pub struct EventBusSink {
    id: String,
    client: Client,
    endpoint: Url,
    bus_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBusEntry<'a> {
    event_bus_name: &'a str,
    source: &'a str,
    detail_type: &'a str,
    detail: &'a CanonicalMessage,
}

impl EventBusSink {
    pub fn new(endpoint: &str, bus_name: String, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).context("Invalid event bus URL")?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            id: format!("eventbus:{bus_name}"),
            client,
            endpoint,
            bus_name,
        })
    }
}

#[async_trait]
impl Sink for EventBusSink {
    fn sink_id(&self) -> &str {
        &self.id
    }

    async fn publish(&self, _cancel: &CancellationToken, message: &CanonicalMessage) -> Result<()> {
        let entry = EventBusEntry {
            event_bus_name: &self.bus_name,
            source: &message.source_app,
            detail_type: &message.destination_topic,
            detail: message,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&entry)
            .send()
            .await
            .context("Failed to reach event bus")?;

        let status = response.status();
        response
            .error_for_status()
            .with_context(|| format!("Event bus rejected entry with {status}"))?;

        info!(
            bus = %self.bus_name,
            message_id = %message.message_id,
            status = status.as_u16(),
            "event_bus_entry_published"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::canonical_message;

    #[test]
    fn test_sink_id_names_bus() {
        let sink = EventBusSink::new(
            "http://localhost:4010/events",
            "default".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(sink.sink_id(), "eventbus:default");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = EventBusSink::new("not a url", "default".to_string(), Duration::from_secs(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_shape() {
        let message = canonical_message();
        let entry = EventBusEntry {
            event_bus_name: "default",
            source: &message.source_app,
            detail_type: &message.destination_topic,
            detail: &message,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["eventBusName"], "default");
        assert_eq!(json["source"], "github-relay");
        assert_eq!(json["detailType"], "github:push");
        assert_eq!(json["detail"]["messageId"], message.message_id.as_str());
    }

    #[tokio::test]
    async fn test_publish_unreachable_endpoint_fails() {
        let sink = EventBusSink::new(
            "http://127.0.0.1:1/events",
            "default".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();

        let result = sink
            .publish(&CancellationToken::new(), &canonical_message())
            .await;

        assert!(result.is_err());
    }
}
