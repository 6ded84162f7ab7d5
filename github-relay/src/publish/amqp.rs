//! AMQP topic exchange sink.
//!
//! Publishes each message to a durable topic exchange with the message's
//! destination topic as routing key. The connection is established lazily
//! and re-established when the channel drops.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions},
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Sink;
use crate::message::CanonicalMessage;

/// Sink publishing to an AMQP topic exchange.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct AmqpSink {
    inner: Arc<AmqpSinkInner>,
}

struct AmqpSinkInner {
    id: String,
    url: String,
    exchange: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl AmqpSink {
    pub fn new(url: String, exchange: String) -> Self {
        Self {
            inner: Arc::new(AmqpSinkInner {
                id: format!("amqp:{exchange}"),
                url,
                exchange,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Another task may have reconnected while we waited for the lock.
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!(sink_id = %self.inner.id, "amqp_sink_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to AMQP broker")?;

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.confirm_select(ConfirmSelectOptions::default())
            .await
            .context("Failed to enable publisher confirms")?;

        ch.exchange_declare(
            &self.inner.exchange,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare exchange")?;

        info!(
            sink_id = %self.inner.id,
            exchange = %self.inner.exchange,
            "amqp_sink_connected"
        );

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Close the connection gracefully.
    async fn shutdown(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_connection_close_error");
            }
        }

        info!(sink_id = %self.inner.id, "amqp_sink_closed");
    }
}

#[async_trait]
impl Sink for AmqpSink {
    fn sink_id(&self) -> &str {
        &self.inner.id
    }

    async fn publish(&self, _cancel: &CancellationToken, message: &CanonicalMessage) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let body = serde_json::to_vec(message).context("Failed to serialize message")?;

        let confirmation = channel
            .basic_publish(
                &self.inner.exchange,
                &message.destination_topic,
                BasicPublishOptions {
                    mandatory: true,
                    ..Default::default()
                },
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message.message_id.clone().into())
                    .with_app_id(message.source_app.clone().into()),
            )
            .await
            .context("Failed to publish to exchange")?
            .await
            .context("Failed to confirm publish")?;

        check_confirmation(confirmation)
            .with_context(|| format!("Routing key {}", message.destination_topic))?;

        info!(
            exchange = %self.inner.exchange,
            routing_key = %message.destination_topic,
            message_id = %message.message_id,
            body_length = body.len(),
            "amqp_message_published"
        );

        Ok(())
    }

    async fn close(&self) {
        self.shutdown().await;
    }
}

/// Only a plain ack counts as delivered. A returned message means no queue
/// is bound for the routing key.
fn check_confirmation(confirmation: Confirmation) -> Result<()> {
    match confirmation {
        Confirmation::Ack(None) => Ok(()),
        Confirmation::Ack(Some(returned)) => bail!(
            "Broker returned message: {} {}",
            returned.reply_code,
            returned.reply_text.as_str()
        ),
        Confirmation::Nack(_) => bail!("Broker rejected message"),
        Confirmation::NotRequested => bail!("Channel is not in confirm mode"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::canonical_message;

    #[test]
    fn test_sink_id_names_exchange() {
        let sink = AmqpSink::new("amqp://localhost:5672".to_string(), "github".to_string());
        assert_eq!(sink.sink_id(), "amqp:github");
        assert!(Arc::strong_count(&sink.inner) == 1);
    }

    #[test]
    fn test_only_plain_ack_is_delivered() {
        assert!(check_confirmation(Confirmation::Ack(None)).is_ok());

        let err = check_confirmation(Confirmation::Nack(None)).unwrap_err();
        assert_eq!(err.to_string(), "Broker rejected message");

        let err = check_confirmation(Confirmation::NotRequested).unwrap_err();
        assert_eq!(err.to_string(), "Channel is not in confirm mode");
    }

    #[tokio::test]
    async fn test_publish_unreachable_broker_fails() {
        // Port 1 is never an AMQP broker.
        let sink = AmqpSink::new("amqp://127.0.0.1:1/%2f".to_string(), "github".to_string());

        let result = sink
            .publish(&CancellationToken::new(), &canonical_message())
            .await;

        assert!(result.is_err());
    }
}
