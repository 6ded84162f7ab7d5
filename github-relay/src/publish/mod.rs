//! Delivery of canonical messages to downstream sinks.
//!
//! A [`Sink`] is anything that can accept a [`CanonicalMessage`]: an AMQP
//! topic exchange, an HTTP event bus. The relay holds an ordered list of
//! sinks and [`fanout::publish`] delivers to them one after another.

pub mod amqp;
pub mod event_bus;
pub mod fanout;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::message::CanonicalMessage;

pub use amqp::AmqpSink;
pub use event_bus::EventBusSink;
pub use fanout::{publish, PublishReport, PublishResult};

/// A downstream message destination.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stable identifier used in logs and response bodies.
    fn sink_id(&self) -> &str;

    /// Deliver one message.
    ///
    /// `cancel` is the enclosing request's token; implementations may
    /// observe it, and the fan-out abandons the call once it fires.
    async fn publish(&self, cancel: &CancellationToken, message: &CanonicalMessage)
        -> Result<()>;

    /// Release connections on shutdown.
    async fn close(&self) {}
}

/// Build the sinks enabled in `config`, topic exchange first.
pub fn sinks_from_config(config: &Config) -> Result<Vec<Arc<dyn Sink>>> {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();

    if let Some(url) = &config.amqp_url {
        sinks.push(Arc::new(AmqpSink::new(url.clone(), config.amqp_exchange.clone())));
    }

    if let Some(url) = &config.event_bus_url {
        sinks.push(Arc::new(EventBusSink::new(
            url,
            config.event_bus_name.clone(),
            config.publish_timeout(),
        )?));
    }

    if sinks.is_empty() {
        warn!("no_sinks_configured");
    }

    Ok(sinks)
}
