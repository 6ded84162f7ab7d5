//! Configuration module for environment variable parsing.

use std::env;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::message::SourceConfig;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret GitHub signs webhooks with
    pub webhook_secret: Option<String>,

    /// Application name stamped on published messages
    pub source_app: String,

    /// Environment name stamped on published messages
    pub source_env: String,

    /// AMQP broker URL; enables the topic exchange sink
    pub amqp_url: Option<String>,

    /// Topic exchange to publish to
    pub amqp_exchange: String,

    /// Event bus ingest URL; enables the event bus sink
    pub event_bus_url: Option<String>,

    /// Event bus name
    pub event_bus_name: String,

    /// Deadline for publishing one webhook to all sinks, in milliseconds
    pub publish_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            webhook_secret: env::var("GITHUB_WEBHOOK_SECRET").ok(),

            source_app: env::var("SOURCE_APP").unwrap_or_else(|_| "github-relay".to_string()),

            source_env: env::var("SOURCE_ENV").unwrap_or_else(|_| "local".to_string()),

            amqp_url: non_empty("AMQP_URL"),

            amqp_exchange: env::var("AMQP_EXCHANGE").unwrap_or_else(|_| "github".to_string()),

            event_bus_url: non_empty("EVENT_BUS_URL"),

            event_bus_name: env::var("EVENT_BUS_NAME").unwrap_or_else(|_| "default".to_string()),

            publish_timeout_ms: env::var("PUBLISH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        }
    }

    /// The webhook secret, which must be set and non-blank.
    pub fn require_secret(&self) -> Result<&str> {
        match self.webhook_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ => bail!("GITHUB_WEBHOOK_SECRET is required"),
        }
    }

    pub fn source(&self) -> SourceConfig {
        SourceConfig {
            source_app: self.source_app.clone(),
            source_env: self.source_env.clone(),
        }
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

// Keeps the secret out of `?config` log fields.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("webhook_secret_set", &self.webhook_secret.is_some())
            .field("source_app", &self.source_app)
            .field("source_env", &self.source_env)
            .field("amqp_configured", &self.amqp_url.is_some())
            .field("amqp_exchange", &self.amqp_exchange)
            .field("event_bus_url", &self.event_bus_url)
            .field("event_bus_name", &self.event_bus_name)
            .field("publish_timeout_ms", &self.publish_timeout_ms)
            .finish()
    }
}

/// Read an environment variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
