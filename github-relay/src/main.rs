//! GitHub Relay web server.
//!
//! Receives GitHub webhooks, verifies their signatures, and republishes push
//! and check run events to the configured sinks.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use github_relay::{sinks_from_config, web, AppState, Config, WebhookHandler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    let secret = config.require_secret()?.to_string();
    info!(
        port = config.port,
        source_app = %config.source_app,
        source_env = %config.source_env,
        amqp_configured = config.amqp_url.is_some(),
        event_bus_configured = config.event_bus_url.is_some(),
        publish_timeout_ms = config.publish_timeout_ms,
        "config_loaded"
    );

    let sinks = sinks_from_config(&config).context("Failed to configure sinks")?;
    info!(
        sinks = ?sinks.iter().map(|s| s.sink_id()).collect::<Vec<_>>(),
        "sinks_configured"
    );

    let handler = WebhookHandler::new(secret, config.source(), sinks.clone());
    let app = web::router(AppState::new(handler, config.publish_timeout()));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    for sink in &sinks {
        sink.close().await;
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
