//! Web server module for receiving GitHub webhooks.
//!
//! Routes:
//! - `GET /health`
//! - `POST /webhook`: GitHub delivery, headers and body as sent
//! - `POST /gateway`: API-gateway style JSON envelope around a delivery

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    gateway_webhook, github_webhook, health, AppState, GatewayRequest, GatewayResponse,
    HealthResponse,
};

/// Largest webhook payload GitHub delivers.
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Gateway envelopes may carry the payload base64 encoded, plus headers.
const MAX_GATEWAY_BYTES: usize = MAX_PAYLOAD_BYTES / 3 * 4 + 64 * 1024;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/webhook",
            post(github_webhook).layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES)),
        )
        .route(
            "/gateway",
            post(gateway_webhook).layer(DefaultBodyLimit::max(MAX_GATEWAY_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
