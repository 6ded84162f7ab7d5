//! HTTP endpoint handlers.
//!
//! Two ways in, one pipeline: `/webhook` takes GitHub's request as-is,
//! `/gateway` takes an API-gateway style JSON envelope (as delivered to a
//! serverless function) whose body may be base64 encoded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::handler::{WebhookHandler, WebhookResponse};
use crate::webhook::RawRequest;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<WebhookHandler>,
    pub publish_timeout: Duration,
}

impl AppState {
    pub fn new(handler: WebhookHandler, publish_timeout: Duration) -> Self {
        Self {
            handler: Arc::new(handler),
            publish_timeout,
        }
    }

    /// Run the pipeline under a deadline.
    ///
    /// The token is cancelled when the deadline passes, which fails any sink
    /// call still in flight.
    async fn dispatch(&self, request: RawRequest) -> WebhookResponse {
        let cancel = CancellationToken::new();

        let deadline = {
            let cancel = cancel.clone();
            let timeout = self.publish_timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!(timeout_ms = timeout.as_millis() as u64, "webhook_deadline_exceeded");
                cancel.cancel();
            })
        };

        let response = self.handler.handle(&cancel, &request).await;
        deadline.abort();
        response
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// GitHub webhook endpoint.
///
/// Responds with the pipeline's status and a plain-text body.
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let response = state
        .dispatch(RawRequest::from_http(&headers, body.to_vec()))
        .await;
    (response.status, response.body)
}

// =============================================================================
// Gateway Envelope
// =============================================================================

/// API-gateway style request envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// API-gateway style response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub body: String,
}

/// Gateway envelope endpoint.
///
/// Always answers HTTP 200; the webhook's status travels in `statusCode`.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    Json(envelope): Json<GatewayRequest>,
) -> Json<GatewayResponse> {
    let request = RawRequest::new(envelope.headers, envelope.body, envelope.is_base64_encoded);
    let response = state.dispatch(request).await;

    Json(GatewayResponse {
        status_code: response.status.as_u16(),
        body: response.body,
    })
}
