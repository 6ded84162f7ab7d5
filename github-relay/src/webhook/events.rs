//! Decoding of GitHub webhook payloads into typed envelopes.
//!
//! The payload structs mirror GitHub's JSON with every field optional, so a
//! payload missing a field still decodes and validation can report exactly
//! which path was absent. Fields the relay does not forward are not
//! declared and are dropped by serde.

use serde::Deserialize;

use crate::error::WebhookError;

/// Event kind string for push events.
pub const PUSH_EVENT: &str = "push";

/// Event kind string for check run events.
pub const CHECK_RUN_EVENT: &str = "check_run";

/// A decoded webhook, tagged by the `X-GitHub-Event` kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EventEnvelope {
    Push(PushPayload),
    CheckRun(CheckRunPayload),
    /// Any other kind; carries the kind name as sent.
    Unsupported(String),
}

impl EventEnvelope {
    /// Kind name as it appears in `X-GitHub-Event`.
    pub fn kind_name(&self) -> &str {
        match self {
            EventEnvelope::Push(_) => PUSH_EVENT,
            EventEnvelope::CheckRun(_) => CHECK_RUN_EVENT,
            EventEnvelope::Unsupported(kind) => kind,
        }
    }
}

// ============================================================================
// push
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    #[serde(rename = "repository")]
    pub repo: Option<PushRepository>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushRepository {
    pub name: Option<String>,
    pub owner: Option<PushOwner>,
}

/// Push payloads describe the owner with `name` (and `login`), unlike the
/// rest of the API which only guarantees `login`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushOwner {
    pub name: Option<String>,
}

// ============================================================================
// check_run
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckRunPayload {
    pub action: Option<String>,
    #[serde(rename = "repository")]
    pub repo: Option<CheckRunRepository>,
    pub check_run: Option<CheckRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckRunRepository {
    pub name: Option<String>,
    pub owner: Option<CheckRunOwner>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckRunOwner {
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckRun {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub check_suite: Option<CheckSuite>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckSuite {
    pub head_branch: Option<String>,
    #[serde(rename = "before")]
    pub before_sha: Option<String>,
    #[serde(rename = "after")]
    pub after_sha: Option<String>,
}

/// Decode `payload` according to `event_type`.
///
/// Kinds other than `push` and `check_run` are not parsed at all and come
/// back as [`EventEnvelope::Unsupported`].
pub fn decode(event_type: &str, payload: &[u8]) -> Result<EventEnvelope, WebhookError> {
    match event_type {
        PUSH_EVENT => serde_json::from_slice(payload)
            .map(EventEnvelope::Push)
            .map_err(|source| WebhookError::Parse {
                kind: PUSH_EVENT,
                source,
            }),
        CHECK_RUN_EVENT => serde_json::from_slice(payload)
            .map(EventEnvelope::CheckRun)
            .map_err(|source| WebhookError::Parse {
                kind: CHECK_RUN_EVENT,
                source,
            }),
        other => Ok(EventEnvelope::Unsupported(other.to_string())),
    }
}
