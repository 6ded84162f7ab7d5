//! Canonical message types published to sinks.
//!
//! Every sink receives the same [`CanonicalMessage`]; how it is framed on the
//! wire is up to the sink.

use serde::{Deserialize, Serialize};

/// Identity of this relay deployment, stamped on every message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub source_app: String,
    pub source_env: String,
}

/// Kind of a canonical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Push,
    CheckRun,
}

impl MessageKind {
    /// Topic a message of this kind is destined for.
    pub fn topic(self) -> &'static str {
        match self {
            MessageKind::Push => "github:push",
            MessageKind::CheckRun => "github:check_run",
        }
    }
}

/// Normalized, kind-tagged message ready for fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalMessage {
    /// Verbatim `X-GitHub-Delivery` value
    pub delivery_id: String,
    pub kind: MessageKind,
    pub source_app: String,
    pub source_env: String,
    pub destination_topic: String,
    /// Deterministic id; identical for redeliveries of the same event
    pub message_id: String,
    pub payload: MessagePayload,
}

/// Kind-specific message body.
///
/// Untagged on the wire; `kind` on the envelope says which one it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    // Listed first: a check run body is a superset of a push body.
    CheckRun(CheckRunMessage),
    Push(PushMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    pub after: String,
    pub repo: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRunMessage {
    pub action: String,
    pub owner: String,
    pub repo: String,
    pub check_run_name: String,
    pub check_run_id: i64,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    pub after: String,
}
