//! Mapping of validated events to canonical messages.

use tracing::info;
use uuid::Uuid;

use super::types::{
    CanonicalMessage, CheckRunMessage, MessageKind, MessagePayload, PushMessage, SourceConfig,
};
use crate::webhook::{CheckRunEvent, PushEvent, ValidEvent};

/// UUIDv5 namespace for push message ids.
const PUSH_NAMESPACE: Uuid = Uuid::from_u128(0xB15B01C2_0228_49E7_8432_EA17E5A1B69C);

/// UUIDv5 namespace for check run message ids.
const CHECK_RUN_NAMESPACE: Uuid = Uuid::from_u128(0x6F0C4A53_2B1E_4D7A_9C3E_8A5B1D2E7F40);

/// Response body for acknowledged ref deletions.
pub const DELETION_SKIP_REASON: &str = "push event has empty after commit - no event created";

/// Outcome of mapping an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapped {
    Message(CanonicalMessage),
    /// Acknowledge without publishing; carries the reason.
    Skip(&'static str),
}

/// Message id for a push: stable across redeliveries of the same ref update.
pub fn push_message_id(git_ref: &str, after: &str) -> String {
    Uuid::new_v5(&PUSH_NAMESPACE, format!("{git_ref}/{after}").as_bytes()).to_string()
}

/// Message id for a check run: one per run, action and head commit.
pub fn check_run_message_id(check_run_id: i64, action: &str, after: &str) -> String {
    Uuid::new_v5(
        &CHECK_RUN_NAMESPACE,
        format!("{check_run_id}/{action}/{after}").as_bytes(),
    )
    .to_string()
}

/// Convert a validated event into the message to publish.
///
/// Ref deletions (push with an all-zero `after`) map to [`Mapped::Skip`].
pub fn to_canonical(event: &ValidEvent, delivery_id: &str, source: &SourceConfig) -> Mapped {
    let (kind, message_id, payload) = match event {
        ValidEvent::Push(push) if push.is_deletion() => {
            info!(
                delivery_id = %delivery_id,
                git_ref = %push.git_ref,
                "push_deletion_skipped"
            );
            return Mapped::Skip(DELETION_SKIP_REASON);
        }
        ValidEvent::Push(push) => (
            MessageKind::Push,
            push_message_id(&push.git_ref, &push.after),
            MessagePayload::Push(push_payload(push)),
        ),
        ValidEvent::CheckRun(run) => (
            MessageKind::CheckRun,
            check_run_message_id(run.check_run_id, &run.action, &run.after),
            MessagePayload::CheckRun(check_run_payload(run)),
        ),
    };

    Mapped::Message(CanonicalMessage {
        delivery_id: delivery_id.to_string(),
        kind,
        source_app: source.source_app.clone(),
        source_env: source.source_env.clone(),
        destination_topic: kind.topic().to_string(),
        message_id,
        payload,
    })
}

fn push_payload(push: &PushEvent) -> PushMessage {
    PushMessage {
        git_ref: push.git_ref.clone(),
        before: push.before.clone(),
        after: push.after.clone(),
        repo: push.repo_name.clone(),
        owner: push.repo_owner.clone(),
    }
}

fn check_run_payload(run: &CheckRunEvent) -> CheckRunMessage {
    CheckRunMessage {
        action: run.action.clone(),
        owner: run.repo_owner.clone(),
        repo: run.repo_name.clone(),
        check_run_name: run.check_run_name.clone(),
        check_run_id: run.check_run_id,
        git_ref: run.git_ref(),
        before: run.before.clone(),
        after: run.after.clone(),
    }
}
