//! Structural validation of decoded events.
//!
//! Each event kind has an ordered table of `(field path, presence check)`.
//! Checks run top to bottom and the first failing path is reported, so the
//! error for a given payload is deterministic. Empty strings count as
//! missing.

use crate::error::WebhookError;

use super::events::{CheckRunPayload, EventEnvelope, PushPayload, CHECK_RUN_EVENT, PUSH_EVENT};

/// All-zero SHA GitHub sends as `after` when a ref is deleted.
pub const EMPTY_COMMIT: &str = "0000000000000000000000000000000000000000";

/// A push with every forwarded field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub git_ref: String,
    pub before: String,
    pub after: String,
    pub repo_name: String,
    pub repo_owner: String,
}

impl PushEvent {
    /// Whether this push deleted the ref.
    pub fn is_deletion(&self) -> bool {
        self.after == EMPTY_COMMIT
    }
}

/// A check run with every forwarded field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunEvent {
    pub action: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub check_run_name: String,
    pub check_run_id: i64,
    pub head_branch: String,
    pub before: String,
    pub after: String,
}

impl CheckRunEvent {
    pub fn git_ref(&self) -> String {
        format!("refs/heads/{}", self.head_branch)
    }
}

/// An event that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidEvent {
    Push(PushEvent),
    CheckRun(CheckRunEvent),
}

type Check<T> = (&'static str, fn(&T) -> bool);

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

const PUSH_FIELDS: &[Check<PushPayload>] = &[
    ("ref", |p| present(&p.git_ref)),
    ("repo", |p| p.repo.is_some()),
    ("repo.owner", |p| {
        p.repo.as_ref().is_some_and(|r| r.owner.is_some())
    }),
    ("repo.owner.name", |p| {
        p.repo
            .as_ref()
            .and_then(|r| r.owner.as_ref())
            .is_some_and(|o| present(&o.name))
    }),
    ("repo.name", |p| p.repo.as_ref().is_some_and(|r| present(&r.name))),
    ("after", |p| present(&p.after)),
    ("before", |p| present(&p.before)),
];

const CHECK_RUN_FIELDS: &[Check<CheckRunPayload>] = &[
    ("action", |p| present(&p.action)),
    ("repo", |p| p.repo.is_some()),
    ("repo.owner", |p| {
        p.repo.as_ref().is_some_and(|r| r.owner.is_some())
    }),
    ("repo.owner.login", |p| {
        p.repo
            .as_ref()
            .and_then(|r| r.owner.as_ref())
            .is_some_and(|o| present(&o.login))
    }),
    ("repo.name", |p| p.repo.as_ref().is_some_and(|r| present(&r.name))),
    ("check_run", |p| p.check_run.is_some()),
    ("check_run.name", |p| {
        p.check_run.as_ref().is_some_and(|c| present(&c.name))
    }),
    ("check_run.id", |p| {
        p.check_run.as_ref().is_some_and(|c| c.id.is_some())
    }),
    ("check_run.check_suite", |p| {
        p.check_run
            .as_ref()
            .is_some_and(|c| c.check_suite.is_some())
    }),
    ("check_run.check_suite.head_branch", |p| {
        suite(p).is_some_and(|s| present(&s.head_branch))
    }),
    ("check_run.check_suite.before_sha", |p| {
        suite(p).is_some_and(|s| present(&s.before_sha))
    }),
    ("check_run.check_suite.after_sha", |p| {
        suite(p).is_some_and(|s| present(&s.after_sha))
    }),
];

fn suite(p: &CheckRunPayload) -> Option<&super::events::CheckSuite> {
    p.check_run.as_ref()?.check_suite.as_ref()
}

fn first_missing<T>(kind: &'static str, payload: &T, checks: &[Check<T>]) -> Result<(), WebhookError> {
    match checks.iter().find(|(_, check)| !check(payload)) {
        Some((field, _)) => Err(WebhookError::Validation {
            kind,
            field: *field,
        }),
        None => Ok(()),
    }
}

/// Clone a field the table already vouched for.
fn take(kind: &'static str, field: &'static str, value: Option<&String>) -> Result<String, WebhookError> {
    value
        .cloned()
        .ok_or(WebhookError::Validation { kind, field })
}

/// Validate a decoded envelope.
///
/// Unsupported kinds are rejected outright with
/// [`WebhookError::UnsupportedEvent`].
pub fn validate(envelope: &EventEnvelope) -> Result<ValidEvent, WebhookError> {
    match envelope {
        EventEnvelope::Push(payload) => validate_push(payload).map(ValidEvent::Push),
        EventEnvelope::CheckRun(payload) => validate_check_run(payload).map(ValidEvent::CheckRun),
        EventEnvelope::Unsupported(kind) => Err(WebhookError::UnsupportedEvent(kind.clone())),
    }
}

fn validate_push(payload: &PushPayload) -> Result<PushEvent, WebhookError> {
    const KIND: &str = PUSH_EVENT;
    first_missing(KIND, payload, PUSH_FIELDS)?;

    let repo = payload.repo.as_ref();
    let owner = repo.and_then(|r| r.owner.as_ref());

    Ok(PushEvent {
        git_ref: take(KIND, "ref", payload.git_ref.as_ref())?,
        before: take(KIND, "before", payload.before.as_ref())?,
        after: take(KIND, "after", payload.after.as_ref())?,
        repo_name: take(KIND, "repo.name", repo.and_then(|r| r.name.as_ref()))?,
        repo_owner: take(KIND, "repo.owner.name", owner.and_then(|o| o.name.as_ref()))?,
    })
}

fn validate_check_run(payload: &CheckRunPayload) -> Result<CheckRunEvent, WebhookError> {
    const KIND: &str = CHECK_RUN_EVENT;
    first_missing(KIND, payload, CHECK_RUN_FIELDS)?;

    let repo = payload.repo.as_ref();
    let run = payload.check_run.as_ref();
    let suite = suite(payload);

    Ok(CheckRunEvent {
        action: take(KIND, "action", payload.action.as_ref())?,
        repo_owner: take(
            KIND,
            "repo.owner.login",
            repo.and_then(|r| r.owner.as_ref()).and_then(|o| o.login.as_ref()),
        )?,
        repo_name: take(KIND, "repo.name", repo.and_then(|r| r.name.as_ref()))?,
        check_run_name: take(KIND, "check_run.name", run.and_then(|c| c.name.as_ref()))?,
        check_run_id: run.and_then(|c| c.id).ok_or(WebhookError::Validation {
            kind: KIND,
            field: "check_run.id",
        })?,
        head_branch: take(
            KIND,
            "check_run.check_suite.head_branch",
            suite.and_then(|s| s.head_branch.as_ref()),
        )?,
        before: take(
            KIND,
            "check_run.check_suite.before_sha",
            suite.and_then(|s| s.before_sha.as_ref()),
        )?,
        after: take(
            KIND,
            "check_run.check_suite.after_sha",
            suite.and_then(|s| s.after_sha.as_ref()),
        )?,
    })
}
