//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use tokio_util::sync::CancellationToken;

use crate::message::{
    push_message_id, CanonicalMessage, MessageKind, MessagePayload, PushMessage, SourceConfig,
};
use crate::publish::Sink;
use crate::webhook::{RawRequest, SignatureAlgorithm, SHA256_SIGNATURE_HEADER};

/// Signature header value for `body` as GitHub would compute it.
pub fn sign(algorithm: SignatureAlgorithm, body: &[u8], secret: &[u8]) -> String {
    let digest = match algorithm {
        SignatureAlgorithm::Sha256 => {
            let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret).unwrap();
            mac.update(body);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha1 => {
            let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(secret).unwrap();
            mac.update(body);
            mac.finalize().into_bytes().to_vec()
        }
    };
    format!("{}{}", algorithm.prefix(), hex::encode(digest))
}

/// A JSON delivery with event, delivery and SHA-256 signature headers.
pub fn signed_request(event: &str, delivery_id: &str, body: Vec<u8>, secret: &[u8]) -> RawRequest {
    let signature = sign(SignatureAlgorithm::Sha256, &body, secret);
    RawRequest::new(
        [
            ("X-GitHub-Event", event.to_string()),
            ("X-GitHub-Delivery", delivery_id.to_string()),
            (SHA256_SIGNATURE_HEADER, signature),
            ("Content-Type", "application/json".to_string()),
        ],
        body,
        false,
    )
}

pub fn push_json() -> serde_json::Value {
    serde_json::json!({
        "ref": "refs/heads/main",
        "before": "a".repeat(40),
        "after": "b".repeat(40),
        "created": false,
        "deleted": false,
        "repository": {
            "id": 1,
            "name": "r",
            "full_name": "o/r",
            "owner": { "name": "o", "login": "o" }
        },
        "pusher": { "name": "octocat" }
    })
}

pub fn check_run_json() -> serde_json::Value {
    serde_json::json!({
        "action": "completed",
        "check_run": {
            "id": 42,
            "name": "build",
            "status": "completed",
            "conclusion": "success",
            "check_suite": {
                "id": 7,
                "head_branch": "main",
                "before": "a".repeat(40),
                "after": "b".repeat(40)
            }
        },
        "repository": {
            "name": "r",
            "owner": { "login": "o" }
        }
    })
}

/// A `check_run` delivery shaped like GitHub's documented example payload.
pub fn github_check_run_json() -> serde_json::Value {
    serde_json::json!({
        "action": "created",
        "check_run": {
            "id": 128620228,
            "node_id": "MDg6Q2hlY2tSdW4xMjg2MjAyMjg=",
            "head_sha": "ec26c3e57ca3a959ca5aad62de7213c562f8c821",
            "external_id": "",
            "url": "https://api.github.com/repos/Codertocat/Hello-World/check-runs/128620228",
            "html_url": "https://github.com/Codertocat/Hello-World/runs/128620228",
            "details_url": "https://octocoders.io",
            "status": "queued",
            "conclusion": null,
            "started_at": "2019-05-15T15:21:12Z",
            "completed_at": null,
            "output": {
                "title": null,
                "summary": null,
                "text": null,
                "annotations_count": 0,
                "annotations_url": "https://api.github.com/repos/Codertocat/Hello-World/check-runs/128620228/annotations"
            },
            "name": "Octocoders-linter",
            "check_suite": {
                "id": 118578147,
                "node_id": "MDEwOkNoZWNrU3VpdGUxMTg1NzgxNDc=",
                "head_branch": "changes",
                "head_sha": "ec26c3e57ca3a959ca5aad62de7213c562f8c821",
                "status": "queued",
                "conclusion": null,
                "url": "https://api.github.com/repos/Codertocat/Hello-World/check-suites/118578147",
                "before": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
                "after": "ec26c3e57ca3a959ca5aad62de7213c562f8c821",
                "pull_requests": [],
                "app": { "id": 29310, "slug": "octocoders-linter", "name": "Octocoders-linter" },
                "created_at": "2019-05-15T15:20:31Z",
                "updated_at": "2019-05-15T15:20:31Z"
            },
            "app": { "id": 29310, "slug": "octocoders-linter", "name": "Octocoders-linter" },
            "pull_requests": []
        },
        "repository": {
            "id": 186853002,
            "node_id": "MDEwOlJlcG9zaXRvcnkxODY4NTMwMDI=",
            "name": "Hello-World",
            "full_name": "Codertocat/Hello-World",
            "private": false,
            "owner": {
                "login": "Codertocat",
                "id": 21031067,
                "type": "User",
                "site_admin": false
            },
            "default_branch": "master"
        },
        "sender": {
            "login": "Codertocat",
            "id": 21031067,
            "type": "User"
        }
    })
}

/// Remove the value at `path`; a missing parent is a no-op.
pub fn remove_path(json: &mut serde_json::Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = json;
    for key in parents {
        match current.get_mut(*key) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(object) = current.as_object_mut() {
        object.remove(*last);
    }
}

pub fn source_config() -> SourceConfig {
    SourceConfig {
        source_app: "github-relay".to_string(),
        source_env: "test".to_string(),
    }
}

pub fn canonical_message() -> CanonicalMessage {
    let after = "b".repeat(40);
    CanonicalMessage {
        delivery_id: "d-1".to_string(),
        kind: MessageKind::Push,
        source_app: "github-relay".to_string(),
        source_env: "test".to_string(),
        destination_topic: MessageKind::Push.topic().to_string(),
        message_id: push_message_id("refs/heads/main", &after),
        payload: MessagePayload::Push(PushMessage {
            git_ref: "refs/heads/main".to_string(),
            before: "a".repeat(40),
            after,
            repo: "r".to_string(),
            owner: "o".to_string(),
        }),
    }
}

static CALL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Hang,
}

/// Sink that records what it was asked to publish.
pub struct RecordingSink {
    id: String,
    behaviour: Behaviour,
    calls: AtomicUsize,
    last_call: AtomicU64,
    published: Mutex<Vec<CanonicalMessage>>,
}

impl RecordingSink {
    fn with(id: &str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            behaviour,
            calls: AtomicUsize::new(0),
            last_call: AtomicU64::new(0),
            published: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(id: &str) -> Arc<Self> {
        Self::with(id, Behaviour::Succeed)
    }

    pub fn failing(id: &str) -> Arc<Self> {
        Self::with(id, Behaviour::Fail)
    }

    /// Never completes on its own.
    pub fn hanging(id: &str) -> Arc<Self> {
        Self::with(id, Behaviour::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Global sequence number of the most recent call; 0 if never called.
    pub fn last_call(&self) -> u64 {
        self.last_call.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<CanonicalMessage> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn sink_id(&self) -> &str {
        &self.id
    }

    async fn publish(
        &self,
        _cancel: &CancellationToken,
        message: &CanonicalMessage,
    ) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_call
            .store(CALL_SEQUENCE.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);

        match self.behaviour {
            Behaviour::Succeed => {
                self.published.lock().unwrap().push(message.clone());
                Ok(())
            }
            Behaviour::Fail => Err(anyhow::anyhow!("{} is unavailable", self.id)),
            Behaviour::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}
