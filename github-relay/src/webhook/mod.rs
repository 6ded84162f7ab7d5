//! Inbound GitHub webhook processing.
//!
//! ```text
//! RawRequest → verify_request() → decode() → validate() → ValidEvent
//! ```

pub mod events;
pub mod request;
pub mod signature;
pub mod validate;

pub use events::{decode, EventEnvelope, CHECK_RUN_EVENT, PUSH_EVENT};
pub use request::{
    RawRequest, DELIVERY_HEADER, EVENT_HEADER, SHA1_SIGNATURE_HEADER, SHA256_SIGNATURE_HEADER,
};
pub use signature::{verify, verify_request, SignatureAlgorithm, VerifiedPayload};
pub use validate::{validate, CheckRunEvent, PushEvent, ValidEvent, EMPTY_COMMIT};
