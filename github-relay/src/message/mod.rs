//! Canonical messages and the mapping from validated webhook events.
//!
//! ```text
//! ValidEvent → to_canonical() → CanonicalMessage | Skip
//! ```

pub mod mapper;
pub mod types;

pub use mapper::{
    check_run_message_id, push_message_id, to_canonical, Mapped, DELETION_SKIP_REASON,
};
pub use types::{
    CanonicalMessage, CheckRunMessage, MessageKind, MessagePayload, PushMessage, SourceConfig,
};
