// error.rs - Error types for draft persistence.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while reading or writing drafts.
#[derive(Debug, Error)]
pub enum DraftError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize draft data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The requested draft was not found.
    #[error("draft not found: {0}")]
    NotFound(Uuid),

    /// A save targeted a draft that no longer accepts writes
    /// (confirmed or superseded).
    #[error("draft {draft_id} is {status} and cannot be written")]
    NotWritable { draft_id: Uuid, status: String },

    /// Invalid status transition.
    #[error("invalid transition from {from} to {to} for draft {draft_id}")]
    InvalidTransition {
        draft_id: Uuid,
        from: String,
        to: String,
    },

    /// A remote store backend reported a failure.
    #[error("draft store backend error: {0}")]
    Backend(String),
}
