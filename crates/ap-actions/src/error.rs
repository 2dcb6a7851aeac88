// error.rs - Error types for the action store.

use thiserror::Error;

/// Errors that can occur while creating or reading confirmed actions.
#[derive(Debug, Error)]
pub enum ActionStoreError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize action data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The action fields were rejected.
    #[error("invalid action: {0}")]
    Invalid(String),

    /// A remote store backend reported a failure.
    #[error("action store backend error: {0}")]
    Backend(String),
}
