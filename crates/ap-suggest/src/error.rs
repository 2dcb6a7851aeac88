// error.rs - Error types for suggestion engine calls.

use thiserror::Error;

/// Errors from a suggestion engine call.
///
/// The lifecycle controller treats every variant the same way (the
/// generation or refinement failed); the variants exist for logs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No endpoint is configured; nothing was sent.
    #[error("suggestion engine not configured: {0}")]
    NotConfigured(String),

    /// The request did not complete in time.
    #[error("suggestion engine timed out")]
    Timeout,

    /// Connection or protocol failure.
    #[error("suggestion engine transport error: {0}")]
    Transport(String),

    /// The engine answered with a non-success status.
    #[error("suggestion engine error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The engine answered, but not with something usable.
    #[error("invalid suggestion engine response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::Timeout
        } else if e.is_decode() {
            EngineError::InvalidResponse(e.to_string())
        } else {
            EngineError::Transport(e.to_string())
        }
    }
}
