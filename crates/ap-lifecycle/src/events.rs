// events.rs - Lifecycle events and notification dispatch.
//
// The controller emits a DraftEvent at every lifecycle outcome: a draft
// loaded, generated, superseded, refined, saved or confirmed, and each kind
// of failure. Sinks (a JSONL log, a dashboard feed, a webhook) subscribe by
// implementing NotificationSink. Dispatch is synchronous and best-effort: a
// failing sink is logged and never fails the lifecycle operation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use ap_draft::{AssessmentRunId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted by the draft lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DraftEvent {
    /// An existing active draft was loaded into the workspace.
    DraftLoaded {
        assessment_run_id: AssessmentRunId,
        draft_id: Uuid,
        action_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A fresh proposal became the active draft.
    DraftGenerated {
        assessment_run_id: AssessmentRunId,
        draft_id: Uuid,
        action_count: usize,
        requested_by: UserId,
        timestamp: DateTime<Utc>,
    },

    /// An open draft was replaced by a newer generation.
    DraftSuperseded {
        assessment_run_id: AssessmentRunId,
        draft_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    GenerationFailed {
        assessment_run_id: AssessmentRunId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The engine revised the draft in response to a user message.
    DraftRefined {
        draft_id: Uuid,
        action_count: usize,
        timestamp: DateTime<Utc>,
    },

    RefinementFailed {
        draft_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    DraftSaved {
        draft_id: Uuid,
        saved_at: DateTime<Utc>,
    },

    SaveFailed {
        draft_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Every draft action was committed and the draft is now historical.
    PlanConfirmed {
        assessment_run_id: AssessmentRunId,
        draft_id: Uuid,
        action_ids: Vec<i64>,
        confirmed_by: UserId,
        timestamp: DateTime<Utc>,
    },

    ConfirmFailed {
        draft_id: Uuid,
        created: Vec<i64>,
        pending: Vec<usize>,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl DraftEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            DraftEvent::DraftLoaded { .. } => "draft_loaded",
            DraftEvent::DraftGenerated { .. } => "draft_generated",
            DraftEvent::DraftSuperseded { .. } => "draft_superseded",
            DraftEvent::GenerationFailed { .. } => "generation_failed",
            DraftEvent::DraftRefined { .. } => "draft_refined",
            DraftEvent::RefinementFailed { .. } => "refinement_failed",
            DraftEvent::DraftSaved { .. } => "draft_saved",
            DraftEvent::SaveFailed { .. } => "save_failed",
            DraftEvent::PlanConfirmed { .. } => "plan_confirmed",
            DraftEvent::ConfirmFailed { .. } => "confirm_failed",
        }
    }

    pub fn superseded(assessment_run_id: AssessmentRunId, draft_id: Uuid) -> Self {
        DraftEvent::DraftSuperseded {
            assessment_run_id,
            draft_id,
            timestamp: Utc::now(),
        }
    }
}

/// Error reported by a notification sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for receiving lifecycle events.
pub trait NotificationSink: Send + Sync {
    /// Handle an event. Errors are logged but don't stop the lifecycle.
    fn send(&self, event: &DraftEvent) -> Result<(), SinkError>;
}

/// Logs events as JSONL to a file.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &DraftEvent) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| SinkError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| SinkError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Dispatches events to multiple sinks.
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    /// Create a new dispatcher with no sinks.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a notification sink.
    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    /// Dispatch an event to all sinks.
    pub fn dispatch(&self, event: &DraftEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!(event = event.event_type(), "notification sink error: {}", e);
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
