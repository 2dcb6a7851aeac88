// store.rs - Draft persistence contract and the JSON-file implementation.
//
// Each draft is stored as `<store_dir>/<draft_id>.json`. Writes that check
// status before changing content (save, status changes, supersede) run under
// a store-wide lock so a save can never land on a draft that a concurrent
// generation just superseded.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::action::DraftAction;
use crate::conversation::ConversationEntry;
use crate::draft::{Draft, DraftStatus};
use crate::error::DraftError;
use crate::AssessmentRunId;

/// Persistence contract for drafts.
///
/// Implementations may be local (files) or remote (a relational store behind
/// HTTP). All writes to content must refuse drafts that are not active.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Most recently created draft for the run that is not superseded.
    ///
    /// May return a confirmed draft; callers decide what a terminal draft means.
    async fn latest_for_run(&self, run_id: AssessmentRunId) -> Result<Option<Draft>, DraftError>;

    /// Fetch a draft by id.
    async fn get(&self, draft_id: Uuid) -> Result<Option<Draft>, DraftError>;

    /// Create or replace a draft record.
    async fn insert(&self, draft: &Draft) -> Result<(), DraftError>;

    /// Persist actions and conversation for an active draft.
    ///
    /// Returns the new saved-at timestamp. Fails with
    /// [`DraftError::NotWritable`] if the draft is confirmed or superseded.
    async fn save_draft(
        &self,
        draft_id: Uuid,
        actions: &[DraftAction],
        conversation: &[ConversationEntry],
    ) -> Result<DateTime<Utc>, DraftError>;

    /// Move a draft to a new status, validating the transition.
    async fn set_status(&self, draft_id: Uuid, status: DraftStatus) -> Result<Draft, DraftError>;

    /// Mark every open draft for the run as superseded, except `keep`.
    ///
    /// Returns the ids that were superseded.
    async fn supersede_open(
        &self,
        run_id: AssessmentRunId,
        keep: Option<Uuid>,
    ) -> Result<Vec<Uuid>, DraftError>;
}

/// File-backed draft store: one JSON file per draft.
pub struct JsonDraftStore {
    store_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDraftStore {
    /// Create a new store backed by the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, DraftError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| DraftError::IoError {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            store_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// List all drafts for a run, newest first.
    pub fn list_for_run(&self, run_id: AssessmentRunId) -> Result<Vec<Draft>, DraftError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|d| d.assessment_run_id == run_id)
            .collect())
    }

    /// List all drafts, sorted by creation time (newest first).
    pub fn list(&self) -> Result<Vec<Draft>, DraftError> {
        let mut drafts = Vec::new();

        let entries = fs::read_dir(&self.store_dir).map_err(|source| DraftError::IoError {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| DraftError::IoError {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                let json = fs::read_to_string(&path).map_err(|source| DraftError::IoError {
                    path: path.display().to_string(),
                    source,
                })?;
                match serde_json::from_str::<Draft>(&json) {
                    Ok(draft) => drafts.push(draft),
                    Err(e) => tracing::warn!("skipping unreadable draft {}: {}", path.display(), e),
                }
            }
        }

        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(drafts)
    }

    fn read(&self, draft_id: Uuid) -> Result<Option<Draft>, DraftError> {
        let path = self.draft_file(draft_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| DraftError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn write(&self, draft: &Draft) -> Result<(), DraftError> {
        let path = self.draft_file(draft.draft_id);
        let json = serde_json::to_string_pretty(draft)?;
        fs::write(&path, json).map_err(|source| DraftError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(draft_id = %draft.draft_id, status = %draft.status, "draft written");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Path to the JSON file for a given draft.
    fn draft_file(&self, draft_id: Uuid) -> PathBuf {
        self.store_dir.join(format!("{}.json", draft_id))
    }
}

#[async_trait]
impl DraftStore for JsonDraftStore {
    async fn latest_for_run(&self, run_id: AssessmentRunId) -> Result<Option<Draft>, DraftError> {
        Ok(self
            .list_for_run(run_id)?
            .into_iter()
            .find(|d| d.status != DraftStatus::Superseded))
    }

    async fn get(&self, draft_id: Uuid) -> Result<Option<Draft>, DraftError> {
        self.read(draft_id)
    }

    async fn insert(&self, draft: &Draft) -> Result<(), DraftError> {
        let _guard = self.lock();
        self.write(draft)
    }

    async fn save_draft(
        &self,
        draft_id: Uuid,
        actions: &[DraftAction],
        conversation: &[ConversationEntry],
    ) -> Result<DateTime<Utc>, DraftError> {
        let _guard = self.lock();
        let mut draft = self.read(draft_id)?.ok_or(DraftError::NotFound(draft_id))?;
        let saved_at = draft.write_content(actions, conversation)?;
        self.write(&draft)?;
        Ok(saved_at)
    }

    async fn set_status(&self, draft_id: Uuid, status: DraftStatus) -> Result<Draft, DraftError> {
        let _guard = self.lock();
        let mut draft = self.read(draft_id)?.ok_or(DraftError::NotFound(draft_id))?;
        draft.transition(status)?;
        self.write(&draft)?;
        Ok(draft)
    }

    async fn supersede_open(
        &self,
        run_id: AssessmentRunId,
        keep: Option<Uuid>,
    ) -> Result<Vec<Uuid>, DraftError> {
        let _guard = self.lock();
        let mut superseded = Vec::new();
        for mut draft in self.list_for_run(run_id)? {
            if Some(draft.draft_id) == keep || !draft.status.is_open() {
                continue;
            }
            draft.transition(DraftStatus::Superseded)?;
            self.write(&draft)?;
            superseded.push(draft.draft_id);
        }
        Ok(superseded)
    }
}
