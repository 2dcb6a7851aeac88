// store.rs - Action persistence contract and the JSON-file implementation.
//
// Each action is stored as `<store_dir>/<id>.json`. Ids are sequential and
// allocated under a store-wide lock, so concurrent creates never collide.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ap_draft::ProjectId;
use async_trait::async_trait;

use crate::action::{ConfirmedAction, NewAction};
use crate::error::ActionStoreError;

/// Persistence contract for confirmed actions.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Create one action and return it with its assigned id.
    async fn create_action(&self, fields: NewAction) -> Result<ConfirmedAction, ActionStoreError>;

    /// Fetch an action by id.
    async fn get(&self, id: i64) -> Result<Option<ConfirmedAction>, ActionStoreError>;

    /// All actions for a project, newest first.
    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ConfirmedAction>, ActionStoreError>;
}

/// File-backed action store.
pub struct JsonActionStore {
    store_dir: PathBuf,
    next_id: Mutex<Option<i64>>,
}

impl JsonActionStore {
    /// Create a new store backed by the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, ActionStoreError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| ActionStoreError::IoError {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            store_dir,
            next_id: Mutex::new(None),
        })
    }

    /// List every stored action, newest first.
    pub fn list(&self) -> Result<Vec<ConfirmedAction>, ActionStoreError> {
        let mut actions = Vec::new();

        let entries = fs::read_dir(&self.store_dir).map_err(|source| ActionStoreError::IoError {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| ActionStoreError::IoError {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                let json = fs::read_to_string(&path).map_err(|source| ActionStoreError::IoError {
                    path: path.display().to_string(),
                    source,
                })?;
                match serde_json::from_str::<ConfirmedAction>(&json) {
                    Ok(action) => actions.push(action),
                    Err(e) => tracing::warn!("skipping unreadable action {}: {}", path.display(), e),
                }
            }
        }

        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(actions)
    }

    fn allocate_id(&self) -> Result<i64, ActionStoreError> {
        let mut next = self
            .next_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = match *next {
            Some(id) => id,
            None => self.highest_stored_id()? + 1,
        };
        *next = Some(id + 1);
        Ok(id)
    }

    /// Highest id among the stored files, readable or not.
    fn highest_stored_id(&self) -> Result<i64, ActionStoreError> {
        let entries = fs::read_dir(&self.store_dir).map_err(|source| ActionStoreError::IoError {
            path: self.store_dir.display().to_string(),
            source,
        })?;
        let mut highest = 0;
        for entry in entries {
            let entry = entry.map_err(|source| ActionStoreError::IoError {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i64>().ok());
            if let Some(id) = id {
                highest = highest.max(id);
            }
        }
        Ok(highest)
    }

    fn action_file(&self, id: i64) -> PathBuf {
        self.store_dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl ActionStore for JsonActionStore {
    async fn create_action(&self, fields: NewAction) -> Result<ConfirmedAction, ActionStoreError> {
        fields.validate()?;
        let id = self.allocate_id()?;
        let action = ConfirmedAction::create(id, fields);

        let path = self.action_file(id);
        let json = serde_json::to_string_pretty(&action)?;
        fs::write(&path, json).map_err(|source| ActionStoreError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(action_id = id, project_id = action.fields.project_id, "action created");
        Ok(action)
    }

    async fn get(&self, id: i64) -> Result<Option<ConfirmedAction>, ActionStoreError> {
        let path = self.action_file(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| ActionStoreError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ConfirmedAction>, ActionStoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|a| a.fields.project_id == project_id)
            .collect())
    }
}
