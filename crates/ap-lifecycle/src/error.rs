// error.rs - Error types for draft lifecycle operations.
//
// The failure variants map one-to-one onto what the workspace must render:
// generation, refinement and confirm failures halt the operation and need an
// explicit retry; save failures are soft and retried on the next autosave.

use thiserror::Error;

use crate::phase::ControllerPhase;

/// Errors from [`DraftController`](crate::DraftController) operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A lifecycle call arrived without a resolved user identity.
    /// No collaborator was contacted.
    #[error("not authenticated: a requesting user is required")]
    NotAuthenticated,

    /// Another async lifecycle call is outstanding.
    #[error("busy: {phase} in progress")]
    Busy { phase: ControllerPhase },

    /// The operation is not valid in the current phase.
    #[error("cannot {operation} while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: ControllerPhase,
    },

    /// There is no open draft to operate on.
    #[error("no active draft for this assessment run")]
    NoDraft,

    /// Confirm was requested with no actions.
    #[error("the action plan has no actions to confirm")]
    EmptyPlan,

    /// An action index did not resolve.
    #[error("action index {index} out of range (draft has {len} actions)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The action was already committed by an earlier confirm attempt.
    #[error("action {index} is already committed as action #{action_id}")]
    ActionLocked { index: usize, action_id: i64 },

    /// Refinement and regeneration are refused once some actions have been committed.
    #[error("a confirm is partially complete; finish confirming before changing the plan")]
    ConfirmInProgress,

    /// The draft store could not be read.
    #[error("failed to load draft: {0}")]
    LoadFailed(String),

    /// The suggestion engine failed or returned no proposal.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// The suggestion engine failed to revise the draft.
    #[error("refinement failed: {0}")]
    RefinementFailed(String),

    /// Persisting the draft failed; retried on the next autosave.
    #[error("save failed: {0}")]
    SaveFailed(String),

    /// Not every action could be committed. `created` holds the ids made so
    /// far (including earlier attempts); `pending` the indices still to do.
    #[error("confirm failed ({} created, {} pending): {reason}", .created.len(), .pending.len())]
    ConfirmFailed {
        created: Vec<i64>,
        pending: Vec<usize>,
        reason: String,
    },

    /// The autosave timer could not be started.
    #[error("autosave unavailable: {0}")]
    AutosaveUnavailable(String),
}

impl LifecycleError {
    /// Soft failures that are retried automatically.
    pub fn is_transient(&self) -> bool {
        matches!(self, LifecycleError::SaveFailed(_))
    }
}
