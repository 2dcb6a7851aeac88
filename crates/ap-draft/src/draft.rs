// draft.rs - Draft: the persisted action plan proposal for one assessment run.
//
// Status lifecycle:
//   Generating → Active → Confirmed
//   Generating | Active → Superseded   (a newer generation replaced it)
//
// Confirmed and Superseded are terminal. At most one draft per assessment
// run may be open (Generating or Active) at a time; the store enforces this
// through `supersede_open`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::DraftAction;
use crate::conversation::ConversationEntry;
use crate::error::DraftError;
use crate::{AssessmentRunId, ProjectId, UserId};

/// Persisted status of a draft.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// The suggestion engine is still producing the proposal.
    Generating,
    /// Editable and refinable.
    Active,
    /// Actions were committed; the draft is historical.
    Confirmed,
    /// Replaced by a newer generation for the same run.
    Superseded,
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftStatus::Generating => write!(f, "generating"),
            DraftStatus::Active => write!(f, "active"),
            DraftStatus::Confirmed => write!(f, "confirmed"),
            DraftStatus::Superseded => write!(f, "superseded"),
        }
    }
}

impl DraftStatus {
    /// Open drafts count against the one-per-run limit.
    pub fn is_open(&self) -> bool {
        matches!(self, DraftStatus::Generating | DraftStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    pub fn can_transition_to(&self, next: DraftStatus) -> bool {
        matches!(
            (self, next),
            (DraftStatus::Generating, DraftStatus::Active)
                | (DraftStatus::Generating, DraftStatus::Superseded)
                | (DraftStatus::Active, DraftStatus::Confirmed)
                | (DraftStatus::Active, DraftStatus::Superseded)
        )
    }
}

/// One action plan draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub draft_id: Uuid,
    pub assessment_run_id: AssessmentRunId,
    pub project_id: ProjectId,

    /// Ordered proposal; entries are addressed by index.
    #[serde(default)]
    pub proposed_actions: Vec<DraftAction>,

    #[serde(default)]
    pub conversation_history: Vec<ConversationEntry>,

    pub status: DraftStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Last successful content save (None until the first save).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Draft {
    /// Create an active draft holding a freshly generated proposal.
    pub fn new(
        draft_id: Uuid,
        assessment_run_id: AssessmentRunId,
        project_id: ProjectId,
        proposed_actions: Vec<DraftAction>,
    ) -> Self {
        let now = Utc::now();
        Self {
            draft_id,
            assessment_run_id,
            project_id,
            proposed_actions,
            conversation_history: Vec::new(),
            status: DraftStatus::Active,
            created_by: None,
            created_at: now,
            updated_at: now,
            saved_at: None,
        }
    }

    /// Transition to a new status. Returns an error if the transition is invalid.
    pub fn transition(&mut self, next: DraftStatus) -> Result<(), DraftError> {
        if !self.status.can_transition_to(next) {
            return Err(DraftError::InvalidTransition {
                draft_id: self.draft_id,
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replace the editable content. Only active drafts accept writes.
    pub fn write_content(
        &mut self,
        actions: &[DraftAction],
        conversation: &[ConversationEntry],
    ) -> Result<DateTime<Utc>, DraftError> {
        if self.status != DraftStatus::Active {
            return Err(DraftError::NotWritable {
                draft_id: self.draft_id,
                status: self.status.to_string(),
            });
        }
        let now = Utc::now();
        self.proposed_actions = actions.to_vec();
        self.conversation_history = conversation.to_vec();
        self.saved_at = Some(now);
        self.updated_at = now;
        Ok(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Priority;

    fn test_draft() -> Draft {
        Draft::new(
            Uuid::new_v4(),
            7,
            3,
            vec![DraftAction::new("Fix gap", "Close the gap", Priority::High)],
        )
    }

    #[test]
    fn new_draft_is_active_and_unsaved() {
        let draft = test_draft();
        assert_eq!(draft.status, DraftStatus::Active);
        assert!(draft.saved_at.is_none());
        assert_eq!(draft.proposed_actions.len(), 1);
    }

    #[test]
    fn valid_transitions() {
        let mut draft = test_draft();
        draft.transition(DraftStatus::Confirmed).unwrap();
        assert!(draft.status.is_terminal());

        let mut other = test_draft();
        other.transition(DraftStatus::Superseded).unwrap();
        assert!(other.status.is_terminal());
    }

    #[test]
    fn terminal_states_do_not_reopen() {
        let mut draft = test_draft();
        draft.transition(DraftStatus::Superseded).unwrap();
        let result = draft.transition(DraftStatus::Active);
        assert!(matches!(result, Err(DraftError::InvalidTransition { .. })));
        let result = draft.transition(DraftStatus::Confirmed);
        assert!(matches!(result, Err(DraftError::InvalidTransition { .. })));
    }

    #[test]
    fn write_content_rejected_once_terminal() {
        let mut draft = test_draft();
        draft.transition(DraftStatus::Confirmed).unwrap();
        let result = draft.write_content(&[], &[]);
        assert!(matches!(result, Err(DraftError::NotWritable { .. })));
    }

    #[test]
    fn write_content_stamps_saved_at() {
        let mut draft = test_draft();
        let actions = vec![DraftAction::manual()];
        let stamp = draft.write_content(&actions, &[]).unwrap();
        assert_eq!(draft.saved_at, Some(stamp));
        assert_eq!(draft.proposed_actions, actions);
    }

    #[test]
    fn status_display_format() {
        assert_eq!(DraftStatus::Generating.to_string(), "generating");
        assert_eq!(DraftStatus::Superseded.to_string(), "superseded");
        let json = serde_json::to_string(&DraftStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }
}
