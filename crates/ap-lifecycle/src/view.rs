// view.rs - WorkspaceView: what the workspace renders.
//
// A view is a snapshot; it never aliases controller state. The workspace
// owns no business rules, it just renders a view and dispatches operations.

use ap_draft::{group_by_category, AssessmentRunId, ConversationEntry, DraftAction, ProjectId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::phase::ControllerPhase;

/// Canned refinement prompts offered beside the message box.
pub fn quick_prompts() -> &'static [&'static str] {
    &[
        "Make actions more specific",
        "Add due dates to all actions",
        "Break large actions into sub-tasks",
        "Add suggested owners based on skill requirements",
    ]
}

/// Snapshot of a controller's state.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceView {
    pub assessment_run_id: AssessmentRunId,
    pub project_id: ProjectId,
    pub phase: ControllerPhase,
    pub draft_id: Option<Uuid>,
    pub actions: Vec<DraftAction>,
    pub conversation: Vec<ConversationEntry>,
    /// Last generation/refinement/confirm failure, cleared on the next attempt.
    pub last_error: Option<String>,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Transient save failure, shown as a soft indicator only.
    pub last_save_error: Option<String>,
    pub is_saving: bool,
}

impl WorkspaceView {
    /// Progress text for the busy phases. Each is distinct so a reviewer can
    /// tell what is pending and does not submit twice.
    pub fn progress_label(&self) -> Option<&'static str> {
        match self.phase {
            ControllerPhase::Generating => Some("Generating action plan..."),
            ControllerPhase::Refining => Some("Refining action plan..."),
            ControllerPhase::Confirming => Some("Creating actions..."),
            _ => None,
        }
    }

    /// Header line, e.g. "3 actions proposed".
    pub fn summary(&self) -> String {
        let n = self.actions.len();
        format!("{} action{} proposed", n, if n == 1 { "" } else { "s" })
    }

    /// Actions grouped by category with their list indices.
    pub fn grouped(&self) -> Vec<(String, Vec<(usize, &DraftAction)>)> {
        group_by_category(&self.actions)
    }

    /// Actions that still need a confirmed action created.
    pub fn pending_indices(&self) -> Vec<usize> {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_committed())
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_draft::Priority;

    fn view(phase: ControllerPhase, actions: Vec<DraftAction>) -> WorkspaceView {
        WorkspaceView {
            assessment_run_id: 1,
            project_id: 1,
            phase,
            draft_id: None,
            actions,
            conversation: Vec::new(),
            last_error: None,
            last_saved_at: None,
            last_save_error: None,
            is_saving: false,
        }
    }

    #[test]
    fn busy_phases_have_distinct_labels() {
        let labels: Vec<&str> = [
            ControllerPhase::Generating,
            ControllerPhase::Refining,
            ControllerPhase::Confirming,
        ]
        .into_iter()
        .filter_map(|p| view(p, Vec::new()).progress_label())
        .collect();
        assert_eq!(labels.len(), 3);
        assert_ne!(labels[0], labels[1]);
        assert_ne!(labels[1], labels[2]);
        assert!(view(ControllerPhase::Active, Vec::new())
            .progress_label()
            .is_none());
    }

    #[test]
    fn summary_pluralises() {
        let one = view(
            ControllerPhase::Active,
            vec![DraftAction::new("a", "", Priority::Low)],
        );
        assert_eq!(one.summary(), "1 action proposed");
        assert_eq!(view(ControllerPhase::Active, Vec::new()).summary(), "0 actions proposed");
    }

    #[test]
    fn pending_excludes_committed() {
        let mut done = DraftAction::new("done", "", Priority::Low);
        done.confirmed_action_id = Some(4);
        let v = view(
            ControllerPhase::Active,
            vec![done, DraftAction::new("todo", "", Priority::Low)],
        );
        assert_eq!(v.pending_indices(), vec![1]);
    }

    #[test]
    fn four_quick_prompts() {
        assert_eq!(quick_prompts().len(), 4);
    }
}
