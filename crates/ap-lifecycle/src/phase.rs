// phase.rs - ControllerPhase: the in-memory lifecycle of a draft workspace.
//
//   NoDraft → Generating → Active ⇄ Refining
//                            Active → Confirming → Confirmed
//                            Confirming → Active          (confirm failed)
//   Active | Confirmed → Generating                      (regeneration)
//   Generating → NoDraft                                 (generation failed)
//
// Load may move between NoDraft, Active and Confirmed depending on what the
// store holds. Generating, Refining and Confirming are the busy phases: only
// one async lifecycle call may be outstanding, and any other arriving while
// one is in flight is rejected rather than queued.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a [`DraftController`](crate::DraftController).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    /// No open draft exists for the run.
    NoDraft,
    /// Waiting on the suggestion engine for a fresh proposal.
    Generating,
    /// Editable and refinable.
    Active,
    /// Waiting on the suggestion engine for a revision.
    Refining,
    /// Committing draft actions to the action store.
    Confirming,
    /// Actions committed; the draft is historical.
    Confirmed,
}

impl fmt::Display for ControllerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerPhase::NoDraft => write!(f, "no_draft"),
            ControllerPhase::Generating => write!(f, "generating"),
            ControllerPhase::Active => write!(f, "active"),
            ControllerPhase::Refining => write!(f, "refining"),
            ControllerPhase::Confirming => write!(f, "confirming"),
            ControllerPhase::Confirmed => write!(f, "confirmed"),
        }
    }
}

impl ControllerPhase {
    /// An async lifecycle call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ControllerPhase::Generating | ControllerPhase::Refining | ControllerPhase::Confirming
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerPhase::Confirmed)
    }

    /// Check whether moving from this phase to `next` is valid.
    pub fn can_transition_to(&self, next: ControllerPhase) -> bool {
        use ControllerPhase::*;
        matches!(
            (self, next),
            (NoDraft, Generating)
                | (Active, Generating)
                | (Confirmed, Generating)
                | (Generating, Active)
                | (Generating, NoDraft)
                | (Active, Refining)
                | (Refining, Active)
                | (Active, Confirming)
                | (Confirming, Active)
                | (Confirming, Confirmed)
                // Load results.
                | (NoDraft, Active)
                | (Active, NoDraft)
                | (Confirmed, NoDraft)
                | (Confirmed, Active)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ControllerPhase::*;

    #[test]
    fn happy_path_is_valid() {
        let path = [NoDraft, Generating, Active, Refining, Active, Confirming, Confirmed];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be valid",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn busy_phases_cannot_start_other_operations() {
        for busy in [Generating, Refining, Confirming] {
            assert!(busy.is_busy());
            assert!(!busy.can_transition_to(Generating));
            assert!(!busy.can_transition_to(Refining));
            assert!(!busy.can_transition_to(Confirming));
        }
    }

    #[test]
    fn cannot_refine_or_confirm_without_active_draft() {
        assert!(!NoDraft.can_transition_to(Refining));
        assert!(!NoDraft.can_transition_to(Confirming));
        assert!(!Confirmed.can_transition_to(Refining));
        assert!(!Confirmed.can_transition_to(Confirming));
    }

    #[test]
    fn failed_generation_returns_to_no_draft() {
        assert!(Generating.can_transition_to(NoDraft));
        assert!(!Refining.can_transition_to(NoDraft));
    }

    #[test]
    fn display_format() {
        assert_eq!(NoDraft.to_string(), "no_draft");
        assert_eq!(Confirming.to_string(), "confirming");
        assert!(Confirmed.is_terminal());
        assert!(!Active.is_terminal());
    }
}
