// action.rs - ConfirmedAction: a persisted, trackable remediation action.

use std::fmt;

use ap_draft::{AssessmentRunId, Priority, ProjectId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ActionStoreError;

/// Tracking status of a confirmed action.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
    WontFix,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::NotStarted => write!(f, "not_started"),
            ActionStatus::InProgress => write!(f, "in_progress"),
            ActionStatus::Completed => write!(f, "completed"),
            ActionStatus::Blocked => write!(f, "blocked"),
            ActionStatus::Cancelled => write!(f, "cancelled"),
            ActionStatus::WontFix => write!(f, "wont_fix"),
        }
    }
}

/// How an action entered the register.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Manual,
    AiGenerated,
}

impl fmt::Display for ActionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSource::Manual => write!(f, "manual"),
            ActionSource::AiGenerated => write!(f, "ai_generated"),
        }
    }
}

/// Fields needed to create a confirmed action.
///
/// New actions always start as [`ActionStatus::NotStarted`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAction {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub linked_assessment_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_assessment_run_id: Option<AssessmentRunId>,
    pub source_type: ActionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl NewAction {
    /// Reject fields no store should accept.
    pub fn validate(&self) -> Result<(), ActionStoreError> {
        if self.title.trim().is_empty() {
            return Err(ActionStoreError::Invalid("title must not be empty".into()));
        }
        Ok(())
    }
}

/// A persisted action with its own identity and lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedAction {
    pub id: i64,
    #[serde(flatten)]
    pub fields: NewAction,
    pub action_status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfirmedAction {
    /// Materialise a new action under the given id.
    pub fn create(id: i64, fields: NewAction) -> Self {
        let now = Utc::now();
        Self {
            id,
            fields,
            action_status: ActionStatus::NotStarted,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> NewAction {
        NewAction {
            project_id: 2,
            title: "Publish benefits register".into(),
            description: "Baseline the benefits".into(),
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2026, 6, 30),
            assigned_to: Some(8),
            category: Some("Economic".into()),
            linked_assessment_ids: vec![31],
            source_assessment_run_id: Some(14),
            source_type: ActionSource::AiGenerated,
            created_by: Some(5),
        }
    }

    #[test]
    fn created_action_starts_not_started() {
        let action = ConfirmedAction::create(1, fields());
        assert_eq!(action.action_status, ActionStatus::NotStarted);
        assert_eq!(action.fields.source_assessment_run_id, Some(14));
    }

    #[test]
    fn serialized_form_is_flat() {
        let action = ConfirmedAction::create(1, fields());
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["source_type"], "ai_generated");
        assert_eq!(json["action_status"], "not_started");
        assert_eq!(json["source_assessment_run_id"], 14);
        assert_eq!(json["due_date"], "2026-06-30");
    }

    #[test]
    fn blank_title_is_invalid() {
        let mut f = fields();
        f.title = "   ".into();
        assert!(matches!(f.validate(), Err(ActionStoreError::Invalid(_))));
        assert!(fields().validate().is_ok());
    }
}
