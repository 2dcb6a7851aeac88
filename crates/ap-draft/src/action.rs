// action.rs - DraftAction: one proposed remediation action inside a draft.
//
// Draft actions have no identity outside their draft. They are addressed by
// position, so any delete renumbers everything after it. The `key` field is
// a client-generated identifier that survives reordering; it is only used to
// remember which entries were already committed during a confirm.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category label used for actions that carry none.
pub const UNCATEGORISED: &str = "Other";

/// Priority of a proposed action.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!(
                "unknown priority '{}' (expected low, medium, high or critical)",
                other
            )),
        }
    }
}

/// Where a draft action came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionOrigin {
    /// Proposed or revised by the suggestion engine.
    #[default]
    Suggested,
    /// Added by hand in the workspace.
    Manual,
}

/// A single proposed action inside a draft.
///
/// Input accepts both the snake_case field names written by this crate and
/// the camelCase names used by browser clients and the suggestion engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftAction {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(
        default,
        alias = "suggestedDueDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggested_due_date: Option<NaiveDate>,

    /// Assessment/criterion identifiers this action remediates.
    #[serde(default, alias = "linkedAssessmentIds")]
    pub linked_assessment_ids: Vec<i64>,

    #[serde(
        default,
        alias = "criteriaCategory",
        skip_serializing_if = "Option::is_none"
    )]
    pub criteria_category: Option<String>,

    #[serde(default, alias = "assignedTo", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,

    #[serde(default)]
    pub origin: ActionOrigin,

    /// Stable client-side identifier, generated when absent.
    #[serde(default = "Uuid::new_v4")]
    pub key: Uuid,

    /// Set once a confirmed action has been created from this entry.
    #[serde(
        default,
        alias = "confirmedActionId",
        skip_serializing_if = "Option::is_none"
    )]
    pub confirmed_action_id: Option<i64>,
}

impl DraftAction {
    /// Create a suggested action with no links, due date or assignee.
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            suggested_due_date: None,
            linked_assessment_ids: Vec::new(),
            criteria_category: None,
            assigned_to: None,
            origin: ActionOrigin::Suggested,
            key: Uuid::new_v4(),
            confirmed_action_id: None,
        }
    }

    /// The template inserted by "Add Action Manually".
    pub fn manual() -> Self {
        Self {
            criteria_category: Some(UNCATEGORISED.to_string()),
            origin: ActionOrigin::Manual,
            ..Self::new("New Action", "Describe this action...", Priority::Medium)
        }
    }

    /// Whether a confirmed action already exists for this entry.
    pub fn is_committed(&self) -> bool {
        self.confirmed_action_id.is_some()
    }

    /// Category label for grouping, falling back to "Other".
    pub fn category_label(&self) -> &str {
        self.criteria_category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORISED)
    }
}

/// Partial update for a [`DraftAction`].
///
/// `None` leaves a field untouched. For optional fields the inner `Option`
/// distinguishes "set to this value" from "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub suggested_due_date: Option<Option<NaiveDate>>,
    pub linked_assessment_ids: Option<Vec<i64>>,
    pub criteria_category: Option<Option<String>>,
    pub assigned_to: Option<Option<i64>>,
}

impl ActionPatch {
    /// Patch that only changes the priority.
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into `action`, leaving unspecified fields as they are.
    pub fn apply_to(&self, action: &mut DraftAction) {
        if let Some(title) = &self.title {
            action.title = title.clone();
        }
        if let Some(description) = &self.description {
            action.description = description.clone();
        }
        if let Some(priority) = self.priority {
            action.priority = priority;
        }
        if let Some(due) = self.suggested_due_date {
            action.suggested_due_date = due;
        }
        if let Some(ids) = &self.linked_assessment_ids {
            action.linked_assessment_ids = ids.clone();
        }
        if let Some(category) = &self.criteria_category {
            action.criteria_category = category.clone();
        }
        if let Some(assignee) = self.assigned_to {
            action.assigned_to = assignee;
        }
    }
}

/// Group actions by category label, keeping each action's list index.
///
/// Groups appear in the order their category is first seen, and entries
/// inside a group keep list order. Edits must still address actions by the
/// returned index, never by position inside a group.
pub fn group_by_category(actions: &[DraftAction]) -> Vec<(String, Vec<(usize, &DraftAction)>)> {
    let mut groups: Vec<(String, Vec<(usize, &DraftAction)>)> = Vec::new();
    for (index, action) in actions.iter().enumerate() {
        let label = action.category_label();
        match groups.iter_mut().find(|(name, _)| name == label) {
            Some((_, members)) => members.push((index, action)),
            None => groups.push((label.to_string(), vec![(index, action)])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_engine_payload() {
        let json = r#"{
            "title": "Appoint SRO",
            "description": "Name a senior responsible owner",
            "priority": "high",
            "suggestedDueDate": "2026-03-31",
            "linkedAssessmentIds": [4, 9],
            "criteriaCategory": "Management",
            "assignedTo": 12
        }"#;
        let action: DraftAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.priority, Priority::High);
        assert_eq!(
            action.suggested_due_date,
            NaiveDate::from_ymd_opt(2026, 3, 31)
        );
        assert_eq!(action.linked_assessment_ids, vec![4, 9]);
        assert_eq!(action.criteria_category.as_deref(), Some("Management"));
        assert_eq!(action.assigned_to, Some(12));
        assert_eq!(action.origin, ActionOrigin::Suggested);
        assert!(!action.is_committed());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let action: DraftAction = serde_json::from_str(r#"{"title": "Bare"}"#).unwrap();
        assert_eq!(action.priority, Priority::Medium);
        assert!(action.description.is_empty());
        assert!(action.linked_assessment_ids.is_empty());
        assert!(!action.key.is_nil());
    }

    #[test]
    fn key_survives_storage() {
        let action = DraftAction::new("Keep", "me", Priority::Low);
        let json = serde_json::to_string(&action).unwrap();
        let restored: DraftAction = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, action);
        assert!(json.contains("\"linked_assessment_ids\""));
        assert!(!json.contains("suggested_due_date"));
    }

    #[test]
    fn manual_template_matches_workspace_defaults() {
        let action = DraftAction::manual();
        assert_eq!(action.title, "New Action");
        assert_eq!(action.description, "Describe this action...");
        assert_eq!(action.priority, Priority::Medium);
        assert_eq!(action.category_label(), "Other");
        assert_eq!(action.origin, ActionOrigin::Manual);
    }

    #[test]
    fn patch_touches_only_named_fields() {
        let mut action = DraftAction::new("Title", "Desc", Priority::Low);
        action.assigned_to = Some(3);

        ActionPatch::priority(Priority::Critical).apply_to(&mut action);
        assert_eq!(action.priority, Priority::Critical);
        assert_eq!(action.title, "Title");
        assert_eq!(action.assigned_to, Some(3));

        let clear = ActionPatch {
            assigned_to: Some(None),
            ..ActionPatch::default()
        };
        clear.apply_to(&mut action);
        assert_eq!(action.assigned_to, None);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ActionPatch::default().is_empty());
        assert!(!ActionPatch::priority(Priority::High).is_empty());
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("Critical".parse::<Priority>().unwrap(), Priority::Critical);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::High.to_string(), "high");
    }

    #[test]
    fn grouping_keeps_list_indices() {
        let mut a = DraftAction::new("a", "", Priority::Low);
        a.criteria_category = Some("Strategic".into());
        let b = DraftAction::new("b", "", Priority::Low);
        let mut c = DraftAction::new("c", "", Priority::Low);
        c.criteria_category = Some("Strategic".into());
        let actions = vec![a, b, c];

        let groups = group_by_category(&actions);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Strategic");
        let indices: Vec<usize> = groups[0].1.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(groups[1].0, "Other");
        assert_eq!(groups[1].1[0].0, 1);
    }
}
