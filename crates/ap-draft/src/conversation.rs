// conversation.rs - Refinement conversation entries.
//
// Entries are append-only. A user entry is written as soon as the message is
// submitted; the paired assistant entry is appended only when the engine
// answers. When a refinement fails the user entry stays in the history with
// `unanswered` set, and it is left out of the history sent to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the refinement conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,

    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Set on a user entry whose refinement request failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unanswered: bool,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            unanswered: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            unanswered: false,
        }
    }
}

/// The slice of history to send with a refinement request.
///
/// Failed turns are dropped and at most `max_entries` of the most recent
/// remaining entries are kept (`0` keeps everything).
pub fn history_window(entries: &[ConversationEntry], max_entries: usize) -> Vec<ConversationEntry> {
    let answered: Vec<&ConversationEntry> = entries.iter().filter(|e| !e.unanswered).collect();
    let skip = if max_entries == 0 {
        0
    } else {
        answered.len().saturating_sub(max_entries)
    };
    answered.into_iter().skip(skip).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(text: &str) -> ConversationEntry {
        let mut entry = ConversationEntry::user(text);
        entry.unanswered = true;
        entry
    }

    #[test]
    fn decodes_plain_role_content_pairs() {
        let entries: Vec<ConversationEntry> = serde_json::from_str(
            r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#,
        )
        .unwrap();
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[1].role, Role::Assistant);
        assert!(!entries[1].unanswered);
    }

    #[test]
    fn unanswered_flag_only_serialized_when_set() {
        let ok = serde_json::to_string(&ConversationEntry::user("a")).unwrap();
        assert!(!ok.contains("unanswered"));
        let bad = serde_json::to_string(&failed("b")).unwrap();
        assert!(bad.contains("\"unanswered\":true"));
    }

    #[test]
    fn window_drops_failed_turns() {
        let history = vec![
            ConversationEntry::user("one"),
            ConversationEntry::assistant("reply one"),
            failed("lost"),
            ConversationEntry::user("two"),
        ];
        let window = history_window(&history, 0);
        let contents: Vec<&str> = window.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "reply one", "two"]);
    }

    #[test]
    fn window_keeps_most_recent_entries() {
        let history: Vec<ConversationEntry> = (0..6)
            .map(|i| ConversationEntry::user(format!("m{}", i)))
            .collect();
        let window = history_window(&history, 2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "m4");
        assert_eq!(window[1].content, "m5");
    }
}
