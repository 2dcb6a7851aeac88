// engine.rs - SuggestionEngine trait and its request/response types.

use ap_draft::{AssessmentRunId, ConversationEntry, DraftAction, ProjectId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Reply recorded when the engine revises the plan without saying anything.
pub const DEFAULT_REFINE_REPLY: &str = "Action plan has been updated.";

/// Ask for a fresh proposal for an assessment run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub project_id: ProjectId,
    pub assessment_run_id: AssessmentRunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesting_user_id: Option<UserId>,
}

/// A fresh proposal.
///
/// `proposed_actions` is `None` when the engine returned no proposal at all,
/// which the lifecycle treats as a failed generation. An empty list is a
/// valid (if unhelpful) proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(alias = "draftId")]
    pub draft_id: Uuid,
    #[serde(default, alias = "proposedActions")]
    pub proposed_actions: Option<Vec<DraftAction>>,
}

/// Ask the engine to revise a draft in response to a user message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefineRequest {
    pub draft_id: Uuid,
    pub user_message: String,
    /// Prior turns followed by the new user message.
    pub conversation_history: Vec<ConversationEntry>,
}

/// A revision. Either part may be missing from a sloppy engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefineResponse {
    #[serde(default, alias = "refinedActions")]
    pub refined_actions: Option<Vec<DraftAction>>,
    #[serde(default, alias = "aiResponse")]
    pub ai_response: Option<String>,
}

impl RefineResponse {
    /// The assistant reply to record, falling back to a stock message.
    pub fn reply(&self) -> &str {
        self.ai_response
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_REFINE_REPLY)
    }
}

/// The external service that proposes and refines action plans.
///
/// Confirmation is not part of this contract: the lifecycle controller
/// creates confirmed actions directly in the action store.
#[async_trait]
pub trait SuggestionEngine: Send + Sync {
    /// Propose an action list for the run.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, EngineError>;

    /// Revise an existing draft.
    async fn refine(&self, request: &RefineRequest) -> Result<RefineResponse, EngineError>;

    /// Engine display name (for logs).
    fn name(&self) -> &str;
}
