// webhook.rs - SuggestionEngine backed by a single JSON webhook.
//
// Every request is POSTed to the same URL; the `identifier` field tells the
// workflow behind the webhook which operation to run:
//   generate_action_plan  { project_id, assessment_run_id, user_id, selected_findings }
//   refine_action_plan    { draft_id, user_message, conversation_history }
// An empty `selected_findings` means "all RED/AMBER findings".

use std::time::Duration;

use ap_draft::{AssessmentRunId, ConversationEntry, ProjectId, UserId};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{
    GenerateRequest, GenerateResponse, RefineRequest, RefineResponse, SuggestionEngine,
};
use crate::error::EngineError;

#[derive(Debug, Serialize)]
#[serde(tag = "identifier", rename_all = "snake_case")]
enum WebhookPayload<'a> {
    GenerateActionPlan {
        project_id: ProjectId,
        assessment_run_id: AssessmentRunId,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
        selected_findings: &'a [i64],
    },
    RefineActionPlan {
        draft_id: Uuid,
        user_message: &'a str,
        conversation_history: &'a [ConversationEntry],
    },
}

/// Webhook client for the suggestion engine.
pub struct WebhookEngine {
    url: Option<String>,
    client: Client,
}

impl WebhookEngine {
    /// Build a client for `url`. A missing or blank URL yields an engine
    /// whose every call fails with [`EngineError::NotConfigured`].
    pub fn new(url: Option<&str>, timeout: Duration, connect_timeout: Duration) -> Self {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| u.to_string());
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { url, client }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn call<T: DeserializeOwned>(&self, payload: &WebhookPayload<'_>) -> Result<T, EngineError> {
        let url = self.url.as_deref().ok_or_else(|| {
            EngineError::NotConfigured(
                "set [engine] webhook_url or ACTIONPLAN_ENGINE_URL".to_string(),
            )
        })?;

        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| EngineError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SuggestionEngine for WebhookEngine {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, EngineError> {
        tracing::debug!(
            project_id = request.project_id,
            assessment_run_id = request.assessment_run_id,
            "requesting action plan generation"
        );
        self.call(&WebhookPayload::GenerateActionPlan {
            project_id: request.project_id,
            assessment_run_id: request.assessment_run_id,
            user_id: request.requesting_user_id,
            selected_findings: &[],
        })
        .await
    }

    async fn refine(&self, request: &RefineRequest) -> Result<RefineResponse, EngineError> {
        tracing::debug!(draft_id = %request.draft_id, "requesting action plan refinement");
        self.call(&WebhookPayload::RefineActionPlan {
            draft_id: request.draft_id,
            user_message: &request.user_message,
            conversation_history: &request.conversation_history,
        })
        .await
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(url: Option<&str>) -> WebhookEngine {
        WebhookEngine::new(url, Duration::from_secs(5), Duration::from_secs(1))
    }

    #[test]
    fn generate_payload_shape() {
        let payload = WebhookPayload::GenerateActionPlan {
            project_id: 3,
            assessment_run_id: 17,
            user_id: Some(4),
            selected_findings: &[],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["identifier"], "generate_action_plan");
        assert_eq!(json["project_id"], 3);
        assert_eq!(json["assessment_run_id"], 17);
        assert_eq!(json["user_id"], 4);
        assert_eq!(json["selected_findings"], serde_json::json!([]));
    }

    #[test]
    fn refine_payload_shape() {
        let history = vec![ConversationEntry::user("add owners")];
        let id = Uuid::new_v4();
        let payload = WebhookPayload::RefineActionPlan {
            draft_id: id,
            user_message: "add owners",
            conversation_history: &history,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["identifier"], "refine_action_plan");
        assert_eq!(json["draft_id"], id.to_string());
        assert_eq!(json["conversation_history"][0]["role"], "user");
        assert_eq!(json["conversation_history"][0]["content"], "add owners");
    }

    #[test]
    fn blank_url_is_unconfigured() {
        assert!(!engine(None).is_configured());
        assert!(!engine(Some("  ")).is_configured());
        assert!(engine(Some("http://localhost:5678/webhook")).is_configured());
    }

    #[tokio::test]
    async fn unconfigured_engine_fails_without_sending() {
        let request = GenerateRequest {
            project_id: 1,
            assessment_run_id: 2,
            requesting_user_id: None,
        };
        let result = engine(None).generate(&request).await;
        assert!(matches!(result, Err(EngineError::NotConfigured(_))));
    }
}
