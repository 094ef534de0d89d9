//! Assistants-style thread API (OpenAI Assistants v2).
//!
//! Threads hold the conversation, runs execute an assistant against a
//! thread, and a run pauses in `requires_action` until tool outputs are
//! submitted. Every call carries the `OpenAI-Beta: assistants=v2` header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signalforge_core::error::ProviderError;
use signalforge_core::message::{Message, MessageContent, MessageToolCall, Role};
use signalforge_core::thread::{
    AssistantSpec, AssistantTool, Run, RunStatus, ThreadContent, ThreadMessage, ThreadProvider,
    ToolOutput,
};
use tracing::{debug, warn};

use crate::openai_compat::{ApiToolCall, ApiToolDefinition, OpenAiCompatProvider, role_name};

const ASSISTANTS_BETA: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

impl OpenAiCompatProvider {
    fn beta_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorized(self.client.post(self.url(path)))
            .header(ASSISTANTS_BETA.0, ASSISTANTS_BETA.1)
    }

    fn beta_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorized(self.client.get(self.url(path)))
            .header(ASSISTANTS_BETA.0, ASSISTANTS_BETA.1)
    }

    /// Thread messages only accept user and assistant roles.
    fn to_thread_messages(messages: &[Message]) -> Vec<ApiThreadMessageIn> {
        messages
            .iter()
            .filter_map(|m| match m.role {
                Role::User | Role::Assistant => Some(ApiThreadMessageIn {
                    role: role_name(m.role).into(),
                    content: m.content.clone(),
                }),
                Role::System | Role::Tool => {
                    warn!(role = role_name(m.role), "Dropping message a thread cannot hold");
                    None
                }
            })
            .collect()
    }

    fn to_api_assistant_tools(tools: &[AssistantTool]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|tool| match tool {
                AssistantTool::Function { function } => {
                    serde_json::json!(ApiToolDefinition::from(function))
                }
                AssistantTool::CodeInterpreter => serde_json::json!({"type": "code_interpreter"}),
            })
            .collect()
    }
}

#[async_trait]
impl ThreadProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        signalforge_core::provider::Provider::name(self)
    }

    async fn create_thread(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let body = serde_json::json!({ "messages": Self::to_thread_messages(&messages) });
        let thread: ApiObject = self.send_json(self.beta_post("threads").json(&body)).await?;
        debug!(thread_id = %thread.id, "Created thread");
        Ok(thread.id)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ProviderError> {
        let body = serde_json::json!({ "assistant_id": assistant_id });
        let run: ApiRun = self
            .send_json(self.beta_post(&format!("threads/{thread_id}/runs")).json(&body))
            .await?;
        debug!(thread_id, run_id = %run.id, "Created run");
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError> {
        let run: ApiRun = self
            .send_json(self.beta_get(&format!("threads/{thread_id}/runs/{run_id}")))
            .await?;
        Ok(run.into())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, ProviderError> {
        let body = serde_json::json!({ "tool_outputs": outputs });
        let path = format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs");
        let run: ApiRun = self.send_json(self.beta_post(&path).json(&body)).await?;
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ProviderError> {
        let list: ApiList<ApiThreadMessageOut> = self
            .send_json(self.beta_get(&format!("threads/{thread_id}/messages?order=desc")))
            .await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError> {
        let path = format!("threads/{thread_id}/runs/{run_id}/cancel");
        let run: ApiRun = self.send_json(self.beta_post(&path)).await?;
        Ok(run.into())
    }

    async fn create_assistant(&self, spec: AssistantSpec) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "name": spec.name,
            "instructions": spec.instructions,
            "model": spec.model,
            "temperature": spec.temperature,
            "tools": Self::to_api_assistant_tools(&spec.tools),
        });
        let assistant: ApiObject = self.send_json(self.beta_post("assistants").json(&body)).await?;
        debug!(assistant_id = %assistant.id, "Created assistant");
        Ok(assistant.id)
    }
}

// --- Assistants API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiList<T> {
    data: Vec<T>,
}

#[derive(Debug, Serialize)]
struct ApiThreadMessageIn {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Deserialize)]
struct ApiRun {
    id: String,
    status: RunStatus,
    #[serde(default)]
    required_action: Option<ApiRequiredAction>,
    #[serde(default)]
    last_error: Option<ApiRunError>,
    #[serde(default)]
    incomplete_details: Option<ApiIncompleteDetails>,
}

#[derive(Debug, Deserialize)]
struct ApiRequiredAction {
    submit_tool_outputs: ApiSubmitToolOutputs,
}

#[derive(Debug, Deserialize)]
struct ApiSubmitToolOutputs {
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiRunError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiIncompleteDetails {
    #[serde(default)]
    reason: Option<String>,
}

impl From<ApiRun> for Run {
    fn from(run: ApiRun) -> Self {
        let required_tool_calls = run
            .required_action
            .map(|a| {
                a.submit_tool_outputs
                    .tool_calls
                    .into_iter()
                    .map(MessageToolCall::from)
                    .collect()
            })
            .unwrap_or_default();

        let last_error = run
            .last_error
            .map(|e| match (e.code, e.message) {
                (Some(code), Some(message)) => format!("{code}: {message}"),
                (code, message) => message.or(code).unwrap_or_default(),
            })
            .or_else(|| run.incomplete_details.and_then(|d| d.reason));

        Run {
            id: run.id,
            status: run.status,
            required_tool_calls,
            last_error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiThreadMessageOut {
    id: String,
    role: String,
    #[serde(default)]
    content: Vec<ApiThreadContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiThreadContent {
    Text { text: ApiText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiText {
    value: String,
}

impl From<ApiThreadMessageOut> for ThreadMessage {
    fn from(message: ApiThreadMessageOut) -> Self {
        ThreadMessage {
            id: message.id,
            role: message.role,
            content: message
                .content
                .into_iter()
                .map(|c| match c {
                    ApiThreadContent::Text { text } => ThreadContent::Text { text: text.value },
                    ApiThreadContent::Other => ThreadContent::Other,
                })
                .collect(),
        }
    }
}
