//! ThreadProvider trait: persistent conversation threads and runs.
//!
//! A run executes an assistant against a thread and may pause in
//! `requires_action` until the caller submits outputs for the tool calls it
//! requested.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::{Message, MessageToolCall};
use crate::provider::FunctionDeclaration;

/// Lifecycle status of a thread run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Cancelling,
    Cancelled,
    Expired,
    Failed,
    Incomplete,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Completed => "completed",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Failed => "failed",
            Self::Incomplete => "incomplete",
        }
    }

    /// Completed or any failure status. `cancelling` counts as terminal: the
    /// run will never produce a result for us.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::InProgress | Self::RequiresAction)
    }

    pub fn is_failure(&self) -> bool {
        self.is_terminal() && *self != Self::Completed
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of a run as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,

    pub status: RunStatus,

    /// Tool calls awaiting outputs (only meaningful in `requires_action`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_tool_calls: Vec<MessageToolCall>,

    /// Provider-reported failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// The output submitted for one requested tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// A content segment of a thread message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThreadContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// A message stored on a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    #[serde(default)]
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<ThreadContent>,
}

impl ThreadMessage {
    /// The first text segment of the message, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ThreadContent::Text { text } => Some(text.as_str()),
            ThreadContent::Other => None,
        })
    }
}

/// A tool offered to an assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantTool {
    Function { function: FunctionDeclaration },
    CodeInterpreter,
}

/// Everything needed to create an assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub temperature: f32,
    pub tools: Vec<AssistantTool>,
}

/// Thread/run operations consumed by the thread-run state machine.
#[async_trait]
pub trait ThreadProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Create a thread seeded with the given messages; returns the thread id.
    async fn create_thread(&self, messages: Vec<Message>) -> Result<String, ProviderError>;

    /// Start a run of `assistant_id` on the thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ProviderError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError>;

    /// Submit every collected tool output for the run in one batch.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, ProviderError>;

    /// Messages on the thread, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ProviderError>;

    /// Ask the provider to stop a run.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError>;

    /// Create an assistant; returns its id.
    async fn create_assistant(&self, spec: AssistantSpec) -> Result<String, ProviderError>;
}
