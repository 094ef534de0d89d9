//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, and any endpoint exposing the OpenAI
//! `/chat/completions` and `/embeddings` API.
//!
//! Supports:
//! - Chat completions with function calling and multi-part content
//! - Model rosters (OpenRouter `models` fallback list)
//! - Embeddings
//!
//! The Assistants-style thread API lives in [`crate::assistants`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use signalforge_core::error::ProviderError;
use signalforge_core::message::{Message, MessageContent, MessageToolCall, Role};
use signalforge_core::provider::*;
use tracing::{debug, warn};

/// An OpenAI-compatible provider.
pub struct OpenAiCompatProvider {
    name: String,
    pub(crate) base_url: String,
    api_key: String,
    pub(crate) client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    /// Send a request and decode a successful JSON body, mapping HTTP failures.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))
    }

    /// Build the chat completions request body.
    fn to_api_request(request: &ProviderRequest) -> Result<serde_json::Value, ProviderError> {
        let model = request
            .primary_model()
            .ok_or_else(|| ProviderError::NotConfigured("No model given in the request roster".into()))?;

        let mut body = serde_json::json!({
            "model": model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": false,
        });

        if request.models.len() > 1 {
            body["models"] = serde_json::json!(request.models);
        }

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        if let Some(tool_choice) = request.tool_choice {
            body["tool_choice"] = serde_json::json!(tool_choice.as_str());
        }

        Ok(body)
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: role_name(m.role).into(),
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(m.tool_calls.iter().map(ApiToolCall::from).collect())
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Convert function declarations to OpenAI API format.
    pub(crate) fn to_api_tools(tools: &[FunctionDeclaration]) -> Vec<ApiToolDefinition> {
        tools.iter().map(ApiToolDefinition::from).collect()
    }

    fn from_api_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(MessageToolCall::from)
            .collect();

        let mut message = Message::assistant(choice.message.content.unwrap_or_default());
        message.tool_calls = tool_calls;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }
}

pub(crate) fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
        Role::Tool => "tool",
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = Self::to_api_request(&request)?;

        debug!(
            provider = %self.name,
            models = ?request.models,
            tools = request.tools.len(),
            "Sending completion request"
        );

        let builder = self.authorized(self.client.post(self.url("chat/completions"))).json(&body);
        let api_response: ApiResponse = self.send_json(builder).await?;
        Self::from_api_response(api_response)
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        let mut body = serde_json::json!({
            "model": request.model,
            "input": request.inputs,
            "encoding_format": "float",
        });
        if let Some(dimensions) = request.dimensions {
            body["dimensions"] = serde_json::json!(dimensions);
        }

        debug!(
            provider = %self.name,
            model = %request.model,
            count = request.inputs.len(),
            "Sending embedding request"
        );

        let builder = self.authorized(self.client.post(self.url("embeddings"))).json(&body);
        let api_resp: EmbeddingApiResponse = self.send_json(builder).await?;

        Ok(EmbeddingResponse {
            embeddings: api_resp.data.into_iter().map(|d| d.embedding).collect(),
            model: api_resp.model,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApiToolCall {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default = "function_kind")]
    pub(crate) r#type: String,
    pub(crate) function: ApiFunction,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApiFunction {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) arguments: String,
}

impl From<&MessageToolCall> for ApiToolCall {
    fn from(tc: &MessageToolCall) -> Self {
        Self {
            id: tc.id.clone(),
            r#type: tc.kind.clone(),
            function: ApiFunction {
                name: tc.name.clone(),
                arguments: tc.arguments.clone(),
            },
        }
    }
}

impl From<ApiToolCall> for MessageToolCall {
    fn from(tc: ApiToolCall) -> Self {
        Self {
            id: tc.id,
            kind: tc.r#type,
            name: tc.function.name,
            arguments: tc.function.arguments,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApiToolDefinition {
    pub(crate) r#type: String,
    pub(crate) function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApiToolFunction {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) parameters: serde_json::Value,
}

impl From<&FunctionDeclaration> for ApiToolDefinition {
    fn from(decl: &FunctionDeclaration) -> Self {
        Self {
            r#type: "function".into(),
            function: ApiToolFunction {
                name: decl.name.clone(),
                description: decl.description.clone(),
                parameters: decl.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// --- Embedding API types ---

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
