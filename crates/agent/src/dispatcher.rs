//! One-shot tool-call dispatch ("execute").
//!
//! A request goes to the model together with the registry's function
//! declarations. If the model answers with text, that text is the result.
//! If it asks for functions, the first `max_functions_per_turn` of them run
//! locally and either their envelope is returned as-is or the model is
//! asked a second time to interpret what came back.

use std::sync::Arc;

use signalforge_config::{AppConfig, DEFAULT_FALLBACK_MESSAGE, ModelsConfig};
use signalforge_core::envelope::ResultEnvelope;
use signalforge_core::error::{Error, Result};
use signalforge_core::message::{ContentPart, Message};
use signalforge_core::provider::{Provider, ProviderRequest, ToolChoice};
use signalforge_functions::FunctionRegistry;
use tracing::{debug, error, info, warn};

/// Appended to the interpretation request when more than one function ran.
pub const MULTIPLE_CALLS_NOTE: &str = "Please note when interpreting these function calls, that multiple function calls have been run, however only the first function's data is being returned for viewing.";

/// Everything one `execute` call needs besides the registry.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub prompt_parts: Vec<ContentPart>,
    pub system_instruction: String,
    pub history: Vec<Message>,
    pub temperature: f32,
    pub tool_choice: ToolChoice,
    /// Restrict the offered functions to these names
    pub functions: Option<Vec<String>>,
    pub use_lite_models: bool,
    /// Ask the model to interpret function results instead of returning them raw
    pub interpret: bool,
    pub max_functions_per_turn: usize,
}

impl ExecuteRequest {
    pub fn new(system_instruction: impl Into<String>, prompt_parts: Vec<ContentPart>) -> Self {
        Self {
            prompt_parts,
            system_instruction: system_instruction.into(),
            history: Vec::new(),
            temperature: 0.5,
            tool_choice: ToolChoice::Auto,
            functions: None,
            use_lite_models: true,
            interpret: false,
            max_functions_per_turn: 1,
        }
    }

    /// A request with a single text part.
    pub fn text(system_instruction: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(system_instruction, vec![ContentPart::text(prompt)])
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    pub fn with_functions(mut self, functions: Vec<String>) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn with_lite_models(mut self, lite: bool) -> Self {
        self.use_lite_models = lite;
        self
    }

    pub fn with_interpretation(mut self, interpret: bool) -> Self {
        self.interpret = interpret;
        self
    }

    pub fn with_max_functions_per_turn(mut self, max: usize) -> Self {
        self.max_functions_per_turn = max;
        self
    }

    fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(self.system_instruction.as_str()));
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user_parts(self.prompt_parts.clone()));
        messages
    }
}

/// A function that ran during dispatch.
#[derive(Debug, Clone)]
struct ExecutedCall {
    name: String,
    result: ResultEnvelope,
}

/// Sends requests to the model and runs the functions it picks.
pub struct ToolCallDispatcher {
    provider: Arc<dyn Provider>,
    registry: Arc<FunctionRegistry>,
    models: ModelsConfig,
    fallback_message: String,
}

impl ToolCallDispatcher {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<FunctionRegistry>) -> Self {
        Self {
            provider,
            registry,
            models: ModelsConfig::default(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    /// A dispatcher using the configured rosters and fallback message.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        registry: Arc<FunctionRegistry>,
        config: &AppConfig,
    ) -> Self {
        Self::new(provider, registry)
            .with_models(config.models.clone())
            .with_fallback_message(config.messages.fallback.clone())
    }

    pub fn with_models(mut self, models: ModelsConfig) -> Self {
        self.models = models;
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Run one request. Never fails: every error becomes an envelope.
    pub async fn execute(&self, request: ExecuteRequest) -> ResultEnvelope {
        if request.prompt_parts.is_empty() {
            return ResultEnvelope::bad_request("No prompt parts provided for execution");
        }

        match self.dispatch(&request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, provider = self.provider.name(), "Execution failed");
                ResultEnvelope::internal(self.fallback_message.as_str())
            }
        }
    }

    async fn dispatch(&self, request: &ExecuteRequest) -> Result<ResultEnvelope> {
        let declarations = self.registry.declarations(request.functions.as_deref())?;
        let models = self.models.roster(request.use_lite_models).to_vec();
        let mut messages = request.messages();

        info!(
            parts = request.prompt_parts.len(),
            history = request.history.len(),
            functions = declarations.len(),
            tool_choice = %request.tool_choice,
            lite = request.use_lite_models,
            "Dispatching request"
        );

        let initial = ProviderRequest::new(models.clone(), messages.clone())
            .with_temperature(request.temperature)
            .with_tools(declarations.to_vec())
            .with_tool_choice(request.tool_choice);
        let response = self.provider.complete(initial).await?;
        debug!(model = %response.model, "Received initial response");

        let calls = &response.message.tool_calls;
        if calls.is_empty() {
            info!("No function calls requested by the model");
            return Ok(ResultEnvelope::ok(response.message.text()));
        }

        let mut executed = Vec::new();
        for call in calls {
            if !call.is_function() {
                debug!(kind = %call.kind, id = %call.id, "Skipping non-function tool call");
                continue;
            }
            if executed.len() >= request.max_functions_per_turn {
                warn!(function = %call.name, "Function call beyond the per-turn limit ignored");
                continue;
            }
            info!(function = %call.name, arguments = %call.arguments, "Running requested function");
            let result = self.registry.invoke(&call.name, &call.arguments).await?;
            executed.push(ExecutedCall {
                name: call.name.clone(),
                result,
            });
        }

        let Some(first) = executed.first() else {
            return Err(Error::Validation(
                "model requested tool calls but none were functions".into(),
            ));
        };

        if !request.interpret {
            return Ok(first.result.clone());
        }

        for call in &executed {
            let data = serde_json::to_string(&call.result.data)?;
            messages.push(Message::assistant(format!(
                "Response after running function \"{}\": {data}",
                call.name
            )));
        }
        if executed.len() > 1 {
            messages.push(Message::assistant(MULTIPLE_CALLS_NOTE));
        }

        let interpretation = ProviderRequest::new(models, messages).with_tools(declarations.to_vec());
        let interpreted = self.provider.complete(interpretation).await?;
        debug!(model = %interpreted.model, "Received interpretation");

        let mut envelope = ResultEnvelope::ok(interpreted.message.text());
        if let Some(data) = first.result.data.clone() {
            envelope = envelope.with_data(data);
        }
        if let Some(references) = format_references(&executed) {
            envelope = envelope.with_references(references);
        }
        Ok(envelope)
    }
}

/// `<ref|here>` markers for every executed call that carried references.
fn format_references(executed: &[ExecutedCall]) -> Option<String> {
    let references: Vec<String> = executed
        .iter()
        .filter_map(|call| call.result.references.as_deref())
        .map(|r| format!("<{r}|here>"))
        .collect();
    (!references.is_empty()).then(|| references.join(", "))
}
