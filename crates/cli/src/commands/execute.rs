//! `signalforge execute`: one request with function calling.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use signalforge_agent::{ExecuteRequest, ToolCallDispatcher};
use signalforge_core::message::ContentPart;
use signalforge_core::provider::ToolChoice;

use super::context::{build_registry, load_context, load_history};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You help organise an organisation's data. Use the available functions when they apply.";

#[derive(Debug, Args)]
pub struct ExecuteArgs {
    /// Prompt text
    pub prompt: String,

    /// System instruction
    #[arg(short, long, default_value = DEFAULT_SYSTEM_INSTRUCTION)]
    pub system: String,

    /// Image URLs appended to the prompt
    #[arg(long = "image")]
    pub images: Vec<String>,

    /// Request context file (JSON)
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Chat history file (JSON array of {role, content})
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Function groups to load (default: all)
    #[arg(short, long = "group")]
    pub groups: Vec<String>,

    /// Only offer these functions
    #[arg(short, long = "function")]
    pub functions: Vec<String>,

    /// none, auto or required
    #[arg(long, default_value = "auto")]
    pub tool_choice: ToolChoice,

    /// Sampling temperature (default from config)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Use the full model roster instead of the lite one
    #[arg(long)]
    pub full: bool,

    /// Ask the model to interpret function results
    #[arg(long)]
    pub interpret: bool,

    /// How many requested functions to run per turn
    #[arg(long, default_value_t = 1)]
    pub max_functions: usize,
}

impl ExecuteArgs {
    fn request(&self, default_temperature: f32) -> ExecuteRequest {
        let mut parts = vec![ContentPart::text(self.prompt.as_str())];
        parts.extend(self.images.iter().map(|url| ContentPart::image_url(url.as_str())));

        let mut request = ExecuteRequest::new(self.system.as_str(), parts)
            .with_temperature(self.temperature.unwrap_or(default_temperature))
            .with_tool_choice(self.tool_choice)
            .with_lite_models(!self.full)
            .with_interpretation(self.interpret)
            .with_max_functions_per_turn(self.max_functions);
        if !self.functions.is_empty() {
            request = request.with_functions(self.functions.clone());
        }
        request
    }
}

pub async fn run(args: ExecuteArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let provider = Arc::new(signalforge_providers::chat_from_config(&config)?);

    let context = load_context(args.context.as_deref())?;
    let registry = Arc::new(build_registry(context, &args.groups)?);
    let history = load_history(args.history.as_deref())?;

    let request = args.request(config.models.temperature).with_history(history);
    let dispatcher = ToolCallDispatcher::from_config(provider, registry, &config);
    let result = dispatcher.execute(request).await;
    super::print_envelope(&result)
}
