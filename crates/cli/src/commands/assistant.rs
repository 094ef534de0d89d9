//! `signalforge assistant`: create an assistant for the thread surface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use signalforge_agent::{AssistantProvisioner, AssistantRequest};
use signalforge_functions::FunctionRegistry;

use super::context::load_context;

#[derive(Debug, Args)]
pub struct AssistantArgs {
    /// Assistant name (default: the general assistant)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Instructions (default: the general assistant's)
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// Function groups to offer (default: data)
    #[arg(short, long = "group")]
    pub groups: Vec<String>,

    /// Request context file used to build the function schemas
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Leave out the code interpreter tool
    #[arg(long)]
    pub no_code_interpreter: bool,
}

impl AssistantArgs {
    fn request(&self) -> AssistantRequest {
        let mut request = AssistantRequest::general();
        if let Some(name) = &self.name {
            request.name = name.clone();
        }
        if let Some(instructions) = &self.instructions {
            request.instructions = instructions.clone();
        }
        if !self.groups.is_empty() {
            request = request.with_groups(self.groups.clone());
        }
        request.with_code_interpreter(!self.no_code_interpreter)
    }
}

pub async fn run(args: AssistantArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let threads = Arc::new(signalforge_providers::openai_from_config(&config)?);

    let context = load_context(args.context.as_deref())?;
    let mut registry = FunctionRegistry::new(signalforge_functions::builtin_catalog(), context);

    let provisioner = AssistantProvisioner::from_config(threads, &config);
    let result = provisioner.create_assistant(&mut registry, args.request()).await;
    if let Some(id) = result.data.as_ref().and_then(|d| d.as_str()) {
        eprintln!("  Set SIGNALFORGE_ASSISTANT_ID={id} to use it with `signalforge thread`.");
    }
    super::print_envelope(&result)
}
