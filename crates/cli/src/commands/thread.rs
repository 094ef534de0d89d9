//! `signalforge thread`: run a prompt on an assistant thread.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use signalforge_agent::{ThreadRequest, ThreadRunStateMachine};
use signalforge_config::AppConfig;

use super::context::{build_registry, load_context, load_history};

#[derive(Debug, Args)]
pub struct ThreadArgs {
    /// Prompt text
    pub prompt: String,

    /// Assistant to run (default: providers.assistant_id or SIGNALFORGE_ASSISTANT_ID)
    #[arg(short, long)]
    pub assistant: Option<String>,

    /// Request context file (JSON)
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Chat history file placed on the thread before the prompt
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Function groups to load (default: all)
    #[arg(short, long = "group")]
    pub groups: Vec<String>,
}

fn assistant_id(args: &ThreadArgs, config: &AppConfig) -> anyhow::Result<String> {
    args.assistant
        .clone()
        .or_else(|| config.providers.assistant_id.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No assistant id. Pass --assistant, set SIGNALFORGE_ASSISTANT_ID, or run `signalforge assistant` first."
            )
        })
}

pub async fn run(args: ThreadArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let assistant_id = assistant_id(&args, &config)?;
    let threads = Arc::new(signalforge_providers::openai_from_config(&config)?);

    let context = load_context(args.context.as_deref())?;
    let registry = Arc::new(build_registry(context, &args.groups)?);
    let history = load_history(args.history.as_deref())?;

    let machine = ThreadRunStateMachine::from_config(threads, registry, &config);
    let request = ThreadRequest::new(assistant_id, args.prompt).with_history(history);
    let result = machine.execute_thread(request).await;
    super::print_envelope(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(assistant: Option<&str>) -> ThreadArgs {
        ThreadArgs {
            prompt: "hi".into(),
            assistant: assistant.map(str::to_string),
            context: None,
            history: None,
            groups: Vec::new(),
        }
    }

    #[test]
    fn flag_beats_configured_assistant() {
        let mut config = AppConfig::default();
        config.providers.assistant_id = Some("asst_config".into());
        assert_eq!(assistant_id(&args(Some("asst_flag")), &config).unwrap(), "asst_flag");
        assert_eq!(assistant_id(&args(None), &config).unwrap(), "asst_config");
    }

    #[test]
    fn missing_assistant_is_an_error() {
        let err = assistant_id(&args(None), &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--assistant"));
    }
}
