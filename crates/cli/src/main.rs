//! SignalForge CLI: the main entry point.
//!
//! Commands:
//! - `execute`: One request with function calling
//! - `thread`: Run a prompt on an assistant thread
//! - `assistant`: Create an assistant backed by the function registry
//! - `embed`: Embed text or a JSON record
//! - `schema`: Show the function schemas compiled from a context file
//! - `config`: Inspect and initialise configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "signalforge",
    about = "SignalForge: tool-calling extraction over organisation-defined schemas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request and run the function the model picks
    Execute(commands::execute::ExecuteArgs),

    /// Run a prompt on an assistant thread until it finishes
    Thread(commands::thread::ThreadArgs),

    /// Create an assistant offering the registry's functions
    Assistant(commands::assistant::AssistantArgs),

    /// Embed text or a JSON record
    Embed(commands::embed::EmbedArgs),

    /// Print the schemas compiled from a context file
    Schema(commands::schema::SchemaArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config_cmd::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Execute(args) => commands::execute::run(args).await,
        Commands::Thread(args) => commands::thread::run(args).await,
        Commands::Assistant(args) => commands::assistant::run(args).await,
        Commands::Embed(args) => commands::embed::run(args).await,
        Commands::Schema(args) => commands::schema::run(args),
        Commands::Config { action } => commands::config_cmd::run(action),
    }
}
