//! `signalforge config`: Configuration management commands.

use clap::Subcommand;
use signalforge_config::AppConfig;

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (keys redacted)
    Show,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
    /// Write a default config file if none exists
    Init,
}

pub fn run(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => show(),
        ConfigAction::Path => {
            println!("{}", config_path().display());
            Ok(())
        }
        ConfigAction::Validate => validate(),
        ConfigAction::Init => init(),
    }
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}

fn show() -> anyhow::Result<()> {
    let mut config = super::load_config()?;
    redact(&mut config);
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn redact(config: &mut AppConfig) {
    for endpoint in [&mut config.providers.chat, &mut config.providers.openai] {
        if endpoint.api_key.is_some() {
            endpoint.api_key = Some("***".into());
        }
    }
}

/// Problems that do not stop the config from loading but will stop commands from running.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.providers.chat.api_key.is_none() {
        warnings.push("No chat API key (set SIGNALFORGE_API_KEY or OPENROUTER_API_KEY); `execute` will fail");
    }
    if config.providers.openai.api_key.is_none() {
        warnings.push("No OpenAI API key (set OPENAI_API_KEY); `thread`, `assistant` and `embed` will fail");
    }
    if config.providers.assistant_id.is_none() {
        warnings.push("No default assistant (set SIGNALFORGE_ASSISTANT_ID); `thread` needs --assistant");
    }
    warnings
}

fn validate() -> anyhow::Result<()> {
    println!("Validating configuration...");
    let config = super::load_config()?;
    println!("   Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Lite models:  {}", config.models.lite.join(", "));
    println!("   Full models:  {}", config.models.full.join(", "));
    println!("   Chat API:     {}", config.providers.chat.api_url);
    println!("   Embeddings:   {} ({} chars)", config.embedding.model, config.embedding.max_chars);
    println!(
        "   Threads:      poll {}ms, max {} polls / {}s",
        config.threads.poll_interval_ms, config.threads.max_iterations, config.threads.max_wall_time_secs
    );
    Ok(())
}

fn init() -> anyhow::Result<()> {
    let path = config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    std::fs::create_dir_all(AppConfig::config_dir())?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Created {}", path.display());
    Ok(())
}
