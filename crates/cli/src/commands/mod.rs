pub mod assistant;
pub mod config_cmd;
pub mod context;
pub mod embed;
pub mod execute;
pub mod schema;
pub mod thread;

use serde::Serialize;
use signalforge_config::AppConfig;
use signalforge_core::envelope::ResultEnvelope;

pub fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))
}

/// Print an envelope as JSON and fail the command when it is not a success.
pub fn print_envelope<T: Serialize>(envelope: &ResultEnvelope<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    if envelope.is_success() {
        Ok(())
    } else {
        anyhow::bail!("request failed with status {}", envelope.status)
    }
}
