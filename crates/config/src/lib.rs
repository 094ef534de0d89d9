//! Configuration loading, validation, and management for SignalForge.
//!
//! Loads configuration from `~/.signalforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.signalforge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model rosters and sampling defaults
    #[serde(default)]
    pub models: ModelsConfig,

    /// Upstream endpoints and credentials
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Embedding model and character budget
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Thread-run polling bounds
    #[serde(default)]
    pub threads: ThreadsConfig,

    /// User-facing messages
    #[serde(default)]
    pub messages: MessagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Cheaper models tried in order for routine calls
    #[serde(default = "default_lite_models")]
    pub lite: Vec<String>,

    /// Stronger models tried in order; the first also backs created assistants
    #[serde(default = "default_full_models")]
    pub full: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_lite_models() -> Vec<String> {
    vec!["openai/gpt-4o-mini".into(), "google/gemini-flash-1.5".into()]
}
fn default_full_models() -> Vec<String> {
    vec!["openai/gpt-4o".into(), "anthropic/claude-3.5-sonnet".into()]
}
fn default_temperature() -> f32 {
    0.5
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            lite: default_lite_models(),
            full: default_full_models(),
            temperature: default_temperature(),
        }
    }
}

impl ModelsConfig {
    /// The roster to use for a call.
    pub fn roster(&self, lite: bool) -> &[String] {
        if lite { &self.lite } else { &self.full }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Assistant used by `thread` when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,

    /// OpenAI-compatible chat endpoint (model rosters are routed here)
    #[serde(default = "default_chat_endpoint")]
    pub chat: EndpointConfig,

    /// OpenAI endpoint for embeddings, threads and assistants
    #[serde(default = "default_openai_endpoint")]
    pub openai: EndpointConfig,
}

fn default_chat_endpoint() -> EndpointConfig {
    EndpointConfig {
        api_url: "https://openrouter.ai/api/v1".into(),
        api_key: None,
    }
}
fn default_openai_endpoint() -> EndpointConfig {
    EndpointConfig {
        api_url: "https://api.openai.com/v1".into(),
        api_key: None,
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            chat: default_chat_endpoint(),
            openai: default_openai_endpoint(),
            assistant_id: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Requested vector size; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,

    /// Character budget for text sent to the embedding model
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_max_chars() -> usize {
    512
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensions: None,
            max_chars: default_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadsConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_max_wall_time_secs")]
    pub max_wall_time_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}
fn default_max_iterations() -> u32 {
    120
}
fn default_max_wall_time_secs() -> u64 {
    300
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_iterations: default_max_iterations(),
            max_wall_time_secs: default_max_wall_time_secs(),
        }
    }
}

impl ThreadsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wall_time(&self) -> Duration {
        Duration::from_secs(self.max_wall_time_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Returned whenever a request fails for an internal reason
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Oops! I was unable to get a result. Please try again shortly.";

fn default_fallback() -> String {
    DEFAULT_FALLBACK_MESSAGE.into()
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.signalforge/config.toml).
    ///
    /// Environment variables override the file:
    /// - `SIGNALFORGE_API_KEY`, then `OPENROUTER_API_KEY` (chat endpoint)
    /// - `OPENAI_API_KEY` (embeddings, threads, assistants)
    /// - `SIGNALFORGE_ASSISTANT_ID`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("SIGNALFORGE_API_KEY").or_else(|| lookup("OPENROUTER_API_KEY")) {
            self.providers.chat.api_key = Some(key);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.providers.openai.api_key = Some(key);
        }
        if let Some(id) = lookup("SIGNALFORGE_ASSISTANT_ID") {
            self.providers.assistant_id = Some(id);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".signalforge")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.models.temperature) {
            return Err(ConfigError::ValidationError(
                "models.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.models.lite.is_empty() || self.models.full.is_empty() {
            return Err(ConfigError::ValidationError(
                "models.lite and models.full must each name at least one model".into(),
            ));
        }

        if self.embedding.max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.max_chars must be > 0".into(),
            ));
        }

        if self.threads.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "threads.poll_interval_ms must be > 0".into(),
            ));
        }

        if self.threads.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "threads.max_iterations must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.models.temperature, 0.5);
        assert_eq!(config.embedding.max_chars, 512);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.threads.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.threads.max_iterations, 120);
        assert_eq!(config.messages.fallback, DEFAULT_FALLBACK_MESSAGE);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.models.lite, config.models.lite);
        assert_eq!(parsed.providers.chat.api_url, config.providers.chat.api_url);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.models.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_roster_rejected() {
        let mut config = AppConfig::default();
        config.models.full.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("models.lite"));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut config = AppConfig::default();
        config.threads.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.providers.chat.api_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[models]\nlite = [\"a/small\"]\n\n[threads]\nmax_iterations = 10\n"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.models.lite, vec!["a/small"]);
        assert_eq!(config.models.full, default_full_models());
        assert_eq!(config.threads.max_iterations, 10);
        assert_eq!(config.threads.max_wall_time_secs, 300);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[models\nlite = 3").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_keys() {
        let env: HashMap<&str, &str> = [
            ("OPENROUTER_API_KEY", "or-key"),
            ("OPENAI_API_KEY", "oa-key"),
            ("SIGNALFORGE_ASSISTANT_ID", "asst_1"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.providers.chat.api_key.as_deref(), Some("or-key"));
        assert_eq!(config.providers.openai.api_key.as_deref(), Some("oa-key"));
        assert_eq!(config.providers.assistant_id.as_deref(), Some("asst_1"));
    }

    #[test]
    fn signalforge_key_wins_over_openrouter() {
        let mut config = AppConfig::default();
        config.apply_env(|k| match k {
            "SIGNALFORGE_API_KEY" => Some("primary".into()),
            "OPENROUTER_API_KEY" => Some("secondary".into()),
            _ => None,
        });
        assert_eq!(config.providers.chat.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn debug_redacts_keys() {
        let mut config = AppConfig::default();
        config.providers.openai.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn roster_selects_lite_or_full() {
        let models = ModelsConfig::default();
        assert_eq!(models.roster(true), models.lite.as_slice());
        assert_eq!(models.roster(false), models.full.as_slice());
    }
}
