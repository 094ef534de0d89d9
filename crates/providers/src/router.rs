//! Provider construction from configuration.
//!
//! Chat completions go to the configured chat endpoint (OpenRouter by
//! default) so model rosters can fall back across vendors. Embeddings,
//! threads and assistants go to the OpenAI endpoint.

use std::sync::Arc;

use signalforge_config::{AppConfig, EndpointConfig};
use signalforge_core::error::ProviderError;
use signalforge_core::provider::Provider;
use signalforge_core::thread::ThreadProvider;

use crate::openai_compat::OpenAiCompatProvider;

/// The providers a SignalForge process talks to.
pub struct ProviderSet {
    pub chat: Arc<dyn Provider>,
    pub embeddings: Arc<dyn Provider>,
    pub threads: Arc<dyn ThreadProvider>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("chat", &self.chat.name())
            .field("embeddings", &self.embeddings.name())
            .field("threads", &self.threads.name())
            .finish()
    }
}

fn endpoint(name: &str, config: &EndpointConfig, env_hint: &str) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(format!("No API key for the {name} endpoint (set {env_hint})"))
    })?;
    Ok(OpenAiCompatProvider::new(name, &config.api_url, api_key))
}

/// The chat-completion provider.
pub fn chat_from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    endpoint("chat", &config.providers.chat, "SIGNALFORGE_API_KEY or OPENROUTER_API_KEY")
}

/// The OpenAI provider used for embeddings, threads and assistants.
pub fn openai_from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    endpoint("openai", &config.providers.openai, "OPENAI_API_KEY")
}

/// Build every provider from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderSet, ProviderError> {
    let chat = Arc::new(chat_from_config(config)?);
    let openai = Arc::new(openai_from_config(config)?);
    Ok(ProviderSet {
        chat,
        embeddings: openai.clone(),
        threads: openai,
    })
}
