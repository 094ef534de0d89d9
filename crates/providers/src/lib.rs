//! Provider implementations for SignalForge.
//!
//! The OpenAI-compatible adapter implements both
//! `signalforge_core::Provider` (chat + embeddings) and
//! `signalforge_core::ThreadProvider` (Assistants-style threads).
//! The router builds them from configuration.

pub mod assistants;
pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderSet, build_from_config, chat_from_config, openai_from_config};
