//! # SignalForge Core
//!
//! Domain types, traits, and error definitions for the SignalForge
//! tool-calling engine. This crate does no I/O: it defines the domain model
//! that the schema, function, embedding, provider and agent crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability is defined as a trait here:
//! - [`Provider`] for chat completions and embeddings
//! - [`ThreadProvider`] for persistent threads and runs
//! - [`Function`] / [`FunctionGroup`] for locally executed callables
//!
//! Every public operation in the workspace reports its outcome as a
//! [`ResultEnvelope`].

pub mod context;
pub mod envelope;
pub mod error;
pub mod function;
pub mod message;
pub mod provider;
pub mod schema;
pub mod thread;

// Re-export key types at crate root for ergonomics
pub use context::RequestContext;
pub use envelope::ResultEnvelope;
pub use error::{Error, FunctionError, ProviderError, Result, ThreadError};
pub use function::{Function, FunctionEntry, FunctionGroup};
pub use message::{ContentPart, Message, MessageContent, MessageToolCall, Role};
pub use provider::{FunctionDeclaration, Provider, ProviderRequest, ProviderResponse, ToolChoice};
pub use schema::{MetadataType, ObjectType, PropertySchema};
pub use thread::{Run, RunStatus, ThreadMessage, ThreadProvider, ToolOutput};
