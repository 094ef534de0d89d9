//! Function trait: the abstraction over locally implemented callables.
//!
//! A function pairs a declaration (what the model sees) with an
//! implementation (what runs when the model asks for it). Functions are
//! produced by [`FunctionGroup`]s from an immutable [`RequestContext`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use crate::context::RequestContext;
use crate::envelope::ResultEnvelope;
use crate::error::FunctionError;
use crate::provider::FunctionDeclaration;

/// The core Function trait.
#[async_trait]
pub trait Function: Send + Sync {
    /// The declaration offered to the model.
    fn declaration(&self) -> FunctionDeclaration;

    /// Run the function with already-validated arguments.
    async fn call(&self, arguments: serde_json::Value) -> Result<ResultEnvelope, FunctionError>;
}

type BoxedCall = Pin<Box<dyn Future<Output = Result<ResultEnvelope, FunctionError>> + Send>>;

/// A function backed by a closure.
struct ClosureFunction {
    declaration: FunctionDeclaration,
    handler: Box<dyn Fn(serde_json::Value) -> BoxedCall + Send + Sync>,
}

#[async_trait]
impl Function for ClosureFunction {
    fn declaration(&self) -> FunctionDeclaration {
        self.declaration.clone()
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<ResultEnvelope, FunctionError> {
        (self.handler)(arguments).await
    }
}

/// A named (declaration, implementation) pair, tagged with the group it came from.
#[derive(Clone)]
pub struct FunctionEntry {
    pub name: String,
    pub group: String,
    pub declaration: FunctionDeclaration,
    implementation: Arc<dyn Function>,
}

impl FunctionEntry {
    pub fn new(group: impl Into<String>, implementation: Arc<dyn Function>) -> Self {
        let declaration = implementation.declaration();
        Self {
            name: declaration.name.clone(),
            group: group.into(),
            declaration,
            implementation,
        }
    }

    /// Build an entry from a declaration and an async closure.
    pub fn from_fn<F, Fut>(group: impl Into<String>, declaration: FunctionDeclaration, handler: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResultEnvelope, FunctionError>> + Send + 'static,
    {
        let implementation = ClosureFunction {
            declaration,
            handler: Box::new(move |args| Box::pin(handler(args))),
        };
        Self::new(group, Arc::new(implementation))
    }

    pub async fn call(&self, arguments: serde_json::Value) -> Result<ResultEnvelope, FunctionError> {
        self.implementation.call(arguments).await
    }
}

impl std::fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionEntry")
            .field("name", &self.name)
            .field("group", &self.group)
            .finish()
    }
}

/// A named source of function entries.
pub trait FunctionGroup: Send + Sync {
    fn name(&self) -> &str;

    /// Build this group's entries for the given request.
    fn initialise(&self, context: &RequestContext) -> Vec<FunctionEntry>;
}
