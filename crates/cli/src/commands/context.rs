//! Request context files.
//!
//! A context file is JSON holding the organisation's schema rows and the
//! per-request selections:
//!
//! ```json
//! {
//!   "organisation_id": "org-1",
//!   "object_types": [{"id": "feedback", "name": "Feedback"}],
//!   "metadata_types": [{"id": "summary", "name": "Summary", "data_type": "string"}],
//!   "selected_object_type_id": "feedback",
//!   "potential_parent_ids": []
//! }
//! ```

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use signalforge_core::context::RequestContext;
use signalforge_core::message::Message;
use signalforge_core::schema::{MetadataType, ObjectType};
use signalforge_functions::{FunctionRegistry, builtin_catalog};
use signalforge_schema::{build_function_properties, build_required_properties};

#[derive(Debug, Default, Deserialize)]
struct ContextFile {
    #[serde(default)]
    organisation_id: Option<String>,
    #[serde(default)]
    organisation_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    object_types: Vec<ObjectType>,
    #[serde(default)]
    metadata_types: Vec<MetadataType>,
    #[serde(default)]
    selected_object_type_id: Option<String>,
    #[serde(default)]
    potential_parent_ids: Vec<String>,
}

impl ContextFile {
    fn into_context(self) -> RequestContext {
        let mut builder = RequestContext::builder()
            .function_properties(build_function_properties(&self.object_types, &self.metadata_types))
            .required_properties(build_required_properties(&self.object_types, &self.metadata_types))
            .object_types(self.object_types)
            .metadata_types(self.metadata_types)
            .potential_parent_ids(self.potential_parent_ids);
        if let Some(id) = self.organisation_id {
            builder = builder.organisation(id, self.organisation_data);
        }
        if let Some(id) = self.selected_object_type_id {
            builder = builder.selected_object_type(id);
        }
        builder.build()
    }
}

pub fn parse_context(json: &str) -> anyhow::Result<RequestContext> {
    let file: ContextFile = serde_json::from_str(json).context("Invalid context file")?;
    Ok(file.into_context())
}

/// Load a context file, or an empty context when no path is given.
pub fn load_context(path: Option<&Path>) -> anyhow::Result<RequestContext> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_context(&json)
        }
        None => Ok(RequestContext::default()),
    }
}

/// A registry over the built-in groups, loading only `groups` when non-empty.
pub fn build_registry(context: RequestContext, groups: &[String]) -> anyhow::Result<FunctionRegistry> {
    let mut registry = FunctionRegistry::new(builtin_catalog(), context);
    let groups = (!groups.is_empty()).then_some(groups);
    registry.load_groups(groups)?;
    Ok(registry)
}

/// Chat history as a JSON array of `{role, content}` turns.
pub fn load_history(path: Option<&Path>) -> anyhow::Result<Vec<Message>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).context("Invalid chat history file")
}
