//! Immutable per-request context handed to function groups.
//!
//! Everything a function group needs to build its declarations (which
//! organisation, which object types exist, which one is selected, which
//! parents are candidates) is fixed when the context is built.

use serde::{Deserialize, Serialize};
use crate::schema::{FunctionSchemaMap, MetadataType, ObjectType, PropertyMap, RequiredPropertyMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    pub organisation_id: Option<String>,

    #[serde(default)]
    pub organisation_data: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub object_types: Vec<ObjectType>,

    #[serde(default)]
    pub metadata_types: Vec<MetadataType>,

    /// AI-editable property schemas per object type
    #[serde(default)]
    pub function_properties: FunctionSchemaMap,

    /// Required AI-editable metadata ids per object type
    #[serde(default)]
    pub required_properties: RequiredPropertyMap,

    /// The object type chosen for the data being processed
    #[serde(default)]
    pub selected_object_type_id: Option<String>,

    /// Candidate parent object ids for the object being processed
    #[serde(default)]
    pub potential_parent_ids: Vec<String>,
}

impl RequestContext {
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Ids of every known object type, in load order.
    pub fn object_type_ids(&self) -> Vec<String> {
        self.object_types.iter().map(|t| t.id.clone()).collect()
    }

    pub fn object_type(&self, id: &str) -> Option<&ObjectType> {
        self.object_types.iter().find(|t| t.id == id)
    }

    /// Property schemas of the selected object type, if one is selected and known.
    pub fn selected_properties(&self) -> Option<&PropertyMap> {
        self.selected_object_type_id
            .as_deref()
            .and_then(|id| self.function_properties.get(id))
    }

    /// Required metadata ids of the selected object type.
    pub fn selected_required(&self) -> &[String] {
        self.selected_object_type_id
            .as_deref()
            .and_then(|id| self.required_properties.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    inner: RequestContext,
}

impl RequestContextBuilder {
    pub fn organisation(
        mut self,
        id: impl Into<String>,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.inner.organisation_id = Some(id.into());
        self.inner.organisation_data = data;
        self
    }

    pub fn object_types(mut self, object_types: Vec<ObjectType>) -> Self {
        self.inner.object_types = object_types;
        self
    }

    pub fn metadata_types(mut self, metadata_types: Vec<MetadataType>) -> Self {
        self.inner.metadata_types = metadata_types;
        self
    }

    pub fn function_properties(mut self, properties: FunctionSchemaMap) -> Self {
        self.inner.function_properties = properties;
        self
    }

    pub fn required_properties(mut self, required: RequiredPropertyMap) -> Self {
        self.inner.required_properties = required;
        self
    }

    pub fn selected_object_type(mut self, id: impl Into<String>) -> Self {
        self.inner.selected_object_type_id = Some(id.into());
        self
    }

    pub fn potential_parent_ids(mut self, ids: Vec<String>) -> Self {
        self.inner.potential_parent_ids = ids;
        self
    }

    pub fn build(self) -> RequestContext {
        self.inner
    }
}
