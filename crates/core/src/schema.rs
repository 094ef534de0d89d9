//! Organisation schema records and the property schemas derived from them.
//!
//! `ObjectType` and `MetadataType` mirror the storage rows; the derived maps
//! keep insertion order so generated function schemas are stable.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// An organisation-scoped category of storable entity (e.g. "feedback").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_object_type_id: Option<String>,
}

/// A typed field definition attached to one object type, or to all of them
/// when `owner_object_type_id` is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub data_type: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_array: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub owner_object_type_id: Option<String>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub allow_ai_update: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_required: bool,
}

fn default_true() -> bool {
    true
}

fn null_as_true<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or(true))
}

fn null_as_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

impl MetadataType {
    /// Whether this metadata applies to the given object type.
    pub fn applies_to(&self, object_type_id: &str) -> bool {
        match &self.owner_object_type_id {
            None => true,
            Some(owner) => owner == object_type_id,
        }
    }

    pub fn is_global(&self) -> bool {
        self.owner_object_type_id.is_none()
    }

    /// The description when present and non-empty.
    pub fn described(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// Item type of an array property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsSchema {
    #[serde(rename = "type")]
    pub kind: String,
}

/// JSON-Schema-like description of one metadata property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsSchema>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

/// Human-readable description of an object type and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeDescription {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub metadata: PropertyMap,
}

/// Metadata id → property schema.
pub type PropertyMap = IndexMap<String, PropertySchema>;

/// Object type id → description.
pub type ObjectTypeDescriptionMap = IndexMap<String, ObjectTypeDescription>;

/// Object type id → AI-editable property schemas.
pub type FunctionSchemaMap = IndexMap<String, PropertyMap>;

/// Object type id → ids of required AI-editable metadata.
pub type RequiredPropertyMap = IndexMap<String, Vec<String>>;
