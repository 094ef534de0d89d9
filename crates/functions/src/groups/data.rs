//! The `data` group: classify incoming data and shape it into object records.
//!
//! Which functions are offered depends on the request context:
//! - `predictObjectTypeBeingReferenced` is always offered
//! - `processDataUsingGivenObjectsMetadataStructure` needs a selected object type
//! - `predictObjectParent` needs at least one candidate parent

use serde_json::{Value, json};
use signalforge_core::context::RequestContext;
use signalforge_core::envelope::ResultEnvelope;
use signalforge_core::error::FunctionError;
use signalforge_core::function::{FunctionEntry, FunctionGroup};
use signalforge_core::provider::FunctionDeclaration;
use signalforge_schema::build_object_schema;
use tracing::debug;

pub const GROUP_NAME: &str = "data";
pub const PREDICT_OBJECT_TYPE: &str = "predictObjectTypeBeingReferenced";
pub const PROCESS_DATA: &str = "processDataUsingGivenObjectsMetadataStructure";
pub const PREDICT_PARENT: &str = "predictObjectParent";

const UNKNOWN: &str = "unknown";

pub struct DataGroup;

impl FunctionGroup for DataGroup {
    fn name(&self) -> &str {
        GROUP_NAME
    }

    fn initialise(&self, context: &RequestContext) -> Vec<FunctionEntry> {
        let mut entries = vec![predict_object_type(context)];
        if let Some(entry) = process_data(context) {
            entries.push(entry);
        }
        if let Some(entry) = predict_parent(context) {
            entries.push(entry);
        }
        entries
    }
}

/// Enum options for a prediction: the candidates followed by `"unknown"`.
fn with_unknown(candidates: Vec<String>) -> Vec<String> {
    let mut options = candidates;
    options.push(UNKNOWN.to_string());
    options
}

/// Map the `"unknown"` sentinel to null.
fn prediction(value: &Value) -> Value {
    match value.as_str() {
        Some(UNKNOWN) | None => Value::Null,
        Some(id) => Value::String(id.to_string()),
    }
}

fn predict_object_type(context: &RequestContext) -> FunctionEntry {
    let declaration = FunctionDeclaration {
        name: PREDICT_OBJECT_TYPE.into(),
        description: "Predict which type of object is being referenced based on input.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "predictedObjectTypeName": {
                    "type": "string",
                    "description": "Name of estimated object type, or 'unknown' if none apply.",
                    "enum": with_unknown(context.object_type_ids()),
                }
            },
            "required": ["predictedObjectTypeName"],
            "additionalProperties": false,
        }),
    };

    FunctionEntry::from_fn(GROUP_NAME, declaration, |args| async move {
        let predicted = prediction(&args["predictedObjectTypeName"]);
        debug!(predicted = %predicted, "Predicted object type");
        Ok(ResultEnvelope::ok_with_data("Predicted object's type", predicted))
    })
}

fn process_data(context: &RequestContext) -> Option<FunctionEntry> {
    let object_type_id = context.selected_object_type_id.clone()?;
    let properties = context.selected_properties().cloned().unwrap_or_default();
    let object_type_name = context
        .object_type(&object_type_id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| object_type_id.clone());

    let declaration = FunctionDeclaration {
        name: PROCESS_DATA.into(),
        description: format!(
            "Structure the given data as a {object_type_name} object using its metadata properties."
        ),
        parameters: build_object_schema(&properties, context.selected_required()),
    };

    let organisation_id = context.organisation_id.clone();
    Some(FunctionEntry::from_fn(GROUP_NAME, declaration, move |args| {
        let object_type_id = object_type_id.clone();
        let organisation_id = organisation_id.clone();
        async move {
            let Value::Object(metadata) = args else {
                return Err(FunctionError::ExecutionFailed {
                    function: PROCESS_DATA.into(),
                    reason: "arguments must be an object".into(),
                });
            };
            let record = json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "related_object_type_id": object_type_id,
                "owner_organisation_id": organisation_id,
                "metadata": metadata,
            });
            Ok(ResultEnvelope::ok_with_data("Processed data into object", record))
        }
    }))
}

fn predict_parent(context: &RequestContext) -> Option<FunctionEntry> {
    if context.potential_parent_ids.is_empty() {
        return None;
    }

    let declaration = FunctionDeclaration {
        name: PREDICT_PARENT.into(),
        description: "Predict which of the candidate objects is the parent of the object being processed.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "predictedParentObjectId": {
                    "type": "string",
                    "description": "Id of the most likely parent object, or 'unknown' if none apply.",
                    "enum": with_unknown(context.potential_parent_ids.clone()),
                }
            },
            "required": ["predictedParentObjectId"],
            "additionalProperties": false,
        }),
    };

    Some(FunctionEntry::from_fn(GROUP_NAME, declaration, |args| async move {
        let predicted = prediction(&args["predictedParentObjectId"]);
        Ok(ResultEnvelope::ok_with_data("Predicted object's parent", predicted))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalforge_core::schema::{ObjectType, PropertyMap, PropertySchema};
    use std::sync::Arc;

    use crate::registry::{FunctionRegistry, GroupCatalog};

    fn object_type(id: &str) -> ObjectType {
        ObjectType {
            id: id.into(),
            name: id.to_uppercase(),
            description: None,
            parent_object_type_id: None,
        }
    }

    fn registry(context: RequestContext) -> FunctionRegistry {
        let mut catalog = GroupCatalog::new();
        catalog.register(Arc::new(DataGroup));
        let mut registry = FunctionRegistry::new(catalog, context);
        registry.load_group(GROUP_NAME).unwrap();
        registry
    }

    fn product_context() -> RequestContext {
        let mut product = PropertyMap::new();
        product.insert(
            "url".into(),
            PropertySchema {
                description: "URL".into(),
                kind: "string".into(),
                items: None,
                enum_values: None,
            },
        );
        let mut props = signalforge_core::schema::FunctionSchemaMap::new();
        props.insert("product".into(), product);
        let mut required = signalforge_core::schema::RequiredPropertyMap::new();
        required.insert("product".into(), vec!["url".into()]);

        RequestContext::builder()
            .organisation("org-1", serde_json::Map::new())
            .object_types(vec![object_type("product"), object_type("feedback")])
            .function_properties(props)
            .required_properties(required)
            .selected_object_type("product")
            .potential_parent_ids(vec!["p-1".into(), "p-2".into()])
            .build()
    }

    #[test]
    fn minimal_context_offers_only_type_prediction() {
        let reg = registry(RequestContext::default());
        assert_eq!(reg.names(), vec![PREDICT_OBJECT_TYPE]);
    }

    #[test]
    fn full_context_offers_all_functions() {
        let reg = registry(product_context());
        assert_eq!(reg.names(), vec![PREDICT_OBJECT_TYPE, PROCESS_DATA, PREDICT_PARENT]);
    }

    #[test]
    fn type_prediction_enum_lists_ids_and_unknown() {
        let reg = registry(product_context());
        let decl = &reg.resolve(PREDICT_OBJECT_TYPE).unwrap().declaration;
        assert_eq!(
            decl.parameters["properties"]["predictedObjectTypeName"]["enum"],
            json!(["product", "feedback", "unknown"])
        );
    }

    #[tokio::test]
    async fn classify_feedback() {
        let reg = registry(product_context());
        let result = reg
            .invoke(PREDICT_OBJECT_TYPE, r#"{"predictedObjectTypeName":"feedback"}"#)
            .await
            .unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.data, Some(json!("feedback")));
    }

    #[tokio::test]
    async fn unknown_prediction_is_null() {
        let reg = registry(product_context());
        let result = reg
            .invoke(PREDICT_OBJECT_TYPE, r#"{"predictedObjectTypeName":"unknown"}"#)
            .await
            .unwrap();
        assert_eq!(result.data, Some(Value::Null));
    }

    #[tokio::test]
    async fn prediction_outside_enum_is_rejected() {
        let reg = registry(product_context());
        let err = reg
            .invoke(PREDICT_OBJECT_TYPE, r#"{"predictedObjectTypeName":"order"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, FunctionError::ArgumentValidation { .. }));
    }

    #[tokio::test]
    async fn process_data_builds_object_record() {
        let reg = registry(product_context());
        let decl = &reg.resolve(PROCESS_DATA).unwrap().declaration;
        assert_eq!(decl.parameters["required"], json!(["url"]));

        let result = reg
            .invoke(PROCESS_DATA, r#"{"url":"https://example.com"}"#)
            .await
            .unwrap();
        let record = result.data.unwrap();
        assert_eq!(record["related_object_type_id"], "product");
        assert_eq!(record["owner_organisation_id"], "org-1");
        assert_eq!(record["metadata"]["url"], "https://example.com");
        assert!(uuid::Uuid::parse_str(record["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn process_data_requires_required_properties() {
        let reg = registry(product_context());
        let err = reg.invoke(PROCESS_DATA, "{}").await.unwrap_err();
        assert!(err.to_string().contains("\"url\""));
    }

    #[tokio::test]
    async fn parent_prediction() {
        let reg = registry(product_context());
        let result = reg
            .invoke(PREDICT_PARENT, r#"{"predictedParentObjectId":"p-2"}"#)
            .await
            .unwrap();
        assert_eq!(result.data, Some(json!("p-2")));
    }
}
