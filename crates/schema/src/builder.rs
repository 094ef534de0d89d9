use signalforge_core::schema::{
    FunctionSchemaMap, ItemsSchema, MetadataType, ObjectType, ObjectTypeDescription,
    ObjectTypeDescriptionMap, PropertyMap, PropertySchema, RequiredPropertyMap,
};
use tracing::debug;

/// Describe every object type with the metadata it carries.
///
/// Global metadata (no owner) is included in every object type. Property
/// descriptions fall back to the metadata name.
pub fn build_object_type_descriptions(
    object_types: &[ObjectType],
    metadata_types: &[MetadataType],
) -> ObjectTypeDescriptionMap {
    object_types
        .iter()
        .map(|object_type| {
            let metadata = metadata_types
                .iter()
                .filter(|meta| meta.applies_to(&object_type.id))
                .map(|meta| {
                    let description = meta.described().unwrap_or(&meta.name).to_string();
                    (meta.id.clone(), property_schema(meta, description))
                })
                .collect();

            let description = ObjectTypeDescription {
                name: object_type.name.clone(),
                description: object_type.description.clone(),
                metadata,
            };
            (object_type.id.clone(), description)
        })
        .collect()
}

/// AI-editable property schemas for every object type.
///
/// Metadata with `allow_ai_update == false` is dropped. An object type with
/// no eligible metadata maps to an empty property map.
pub fn build_function_properties(
    object_types: &[ObjectType],
    metadata_types: &[MetadataType],
) -> FunctionSchemaMap {
    object_types
        .iter()
        .map(|object_type| {
            let properties: PropertyMap = editable_metadata(&object_type.id, metadata_types)
                .map(|meta| {
                    let description = match meta.described() {
                        Some(desc) => format!("{}: {}", meta.name, desc),
                        None => meta.name.clone(),
                    };
                    (meta.id.clone(), property_schema(meta, description))
                })
                .collect();

            debug!(
                object_type = %object_type.id,
                properties = properties.len(),
                "Built function properties"
            );
            (object_type.id.clone(), properties)
        })
        .collect()
}

/// Ids of required AI-editable metadata for every object type.
pub fn build_required_properties(
    object_types: &[ObjectType],
    metadata_types: &[MetadataType],
) -> RequiredPropertyMap {
    object_types
        .iter()
        .map(|object_type| {
            let required = editable_metadata(&object_type.id, metadata_types)
                .filter(|meta| meta.is_required)
                .map(|meta| meta.id.clone())
                .collect();
            (object_type.id.clone(), required)
        })
        .collect()
}

/// Wrap a property map into a JSON Schema object for a function declaration.
///
/// Required ids that are not among the properties are left out.
pub fn build_object_schema(properties: &PropertyMap, required: &[String]) -> serde_json::Value {
    let required: Vec<&String> = required
        .iter()
        .filter(|id| properties.contains_key(id.as_str()))
        .collect();

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn editable_metadata<'a>(
    object_type_id: &'a str,
    metadata_types: &'a [MetadataType],
) -> impl Iterator<Item = &'a MetadataType> + 'a {
    metadata_types
        .iter()
        .filter(move |meta| meta.applies_to(object_type_id) && meta.allow_ai_update)
}

fn property_schema(meta: &MetadataType, description: String) -> PropertySchema {
    let (kind, items) = if meta.is_array {
        (
            "array".to_string(),
            Some(ItemsSchema {
                kind: meta.data_type.clone(),
            }),
        )
    } else {
        (meta.data_type.clone(), None)
    };

    PropertySchema {
        description,
        kind,
        items,
        enum_values: meta.enum_values.clone(),
    }
}
