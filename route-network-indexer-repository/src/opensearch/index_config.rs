//! OpenSearch index settings and mappings.
//!
//! Translates a [`CollectionSchema`] into the body of a create-index request.

use serde_json::{json, Map, Value};

use crate::types::{CollectionSchema, FieldType, SchemaField};

/// Get the index settings and mappings for a collection schema.
///
/// The configuration includes:
/// - **search_as_you_type** for string fields, so names match as they are typed
/// - a **keyword** `raw` sub-field for sortable or faceted fields
/// - `dynamic: false`, so document properties outside the schema (such as
///   `id`) are stored in `_source` but never indexed
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 1 replica for redundancy
pub fn get_index_settings(schema: &CollectionSchema) -> Value {
    let properties: Map<String, Value> = schema
        .fields
        .iter()
        .map(|field| (field.name.clone(), field_mapping(field)))
        .collect();

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "dynamic": false,
            "properties": properties
        }
    })
}

fn field_mapping(field: &SchemaField) -> Value {
    match field.field_type {
        FieldType::String => {
            let mut mapping = json!({ "type": "search_as_you_type" });
            if field.sort || field.facet {
                mapping["fields"] = json!({
                    "raw": {
                        "type": "keyword"
                    }
                });
            }
            mapping
        }
    }
}
