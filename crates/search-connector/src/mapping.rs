//! Index settings and mapping generation.
//!
//! Each semantic field type maps to a fixed fragment:
//!
//! | Field type      | Mapping                                   |
//! |-----------------|-------------------------------------------|
//! | `string`        | `keyword`                                 |
//! | `text`          | `text` with a `keyword` sub-field         |
//! | `boolean`       | `boolean`                                 |
//! | `integer`       | `integer`                                 |
//! | `decimal`       | `float`                                   |
//! | `date`          | `date`                                    |
//! | `object`        | `object`, sub-fields mapped recursively   |
//! | `nested_object` | `nested`, sub-fields mapped recursively   |
//! | `location`      | `geo_point`                               |
//!
//! The reserved `id` and `_language` fields are always present.

use serde_json::{Map, Value, json};

use crate::types::{FieldSpec, FieldType, ID_FIELD, IndexSchema, LANGUAGE_FIELD};

/// Date formats accepted for `date` fields.
pub const DATE_FORMAT: &str = "strict_date_optional_time||epoch_second";

/// Returns the mapping fragment for a single field.
pub fn field_mapping(field: &FieldSpec) -> Value {
    match field.field_type {
        FieldType::String => json!({ "type": "keyword" }),
        FieldType::Text => json!({
            "type": "text",
            "fields": {
                "keyword": { "type": "keyword", "ignore_above": 256 }
            }
        }),
        FieldType::Boolean => json!({ "type": "boolean" }),
        FieldType::Integer => json!({ "type": "integer" }),
        FieldType::Decimal => json!({ "type": "float" }),
        FieldType::Date => json!({ "type": "date", "format": DATE_FORMAT }),
        FieldType::Object => json!({
            "type": "object",
            "properties": sub_field_properties(&field.sub_fields)
        }),
        FieldType::NestedObject => json!({
            "type": "nested",
            "properties": sub_field_properties(&field.sub_fields)
        }),
        FieldType::Location => json!({ "type": "geo_point" }),
    }
}

fn sub_field_properties(fields: &[FieldSpec]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|f| (f.id.clone(), field_mapping(f)))
        .collect();
    Value::Object(properties)
}

/// Returns the settings used to create the physical index.
pub fn index_settings(schema: &IndexSchema) -> Value {
    json!({
        "settings": {
            "index": {
                "number_of_shards": schema.options.number_of_shards,
                "number_of_replicas": schema.options.number_of_replicas,
            }
        }
    })
}

/// Builds complete mapping documents for an index.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingBuilder;

impl MappingBuilder {
    /// Creates a mapping builder.
    pub fn new() -> Self {
        Self
    }

    /// Builds the mapping document for `schema`.
    ///
    /// Analyzed fields listed in `autocomplete_fields` get `fielddata`
    /// enabled so terms aggregations can run on them; exact fields are
    /// aggregatable already.
    pub fn build(&self, schema: &IndexSchema, autocomplete_fields: &[String]) -> Value {
        let mut properties = Map::new();
        properties.insert(
            ID_FIELD.to_string(),
            json!({ "type": "keyword", "index": true }),
        );

        for field in schema.fields() {
            let mut fragment = field_mapping(field);
            if field.field_type.is_fulltext() && autocomplete_fields.contains(&field.id) {
                fragment["fielddata"] = json!(true);
            }
            properties.insert(field.id.clone(), fragment);
        }

        properties.insert(LANGUAGE_FIELD.to_string(), json!({ "type": "keyword" }));

        tracing::debug!(
            index = %schema.id,
            fields = properties.len(),
            "Built index mapping"
        );

        json!({ "properties": properties })
    }
}
