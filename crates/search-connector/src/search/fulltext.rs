//! Fulltext clause.

use serde_json::{Map, Value, json};

use crate::config::Fuzziness;
use crate::types::IndexSchema;

/// Resolves the searched fields with their boosts (`title^2`).
///
/// An empty `requested` list means every fulltext field of the schema.
pub fn searched_fields(schema: &IndexSchema, requested: &[String]) -> Vec<String> {
    let ids: Vec<&str> = if requested.is_empty() {
        schema.fulltext_fields()
    } else {
        requested.iter().map(String::as_str).collect()
    };

    ids.into_iter()
        .map(|id| match schema.field(id).and_then(|f| f.boost) {
            Some(boost) if boost != 1.0 => format!("{}^{}", id, boost),
            _ => id.to_string(),
        })
        .collect()
}

/// Builds a `multi_match` clause; `fuzziness` of `None` matches exactly.
pub fn fulltext_clause(keys: &str, fields: &[String], fuzziness: Option<Fuzziness>) -> Value {
    let mut multi_match = Map::new();
    multi_match.insert("query".to_string(), json!(keys));
    if !fields.is_empty() {
        multi_match.insert("fields".to_string(), json!(fields));
    }
    if let Some(value) = fuzziness.and_then(|f| f.to_engine_value()) {
        multi_match.insert("fuzziness".to_string(), value);
    }
    json!({ "multi_match": multi_match })
}
