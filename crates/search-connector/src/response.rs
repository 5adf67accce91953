//! Search response decoding.
//!
//! Hit sources are flattened so every leaf becomes its own field, keyed by
//! its path joined with `__`:
//!
//! ```text
//! {"variants": [{"color": "red"}, {"color": "blue"}], "price": [19.99]}
//!   => variants__color: ["red", "blue"], price: [19.99]
//! ```
//!
//! Fields the schema declares as `object` or `nested_object` are also kept in
//! their original shape under their own id.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::search::SPELLING_SUGGESTION;
use crate::types::{
    FacetQueryType, FacetRequest, FacetTerm, IndexSchema, Query, RAW_RESPONSE_KEY, ResultItem,
    ResultSet,
};

/// Separator joining the path segments of flattened fields.
pub const FLATTEN_SEPARATOR: &str = "__";

/// Nesting depth of facet aggregations produced by the query builder.
const EXPECTED_FACET_DEPTH: usize = 2;

/// Hard limit of the facet descent.
const MAX_FACET_DEPTH: usize = 8;

/// Decodes raw engine responses into result sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decodes `raw`, the response to `query`.
    pub fn decode(&self, query: &Query, raw: &Value, schema: &IndexSchema) -> ResultSet {
        let mut results = ResultSet::empty();
        results.result_count = total_hits(raw);

        if let Some(hits) = raw.pointer("/hits/hits").and_then(Value::as_array) {
            results.items = hits.iter().map(|hit| decode_hit(hit, schema)).collect();
        }

        results.spelling_suggestions = spelling_suggestions(raw);

        if query.facets_enabled() {
            if let Some(aggregations) = raw.get("aggregations").and_then(Value::as_object) {
                results.facets = decode_facets(&query.facets, aggregations);
            }
        }

        results
            .extra
            .insert(RAW_RESPONSE_KEY.to_string(), raw.clone());
        results
    }
}

fn total_hits(raw: &Value) -> u64 {
    match raw.pointer("/hits/total") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(total) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
        None => 0,
    }
}

fn decode_hit(hit: &Value, schema: &IndexSchema) -> ResultItem {
    let id = match hit.get("_id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let mut fields = BTreeMap::new();
    if let Some(source) = hit.get("_source").and_then(Value::as_object) {
        flatten_object(source, "", &mut fields);

        for (key, value) in source {
            if schema.field_type(key).is_some_and(|t| t.is_complex()) {
                fields.insert(key.clone(), as_sequence(value));
            }
        }
    }

    ResultItem {
        id,
        score: hit.get("_score").and_then(Value::as_f64),
        fields,
    }
}

/// Flattens an object into `__`-joined leaf keys with sequence values.
pub fn flatten(source: &Value) -> BTreeMap<String, Vec<Value>> {
    let mut fields = BTreeMap::new();
    match source {
        Value::Object(map) => flatten_object(map, "", &mut fields),
        other => flatten_value(other, "", &mut fields),
    }
    fields
}

fn flatten_object(map: &Map<String, Value>, prefix: &str, out: &mut BTreeMap<String, Vec<Value>>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, FLATTEN_SEPARATOR, key)
        };
        flatten_value(value, &path, out);
    }
}

fn flatten_value(value: &Value, path: &str, out: &mut BTreeMap<String, Vec<Value>>) {
    match value {
        Value::Null => {}
        Value::Object(map) if map.is_empty() => {
            out.entry(path.to_string()).or_default();
        }
        Value::Object(map) => flatten_object(map, path, out),
        Value::Array(values) => {
            out.entry(path.to_string()).or_default();
            for value in values {
                flatten_value(value, path, out);
            }
            // Arrays of objects leave only their leaf keys behind
            if out.get(path).is_some_and(Vec::is_empty) && !values.is_empty() {
                out.remove(path);
            }
        }
        scalar => out.entry(path.to_string()).or_default().push(scalar.clone()),
    }
}

fn as_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Collects every suggestion text, in engine order.
fn spelling_suggestions(raw: &Value) -> Vec<String> {
    raw.pointer(&format!("/suggest/{}", SPELLING_SUGGESTION))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("options").and_then(Value::as_array))
                .flatten()
                .filter_map(|option| option.get("text").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn decode_facets(
    facets: &BTreeMap<String, FacetRequest>,
    aggregations: &Map<String, Value>,
) -> BTreeMap<String, Vec<FacetTerm>> {
    let mut decoded = BTreeMap::new();
    for (facet_id, facet) in facets {
        let Some(aggregation) = aggregations.get(facet_id) else {
            continue;
        };
        let terms = facet_buckets(facet_id, facet, aggregation)
            .into_iter()
            .filter(|(_, count)| *count >= facet.min_count)
            .map(|(key, count)| FacetTerm {
                value: format_facet_value(&key),
                count,
            })
            .collect();
        decoded.insert(facet_id.clone(), terms);
    }
    decoded
}

/// Descends through containers keyed by the facet id until buckets (or, for
/// range facets, min/max values) are found.
fn facet_buckets(facet_id: &str, facet: &FacetRequest, aggregation: &Value) -> Vec<(Value, u64)> {
    let doc_count = aggregation.get("doc_count").and_then(Value::as_u64).unwrap_or(0);
    let mut current = aggregation;

    for depth in 1..=MAX_FACET_DEPTH {
        if depth > EXPECTED_FACET_DEPTH {
            tracing::warn!(facet = %facet_id, depth, "Facet aggregation nested deeper than expected");
        }

        match facet.query_type {
            FacetQueryType::Range => {
                let min = metric_value(current, "min");
                let max = metric_value(current, "max");
                if min.is_some() || max.is_some() {
                    return [min, max]
                        .into_iter()
                        .flatten()
                        .map(|value| (value, doc_count))
                        .collect();
                }
            }
            FacetQueryType::Terms => {
                if let Some(buckets) = current.get("buckets").and_then(Value::as_array) {
                    return buckets
                        .iter()
                        .map(|bucket| {
                            let key = bucket.get("key").cloned().unwrap_or(Value::Null);
                            let count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);
                            (key, count)
                        })
                        .collect();
                }
            }
        }

        match current.get(facet_id) {
            Some(inner) => current = inner,
            None => break,
        }
    }

    Vec::new()
}

fn metric_value(aggregation: &Value, name: &str) -> Option<Value> {
    aggregation
        .get(name)
        .and_then(|metric| metric.get("value"))
        .filter(|value| !value.is_null())
        .cloned()
}

/// Formats a bucket key the way facet filter values are written: `"key"`,
/// or `!` for the empty bucket.
pub fn format_facet_value(key: &Value) -> String {
    let text = match key {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if text.is_empty() {
        "!".to_string()
    } else {
        format!("\"{}\"", text)
    }
}
