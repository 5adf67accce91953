//! Bulk document encoding.
//!
//! Field values are coerced to the type their [`FieldSpec`] declares before a
//! document joins a batch:
//!
//! - `string`: scalars become strings, arrays and objects pass through
//! - `text`: HTML is reduced to plain text
//! - `boolean`, `integer`, `decimal`: converted to the primitive
//! - `date`: normalized to RFC 3339 (UTC) or epoch seconds
//! - `object`, `nested_object`, `location`: passed through
//!
//! Values always stay sequences, even single ones. Fields without values are
//! left out of the document.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value, json};

use crate::client::{BulkOperation, BulkRequest};
use crate::hooks::Hooks;
use crate::naming::IndexNaming;
use crate::types::{Document, FieldType, IndexItem, IndexSchema};

/// Encodes items and deletions into bulk batches.
#[derive(Debug, Clone)]
pub struct BulkEncoder {
    naming: IndexNaming,
    hooks: Arc<Hooks>,
}

impl BulkEncoder {
    /// Creates an encoder.
    pub fn new(naming: IndexNaming, hooks: Arc<Hooks>) -> Self {
        Self { naming, hooks }
    }

    /// Encodes items for indexing; the document hook runs once per item.
    pub fn encode_index_batch(&self, schema: &IndexSchema, items: &[IndexItem]) -> BulkRequest {
        let mut request = BulkRequest::new(self.naming.physical_name(&schema.id));
        for item in items {
            let document = self.hooks.document.apply(encode_document(schema, item));
            request.operations.push(BulkOperation::Index {
                source: document.to_source(),
                id: document.id,
            });
        }
        request
    }

    /// Encodes deletions, one operation per id.
    pub fn encode_delete_batch(&self, schema: &IndexSchema, ids: &[String]) -> BulkRequest {
        let mut request = BulkRequest::new(self.naming.physical_name(&schema.id));
        request.operations = ids
            .iter()
            .map(|id| BulkOperation::Delete { id: id.clone() })
            .collect();
        request
    }
}

/// Builds the document of one item with coerced values.
pub fn encode_document(schema: &IndexSchema, item: &IndexItem) -> Document {
    let mut document = Document::new(item.id.clone());
    document.language = item.language.clone();

    for (field, values) in &item.fields {
        if values.is_empty() {
            continue;
        }
        let coerced = match schema.field_type(field) {
            Some(field_type) => values.iter().map(|v| coerce_value(field_type, v)).collect(),
            None => {
                tracing::debug!(index = %schema.id, field = %field, "Indexing field unknown to the schema as-is");
                values.clone()
            }
        };
        document.set(field.clone(), coerced);
    }

    document
}

/// Coerces a raw value to the representation of a field type.
pub fn coerce_value(field_type: FieldType, raw: &Value) -> Value {
    match field_type {
        FieldType::String => match raw {
            Value::Array(_) | Value::Object(_) | Value::String(_) => raw.clone(),
            Value::Null => json!(""),
            other => json!(other.to_string()),
        },
        FieldType::Text => json!(to_text(raw)),
        FieldType::Boolean => json!(truthy(raw)),
        FieldType::Integer => json!(to_number(raw).trunc() as i64),
        FieldType::Decimal => Number::from_f64(to_number(raw)).map_or(Value::Null, Value::Number),
        FieldType::Date => to_date(raw),
        FieldType::Object | FieldType::NestedObject | FieldType::Location => raw.clone(),
    }
}

/// Strips HTML tags and normalizes whitespace.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn to_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => strip_html_tags(s),
        Value::Null => String::new(),
        // Processed text arrives as {"text": ..., "format": ...}
        Value::Object(map) => map.get("text").map(to_text).unwrap_or_default(),
        Value::Array(values) => values.iter().map(to_text).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(values) => !values.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn to_number(raw: &Value) -> f64 {
    match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => leading_number(s),
        _ => 0.0,
    }
}

/// Parses the numeric prefix of a string, `0.0` when there is none.
fn leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '-' | '+' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

fn to_date(raw: &Value) -> Value {
    match raw {
        Value::Number(n) => n.as_i64().map_or_else(|| raw.clone(), |secs| json!(secs)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return json!(secs);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return json!(
                    dt.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                );
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return json!(
                    dt.and_utc()
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                );
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return json!(date.format("%Y-%m-%d").to_string());
            }
            json!(s)
        }
        other => other.clone(),
    }
}
