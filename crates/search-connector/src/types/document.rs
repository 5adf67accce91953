//! Items handed over for indexing and their encoded form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::LANGUAGE_FIELD;

/// An application item queued for indexing.
///
/// Field values are raw; the bulk encoder coerces them to the type declared
/// by the index schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexItem {
    /// Item id, used as the document id.
    pub id: String,

    /// Item language code.
    #[serde(default)]
    pub language: Option<String>,

    /// Raw values keyed by field id.
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<Value>>,
}

impl IndexItem {
    /// Creates an item without fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets the item language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Appends a value to a field.
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.entry(field.into()).or_default().push(value.into());
        self
    }

    /// Sets all values of a field.
    pub fn with_values(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.fields.insert(field.into(), values);
        self
    }
}

/// A document in the form sent to the engine.
///
/// Every indexable field holds a sequence, even when single-valued. The
/// document-index hook receives and returns this value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id.
    pub id: String,

    /// Item language, written to the reserved language field.
    pub language: Option<String>,

    /// Encoded values keyed by field id.
    pub fields: BTreeMap<String, Vec<Value>>,
}

impl Document {
    /// Creates an empty document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets the values of a field.
    pub fn set(&mut self, field: impl Into<String>, values: Vec<Value>) {
        self.fields.insert(field.into(), values);
    }

    /// Returns the values of a field.
    pub fn get(&self, field: &str) -> Option<&[Value]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Builds the `_source` body of the document.
    pub fn to_source(&self) -> Value {
        let mut source = Map::new();
        source.insert(
            LANGUAGE_FIELD.to_string(),
            self.language
                .as_ref()
                .map_or(Value::Null, |l| Value::String(l.clone())),
        );
        for (field, values) in &self.fields {
            source.insert(field.clone(), Value::Array(values.clone()));
        }
        Value::Object(source)
    }
}
