//! Decoded search results.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extra-data key holding the raw engine response.
pub const RAW_RESPONSE_KEY: &str = "elasticsearch_response";

/// A single hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Document id.
    pub id: String,
    /// Relevance score; absent when the engine did not score the hit.
    pub score: Option<f64>,
    /// Field values, always as sequences.
    pub fields: BTreeMap<String, Vec<Value>>,
}

impl ResultItem {
    /// Returns the values of a field.
    pub fn field(&self, id: &str) -> Option<&[Value]> {
        self.fields.get(id).map(Vec::as_slice)
    }
}

/// A facet value and the number of matching documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetTerm {
    /// Filter literal: a quoted value, or `!` for the empty bucket.
    pub value: String,
    /// Document count.
    pub count: u64,
}

/// Outcome of a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Total number of matching documents.
    pub result_count: u64,
    /// Hits in engine order.
    pub items: Vec<ResultItem>,
    /// Spelling corrections in engine order.
    pub spelling_suggestions: Vec<String>,
    /// Facet terms keyed by facet id.
    pub facets: BTreeMap<String, Vec<FacetTerm>>,
    /// Diagnostics, including the raw engine response.
    pub extra: HashMap<String, Value>,
    /// User-facing messages, e.g. why a search returned nothing.
    pub messages: Vec<String>,
}

impl ResultSet {
    /// Creates an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no hits.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the raw engine response, if recorded.
    pub fn raw_response(&self) -> Option<&Value> {
        self.extra.get(RAW_RESPONSE_KEY)
    }
}

/// A completion offered for partially typed keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteSuggestion {
    /// What the user typed so far.
    pub user_input: String,
    /// Completion appended to the incomplete word.
    pub suffix: String,
    /// Number of documents containing the completed word.
    pub count: u64,
}

impl AutocompleteSuggestion {
    /// Returns the completed keywords.
    pub fn keys(&self) -> String {
        format!("{}{}", self.user_input, self.suffix)
    }
}
