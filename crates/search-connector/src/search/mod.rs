//! Query translation.
//!
//! [`QueryBuilder`] turns an abstract [`Query`](crate::types::Query) into the
//! engine's request body. The work is split by concern:
//!
//! - [`conditions`] - condition tree to boolean clauses
//! - [`fulltext`] - keywords to a fuzzy multi-field match
//! - [`facets`] - facet aggregations and the OR-facet post filter
//! - [`query_builder`] - assembly of the full request

pub mod conditions;
pub mod facets;
pub mod fulltext;
pub mod query_builder;

pub use query_builder::QueryBuilder;

use serde_json::Value;

/// Name of the autocomplete terms aggregation.
pub const AUTOCOMPLETE_AGGREGATION: &str = "autocomplete";

/// Name of the spelling term suggester.
pub const SPELLING_SUGGESTION: &str = "spelling_suggestion";

/// A built engine request body, ready to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineQuery {
    /// The search request body.
    pub body: Value,
}

impl EngineQuery {
    /// Wraps a request body.
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Returns the aggregation ids of the request.
    pub fn aggregation_ids(&self) -> Vec<&str> {
        self.body
            .get("aggs")
            .and_then(Value::as_object)
            .map(|aggs| aggs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
