//! Application-side data model.
//!
//! - [`schema`] - index schemas and field definitions
//! - [`document`] - items to index and their encoded documents
//! - [`query`] - the abstract query model
//! - [`results`] - decoded result sets and suggestions

pub mod document;
pub mod query;
pub mod results;
pub mod schema;

pub use document::{Document, IndexItem};
pub use query::{
    AutocompleteRequest, Condition, ConditionGroup, ConditionItem, Conjunction, FacetOperator,
    FacetQueryType, FacetRequest, Operator, Paging, Query, QueryOptions, Sort, SortDirection,
    SortField,
};
pub use results::{AutocompleteSuggestion, FacetTerm, RAW_RESPONSE_KEY, ResultItem, ResultSet};
pub use schema::{FieldSpec, FieldType, ID_FIELD, IndexOptions, IndexSchema, LANGUAGE_FIELD};
