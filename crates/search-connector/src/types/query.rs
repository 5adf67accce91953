//! Abstract search query model.
//!
//! A [`Query`] is built fresh for every search and handed to the query
//! builder unchanged. Conditions form a tree of AND/OR groups; facet filters
//! are ordinary condition groups tagged with [`ConditionGroup::facet_tag`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Fuzziness;

/// How the members of a condition group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    /// All members must match.
    #[default]
    And,
    /// At least one member must match.
    Or,
}

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal; a null value means "field is missing".
    #[default]
    Eq,
    /// Not equal; a null value means "field is present".
    NotEq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Value is one of a set.
    In,
    /// Value is none of a set.
    NotIn,
    /// Value lies within `[min, max]`.
    Between,
    /// Value lies outside `[min, max]`.
    NotBetween,
}

/// A field/operator/value triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field id.
    pub field: String,
    /// Operator.
    #[serde(default)]
    pub operator: Operator,
    /// Compared value; arrays for set and range operators.
    pub value: Value,
}

impl Condition {
    /// Creates a condition.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// A member of a condition group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionItem {
    /// A single condition. Listed first: every group field has a default.
    Condition(Condition),
    /// A nested group.
    Group(ConditionGroup),
}

/// A group of conditions combined by a conjunction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    /// Combination of the members.
    #[serde(default)]
    pub conjunction: Conjunction,
    /// Members in insertion order.
    #[serde(default)]
    pub items: Vec<ConditionItem>,
    /// Tags, e.g. `facet:color` for filters contributed by a facet.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ConditionGroup {
    /// Creates an empty group.
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            ..Default::default()
        }
    }

    /// Returns the tag marking filters contributed by a facet on `field`.
    pub fn facet_tag(field: &str) -> String {
        format!("facet:{}", field)
    }

    /// Adds a condition.
    pub fn with_condition(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.items
            .push(ConditionItem::Condition(Condition::new(field, operator, value)));
        self
    }

    /// Adds a nested group.
    pub fn with_group(mut self, group: ConditionGroup) -> Self {
        self.items.push(ConditionItem::Group(group));
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns `true` if the group carries the tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns `true` if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the engine's order keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// What a sort directive orders by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// The engine's native relevance ranking.
    Relevance,
    /// A schema field.
    Field(String),
}

/// A single sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Sorted field.
    pub field: SortField,
    /// Direction.
    #[serde(default)]
    pub direction: SortDirection,
}

/// Paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paging {
    /// Index of the first hit.
    #[serde(default)]
    pub offset: u32,
    /// Maximum number of hits; `None` uses the backend default.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// How a facet's filter combines with its own values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetOperator {
    /// Selecting values narrows results; counts follow all filters.
    #[default]
    And,
    /// Selecting values widens results; own filter does not narrow own counts.
    Or,
}

/// Kind of aggregation requested for a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetQueryType {
    /// Value/count buckets.
    #[default]
    Terms,
    /// Minimum and maximum of the field.
    Range,
}

/// A requested facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRequest {
    /// Aggregated field.
    pub field: String,
    /// Facet operator.
    #[serde(default)]
    pub operator: FacetOperator,
    /// Buckets below this count are dropped.
    #[serde(default = "default_min_count")]
    pub min_count: u64,
    /// Maximum number of buckets; 0 or `None` means no limit.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Also return the bucket of items missing the field.
    #[serde(default)]
    pub missing: bool,
    /// Terms or range mode.
    #[serde(default)]
    pub query_type: FacetQueryType,
}

fn default_min_count() -> u64 {
    1
}

impl FacetRequest {
    /// Creates a terms facet on a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: FacetOperator::And,
            min_count: default_min_count(),
            limit: None,
            missing: false,
            query_type: FacetQueryType::Terms,
        }
    }

    /// Sets the facet operator.
    pub fn with_operator(mut self, operator: FacetOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Sets the minimum bucket count.
    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = min_count;
        self
    }

    /// Sets the bucket limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requests the missing-value bucket.
    pub fn with_missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Switches to range mode.
    pub fn range(mut self) -> Self {
        self.query_type = FacetQueryType::Range;
        self
    }
}

/// A prefix-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteRequest {
    /// The incomplete word being typed.
    pub prefix: String,
    /// Target field; required when more than one field is eligible.
    #[serde(default)]
    pub field: Option<String>,
}

/// Options toggling parts of query translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Skip facet aggregations even when facets are requested.
    #[serde(default)]
    pub disable_facets: bool,
    /// Request spelling suggestions; `None` uses the backend setting.
    #[serde(default)]
    pub spellcheck: Option<bool>,
    /// Fuzziness override; `None` uses the backend setting.
    #[serde(default)]
    pub fuzziness: Option<Fuzziness>,
    /// Prefix completion request.
    #[serde(default)]
    pub autocomplete: Option<AutocompleteRequest>,
}

/// An abstract search query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Fulltext keywords.
    #[serde(default)]
    pub keys: Option<String>,
    /// Fields searched by the keywords; empty means all fulltext fields.
    #[serde(default)]
    pub fulltext_fields: Vec<String>,
    /// Root condition group.
    #[serde(default)]
    pub conditions: ConditionGroup,
    /// Sort directives in priority order.
    #[serde(default)]
    pub sorts: Vec<Sort>,
    /// Paging window; `None` uses the backend default page size.
    #[serde(default)]
    pub paging: Option<Paging>,
    /// Requested facets keyed by facet id.
    #[serde(default)]
    pub facets: BTreeMap<String, FacetRequest>,
    /// Translation options.
    #[serde(default)]
    pub options: QueryOptions,
    /// Free-form options for hooks.
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fulltext keywords.
    pub fn with_keys(mut self, keys: impl Into<String>) -> Self {
        self.keys = Some(keys.into());
        self
    }

    /// Restricts the fulltext fields.
    pub fn with_fulltext_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fulltext_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a condition to the root group.
    pub fn with_condition(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions = self.conditions.with_condition(field, operator, value);
        self
    }

    /// Adds a nested group to the root group.
    pub fn with_condition_group(mut self, group: ConditionGroup) -> Self {
        self.conditions = self.conditions.with_group(group);
        self
    }

    /// Adds a field sort.
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(Sort {
            field: SortField::Field(field.into()),
            direction,
        });
        self
    }

    /// Adds a relevance sort.
    pub fn with_relevance_sort(mut self) -> Self {
        self.sorts.push(Sort {
            field: SortField::Relevance,
            direction: SortDirection::Desc,
        });
        self
    }

    /// Sets the paging window.
    pub fn with_range(mut self, offset: u32, limit: u32) -> Self {
        self.paging = Some(Paging {
            offset,
            limit: Some(limit),
        });
        self
    }

    /// Requests a facet.
    pub fn with_facet(mut self, id: impl Into<String>, facet: FacetRequest) -> Self {
        self.facets.insert(id.into(), facet);
        self
    }

    /// Sets an autocomplete request.
    pub fn with_autocomplete(mut self, prefix: impl Into<String>, field: Option<String>) -> Self {
        self.options.autocomplete = Some(AutocompleteRequest {
            prefix: prefix.into(),
            field,
        });
        self
    }

    /// Returns `true` if facet aggregations should be built.
    pub fn facets_enabled(&self) -> bool {
        !self.facets.is_empty()
            && !self.options.disable_facets
            && self.options.autocomplete.is_none()
    }

    /// Returns the trimmed keywords, if any remain.
    pub fn effective_keys(&self) -> Option<&str> {
        self.keys
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_facets_disabled_by_autocomplete() {
        let query = Query::new()
            .with_facet("color", FacetRequest::new("color"))
            .with_autocomplete("sh", None);
        assert!(!query.facets_enabled());
    }

    #[test]
    fn test_facets_disabled_by_option() {
        let mut query = Query::new().with_facet("color", FacetRequest::new("color"));
        assert!(query.facets_enabled());
        query.options.disable_facets = true;
        assert!(!query.facets_enabled());
    }

    #[test]
    fn test_effective_keys_ignores_blank() {
        assert_eq!(Query::new().with_keys("  ").effective_keys(), None);
        assert_eq!(
            Query::new().with_keys(" shoes ").effective_keys(),
            Some("shoes")
        );
    }

    #[test]
    fn test_condition_group_deserializes_untagged_items() {
        let group: ConditionGroup = serde_json::from_value(json!({
            "conjunction": "OR",
            "items": [
                { "field": "color", "operator": "eq", "value": "red" },
                { "conjunction": "AND", "items": [], "tags": ["facet:size"] }
            ]
        }))
        .unwrap();

        assert_eq!(group.conjunction, Conjunction::Or);
        assert!(matches!(group.items[0], ConditionItem::Condition(_)));
        match &group.items[1] {
            ConditionItem::Group(inner) => assert!(inner.has_tag("facet:size")),
            other => panic!("expected group, got {:?}", other),
        }
    }
}
