//! Facet aggregations.
//!
//! Filters contributed by OR facets (groups tagged `facet:{field}`) are moved
//! out of the main query into `post_filter`, so they narrow the hits but not
//! the aggregations. Each facet aggregation is then wrapped in a `filter`
//! aggregation applying every *other* OR-facet filter: a facet's own
//! selection never narrows its own counts.
//!
//! ```text
//! "aggs": {
//!   "color": {
//!     "filter": { ...sibling OR-facet filters or match_all... },
//!     "aggs": { "color": { "terms": { "field": "color", "size": 10000 } } }
//!   }
//! }
//! ```
//!
//! Range facets use `min` and `max` metric aggregations in place of `terms`.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value, json};

use super::conditions::{combine, exact_field, group_clause};
use crate::error::ConnectorResult;
use crate::types::{
    ConditionGroup, ConditionItem, Conjunction, FacetOperator, FacetQueryType, FacetRequest,
    IndexSchema, Query,
};

/// A translated filter contributed by an OR facet.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetFilter {
    /// Facet field the filter was contributed for.
    pub field: String,
    /// Translated clause.
    pub clause: Value,
}

/// Splits OR-facet filters off the root condition group.
///
/// Returns the remaining conditions and the translated facet filters. When
/// facets are disabled for the query, nothing is split off.
pub fn split_facet_filters(
    query: &Query,
    schema: &IndexSchema,
) -> ConnectorResult<(ConditionGroup, Vec<FacetFilter>)> {
    if !query.facets_enabled() {
        return Ok((query.conditions.clone(), Vec::new()));
    }

    let or_fields: HashSet<&str> = query
        .facets
        .values()
        .filter(|f| f.operator == FacetOperator::Or)
        .map(|f| f.field.as_str())
        .collect();

    let mut remaining = ConditionGroup {
        conjunction: query.conditions.conjunction,
        items: Vec::with_capacity(query.conditions.items.len()),
        tags: query.conditions.tags.clone(),
    };
    let mut filters = Vec::new();

    for item in &query.conditions.items {
        let facet_field = match item {
            ConditionItem::Group(group) => or_fields
                .iter()
                .find(|field| group.has_tag(&ConditionGroup::facet_tag(field)))
                .map(|field| (*field, group)),
            ConditionItem::Condition(_) => None,
        };

        match facet_field {
            Some((field, group)) => {
                if let Some(clause) = group_clause(group, schema)? {
                    filters.push(FacetFilter {
                        field: field.to_string(),
                        clause,
                    });
                }
            }
            None => remaining.items.push(item.clone()),
        }
    }

    Ok((remaining, filters))
}

/// Combines all facet filters into the `post_filter` clause.
pub fn post_filter(filters: &[FacetFilter]) -> Option<Value> {
    combine(
        Conjunction::And,
        filters.iter().map(|f| f.clause.clone()).collect(),
    )
}

/// Returns the bucket size for a facet.
pub fn bucket_size(facet: &FacetRequest, no_limit_size: u32) -> u32 {
    match facet.limit {
        Some(limit) if limit > 0 => limit,
        _ => no_limit_size,
    }
}

/// Builds the aggregation set, one entry per requested facet id.
pub fn facet_aggregations(
    facets: &BTreeMap<String, FacetRequest>,
    filters: &[FacetFilter],
    schema: &IndexSchema,
    no_limit_size: u32,
) -> Value {
    let mut aggs = Map::new();
    for (facet_id, facet) in facets {
        let sibling_filters: Vec<Value> = filters
            .iter()
            .filter(|f| f.field != facet.field)
            .map(|f| f.clause.clone())
            .collect();
        let filter = combine(Conjunction::And, sibling_filters)
            .unwrap_or_else(|| json!({ "match_all": {} }));

        let inner = match facet.query_type {
            FacetQueryType::Terms => {
                let mut terms = Map::new();
                terms.insert("field".to_string(), json!(exact_field(schema, &facet.field)));
                terms.insert("size".to_string(), json!(bucket_size(facet, no_limit_size)));
                terms.insert("min_doc_count".to_string(), json!(facet.min_count));
                if facet.missing {
                    terms.insert("missing".to_string(), json!(""));
                }
                json!({ facet_id: { "terms": terms } })
            }
            FacetQueryType::Range => json!({
                "min": { "min": { "field": facet.field } },
                "max": { "max": { "field": facet.field } }
            }),
        };

        aggs.insert(facet_id.clone(), json!({ "filter": filter, "aggs": inner }));
    }
    Value::Object(aggs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldSpec, FieldType, Operator};

    fn schema() -> IndexSchema {
        IndexSchema::new("products")
            .with_field(FieldSpec::new("color", FieldType::String))
            .with_field(FieldSpec::new("size", FieldType::String))
            .with_field(FieldSpec::new("brand", FieldType::Text))
            .with_field(FieldSpec::new("price", FieldType::Decimal))
    }

    fn facet_group(field: &str, value: &str) -> ConditionGroup {
        ConditionGroup::new(Conjunction::Or)
            .with_condition(field, Operator::Eq, value)
            .with_tag(ConditionGroup::facet_tag(field))
    }

    #[test]
    fn test_or_facet_filters_move_to_post_filter() {
        let query = Query::new()
            .with_condition("price", Operator::Gt, 5)
            .with_condition_group(facet_group("color", "red"))
            .with_condition_group(facet_group("size", "xl"))
            .with_facet("color", FacetRequest::new("color").with_operator(FacetOperator::Or))
            .with_facet("size", FacetRequest::new("size"));

        let (remaining, filters) = split_facet_filters(&query, &schema()).unwrap();

        // size is an AND facet, so its filter stays in the main query
        assert_eq!(remaining.items.len(), 2);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].field, "color");
        assert!(post_filter(&filters).is_some());
    }

    #[test]
    fn test_nothing_split_without_facets() {
        let query = Query::new()
            .with_condition_group(facet_group("color", "red"))
            .with_facet("color", FacetRequest::new("color").with_operator(FacetOperator::Or))
            .with_autocomplete("re", None);

        let (remaining, filters) = split_facet_filters(&query, &schema()).unwrap();
        assert_eq!(remaining.items.len(), 1);
        assert!(filters.is_empty());
        assert_eq!(post_filter(&filters), None);
    }

    #[test]
    fn test_own_filter_excluded_from_own_counts() {
        let filters = vec![
            FacetFilter {
                field: "color".to_string(),
                clause: json!({ "term": { "color": "red" } }),
            },
            FacetFilter {
                field: "size".to_string(),
                clause: json!({ "term": { "size": "xl" } }),
            },
        ];
        let mut facets = BTreeMap::new();
        facets.insert("color".to_string(), FacetRequest::new("color").with_operator(FacetOperator::Or));
        facets.insert("size".to_string(), FacetRequest::new("size").with_operator(FacetOperator::Or));

        let aggs = facet_aggregations(&facets, &filters, &schema(), 10000);

        let color_filter = &aggs["color"]["filter"]["bool"]["filter"];
        assert_eq!(color_filter, &json!([{ "term": { "size": "xl" } }]));
        let size_filter = &aggs["size"]["filter"]["bool"]["filter"];
        assert_eq!(size_filter, &json!([{ "term": { "color": "red" } }]));
    }

    #[test]
    fn test_terms_aggregation_shape() {
        let mut facets = BTreeMap::new();
        facets.insert(
            "brand_facet".to_string(),
            FacetRequest::new("brand").with_min_count(2).with_limit(5).with_missing(),
        );
        facets.insert("color".to_string(), FacetRequest::new("color").with_limit(0));

        let aggs = facet_aggregations(&facets, &[], &schema(), 10000);

        let brand = &aggs["brand_facet"];
        assert_eq!(brand["filter"], json!({ "match_all": {} }));
        let terms = &brand["aggs"]["brand_facet"]["terms"];
        assert_eq!(terms["field"], "brand.keyword");
        assert_eq!(terms["size"], 5);
        assert_eq!(terms["min_doc_count"], 2);
        assert_eq!(terms["missing"], "");

        assert_eq!(aggs["color"]["aggs"]["color"]["terms"]["size"], 10000);
        assert!(aggs["color"]["aggs"]["color"]["terms"].get("missing").is_none());
    }

    #[test]
    fn test_range_aggregation_shape() {
        let mut facets = BTreeMap::new();
        facets.insert("price".to_string(), FacetRequest::new("price").range());

        let aggs = facet_aggregations(&facets, &[], &schema(), 10000);
        assert_eq!(aggs["price"]["aggs"]["min"]["min"]["field"], "price");
        assert_eq!(aggs["price"]["aggs"]["max"]["max"]["field"], "price");
    }
}
