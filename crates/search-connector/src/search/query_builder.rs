//! Assembly of the search request body.

use serde_json::{Map, Value, json};

use super::conditions::{exact_field, group_clause};
use super::facets::{facet_aggregations, post_filter, split_facet_filters};
use super::fulltext::{fulltext_clause, searched_fields};
use super::{AUTOCOMPLETE_AGGREGATION, EngineQuery, SPELLING_SUGGESTION};
use crate::config::{ConnectorConfig, Fuzziness};
use crate::error::{ConnectorResult, ValidationError};
use crate::types::{AutocompleteRequest, IndexSchema, Query, SortField};

/// Translates abstract queries into engine request bodies.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    fuzziness: Fuzziness,
    default_page_size: u32,
    facet_no_limit_size: u32,
    autocomplete_size: u32,
    spellcheck: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(&ConnectorConfig::default())
    }
}

impl QueryBuilder {
    /// Creates a builder using the connector's query settings.
    pub fn new(config: &ConnectorConfig) -> Self {
        Self {
            fuzziness: config.fuzziness,
            default_page_size: config.default_page_size,
            facet_no_limit_size: config.facet_no_limit_size,
            autocomplete_size: config.autocomplete_size,
            spellcheck: config.spellcheck,
        }
    }

    /// Builds the engine query for `query` against `schema`.
    ///
    /// Fails only on validation problems: an autocomplete request without a
    /// single target field, or a malformed condition value.
    pub fn build(&self, query: &Query, schema: &IndexSchema) -> ConnectorResult<EngineQuery> {
        let (conditions, facet_filters) = split_facet_filters(query, schema)?;

        let mut must = Vec::new();
        let mut filter = Vec::new();
        let mut aggs = Map::new();

        let keys = query.effective_keys();
        let fields = searched_fields(schema, &query.fulltext_fields);

        match &query.options.autocomplete {
            Some(request) => {
                let field = resolve_autocomplete_field(request, query, schema)?;
                if let Some(keys) = keys {
                    must.push(fulltext_clause(keys, std::slice::from_ref(&field), None));
                }
                let prefix = request.prefix.to_lowercase();
                if !prefix.is_empty() {
                    filter.push(json!({ "prefix": { field.as_str(): prefix } }));
                }
                aggs.insert(
                    AUTOCOMPLETE_AGGREGATION.to_string(),
                    json!({
                        "terms": {
                            "field": field,
                            "include": format!("{}.*", regex::escape(&prefix)),
                            "size": self.autocomplete_size,
                        }
                    }),
                );
            }
            None => {
                if let Some(keys) = keys {
                    let fuzziness = query.options.fuzziness.unwrap_or(self.fuzziness);
                    must.push(fulltext_clause(keys, &fields, Some(fuzziness)));
                }
            }
        }

        if let Some(clause) = group_clause(&conditions, schema)? {
            filter.push(clause);
        }

        let query_clause = if must.is_empty() && filter.is_empty() {
            json!({ "match_all": {} })
        } else {
            let mut bool_query = Map::new();
            if !must.is_empty() {
                bool_query.insert("must".to_string(), Value::Array(must));
            }
            if !filter.is_empty() {
                bool_query.insert("filter".to_string(), Value::Array(filter));
            }
            json!({ "bool": bool_query })
        };

        let paging = query.paging.unwrap_or_default();
        let mut body = Map::new();
        body.insert("query".to_string(), query_clause);
        body.insert("from".to_string(), json!(paging.offset));
        body.insert(
            "size".to_string(),
            json!(paging.limit.unwrap_or(self.default_page_size)),
        );

        if let Some(sort) = self.sort_clause(query, schema) {
            body.insert("sort".to_string(), sort);
        }

        if query.facets_enabled() {
            if let Some(post_filter) = post_filter(&facet_filters) {
                body.insert("post_filter".to_string(), post_filter);
            }
            if let Value::Object(facet_aggs) = facet_aggregations(
                &query.facets,
                &facet_filters,
                schema,
                self.facet_no_limit_size,
            ) {
                aggs.extend(facet_aggs);
            }
        }

        if !aggs.is_empty() {
            body.insert("aggs".to_string(), Value::Object(aggs));
        }

        let spellcheck = query.options.spellcheck.unwrap_or(self.spellcheck);
        if spellcheck && query.options.autocomplete.is_none() {
            if let (Some(keys), Some(field)) = (keys, first_field_name(&fields)) {
                body.insert(
                    "suggest".to_string(),
                    json!({
                        "text": keys,
                        SPELLING_SUGGESTION: { "term": { "field": field } }
                    }),
                );
            }
        }

        let aggregation_count = body
            .get("aggs")
            .and_then(serde_json::Value::as_object)
            .map_or(0, Map::len);
        tracing::debug!(
            index = %schema.id,
            has_keys = keys.is_some(),
            aggregations = aggregation_count,
            "Built engine query"
        );

        Ok(EngineQuery::new(Value::Object(body)))
    }

    fn sort_clause(&self, query: &Query, schema: &IndexSchema) -> Option<Value> {
        if query.sorts.iter().all(|s| s.field == SortField::Relevance) {
            return None;
        }
        let clauses: Vec<Value> = query
            .sorts
            .iter()
            .map(|sort| {
                let field = match &sort.field {
                    SortField::Relevance => "_score".to_string(),
                    SortField::Field(field) => exact_field(schema, field),
                };
                json!({ field: { "order": sort.direction.as_str() } })
            })
            .collect();
        Some(Value::Array(clauses))
    }
}

fn first_field_name(fields: &[String]) -> Option<&str> {
    fields
        .first()
        .map(|f| f.split_once('^').map_or(f.as_str(), |(name, _)| name))
}

fn resolve_autocomplete_field(
    request: &AutocompleteRequest,
    query: &Query,
    schema: &IndexSchema,
) -> Result<String, ValidationError> {
    if let Some(field) = &request.field {
        return Ok(field.clone());
    }

    let candidates: Vec<String> = if !query.fulltext_fields.is_empty() {
        query.fulltext_fields.clone()
    } else if !schema.options.autocomplete_fields.is_empty() {
        schema.options.autocomplete_fields.clone()
    } else {
        schema.fulltext_fields().into_iter().map(String::from).collect()
    };

    match candidates.as_slice() {
        [] => Err(ValidationError::NoAutocompleteField),
        [field] => Ok(field.clone()),
        _ => Err(ValidationError::AmbiguousAutocompleteField { candidates }),
    }
}
