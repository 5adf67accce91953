//! Condition tree translation.
//!
//! AND groups become `bool.filter`, OR groups become `bool.should` with
//! `minimum_should_match: 1`. Equality on analyzed fields uses `match` with
//! the `and` operator; every other comparison targets the exact value.

use serde_json::{Value, json};

use crate::error::{ConnectorResult, ValidationError};
use crate::types::{Condition, ConditionGroup, ConditionItem, Conjunction, FieldType, IndexSchema, Operator};

/// Resolves the type of a field, following dotted paths into sub-fields.
pub fn field_type_at(schema: &IndexSchema, path: &str) -> Option<FieldType> {
    let mut segments = path.split('.');
    let mut field = schema.field(segments.next()?)?;
    for segment in segments {
        field = field.sub_fields.iter().find(|f| f.id == segment)?;
    }
    Some(field.field_type)
}

/// Returns the exact-value field used for term lookups, sorting and aggregations.
///
/// Analyzed text fields carry a `keyword` sub-field for this.
pub fn exact_field(schema: &IndexSchema, path: &str) -> String {
    match field_type_at(schema, path) {
        Some(FieldType::Text) => format!("{}.keyword", path),
        _ => path.to_string(),
    }
}

/// Translates a group; `None` when the group has no translatable members.
pub fn group_clause(group: &ConditionGroup, schema: &IndexSchema) -> ConnectorResult<Option<Value>> {
    let mut clauses = Vec::with_capacity(group.items.len());
    for item in &group.items {
        match item {
            ConditionItem::Condition(condition) => clauses.push(condition_clause(condition, schema)?),
            ConditionItem::Group(inner) => {
                if let Some(clause) = group_clause(inner, schema)? {
                    clauses.push(clause);
                }
            }
        }
    }
    Ok(combine(group.conjunction, clauses))
}

/// Combines clauses under a conjunction.
pub fn combine(conjunction: Conjunction, clauses: Vec<Value>) -> Option<Value> {
    if clauses.is_empty() {
        return None;
    }
    Some(match conjunction {
        Conjunction::And => json!({ "bool": { "filter": clauses } }),
        Conjunction::Or => json!({ "bool": { "should": clauses, "minimum_should_match": 1 } }),
    })
}

/// Translates a single condition.
pub fn condition_clause(condition: &Condition, schema: &IndexSchema) -> ConnectorResult<Value> {
    let field = condition.field.as_str();
    let value = &condition.value;

    let clause = match condition.operator {
        Operator::Eq => equals(schema, field, value),
        Operator::NotEq => match value {
            Value::Null => json!({ "exists": { "field": field } }),
            _ => negate(equals(schema, field, value)),
        },
        Operator::Lt => range(field, json!({ "lt": value })),
        Operator::Le => range(field, json!({ "lte": value })),
        Operator::Gt => range(field, json!({ "gt": value })),
        Operator::Ge => range(field, json!({ "gte": value })),
        Operator::In => terms(schema, field, value),
        Operator::NotIn => negate(terms(schema, field, value)),
        Operator::Between => between(field, value)?,
        Operator::NotBetween => negate(between(field, value)?),
    };
    Ok(clause)
}

fn equals(schema: &IndexSchema, field: &str, value: &Value) -> Value {
    match value {
        Value::Null => negate(json!({ "exists": { "field": field } })),
        _ if field_type_at(schema, field) == Some(FieldType::Text) => {
            json!({ "match": { field: { "query": value, "operator": "and" } } })
        }
        _ => json!({ "term": { field: value } }),
    }
}

fn terms(schema: &IndexSchema, field: &str, value: &Value) -> Value {
    let values = match value {
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    };
    json!({ "terms": { exact_field(schema, field): values } })
}

fn range(field: &str, bounds: Value) -> Value {
    json!({ "range": { field: bounds } })
}

fn between(field: &str, value: &Value) -> ConnectorResult<Value> {
    match value.as_array().map(Vec::as_slice) {
        Some([min, max]) => Ok(range(field, json!({ "gte": min, "lte": max }))),
        _ => Err(ValidationError::InvalidCondition {
            field: field.to_string(),
            message: format!("expected [min, max], got {}", value),
        }
        .into()),
    }
}

fn negate(clause: Value) -> Value {
    json!({ "bool": { "must_not": [clause] } })
}
