//! Search engine transport abstraction.
//!
//! The connector talks to the engine only through [`SearchEngineClient`].
//! Connection handling, TLS, authentication and connection caching belong to
//! implementations of the trait; the connector neither creates nor pools
//! connections. With the `elasticsearch` feature,
//! [`ElasticsearchClient`](elasticsearch::ElasticsearchClient) provides an
//! implementation on top of the official client.

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ClientResult;
use crate::search::EngineQuery;

/// A response of an administrative engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    /// HTTP status.
    pub status: u16,
    /// Parsed body; `Null` when the body was empty or not JSON.
    pub body: Value,
}

impl EngineResponse {
    /// Creates a response.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Creates a `200 {"acknowledged": true}` response.
    pub fn acknowledged() -> Self {
        Self::new(200, json!({ "acknowledged": true }))
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the engine's error message, if the body carries one.
    pub fn error_message(&self) -> Option<String> {
        match self.body.get("error")? {
            Value::String(s) => Some(s.clone()),
            error => error
                .get("reason")
                .and_then(Value::as_str)
                .map(String::from)
                .or_else(|| Some(error.to_string())),
        }
    }
}

/// A single operation of a bulk batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Create or replace a document.
    Index {
        /// Document id.
        id: String,
        /// Document body.
        source: Value,
    },
    /// Delete a document.
    Delete {
        /// Document id.
        id: String,
    },
}

impl BulkOperation {
    /// Returns the document id.
    pub fn id(&self) -> &str {
        match self {
            BulkOperation::Index { id, .. } | BulkOperation::Delete { id } => id,
        }
    }
}

/// A batch of document operations against one physical index.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    /// Physical index name.
    pub index: String,
    /// Operations in submission order.
    pub operations: Vec<BulkOperation>,
}

impl BulkRequest {
    /// Creates an empty batch.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            operations: Vec::new(),
        }
    }

    /// Returns `true` if the batch holds no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns the document ids in submission order.
    pub fn ids(&self) -> Vec<String> {
        self.operations.iter().map(|op| op.id().to_string()).collect()
    }

    /// Encodes the batch as bulk API lines (action line, then source line for indexing).
    pub fn to_lines(&self) -> Vec<Value> {
        let mut lines = Vec::with_capacity(self.operations.len() * 2);
        for op in &self.operations {
            match op {
                BulkOperation::Index { id, source } => {
                    lines.push(json!({ "index": { "_index": self.index, "_id": id } }));
                    lines.push(source.clone());
                }
                BulkOperation::Delete { id } => {
                    lines.push(json!({ "delete": { "_index": self.index, "_id": id } }));
                }
            }
        }
        lines
    }
}

/// Result of one bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    /// Document id.
    pub id: String,
    /// Per-item HTTP status.
    pub status: u16,
    /// Error message when the item failed.
    pub error: Option<String>,
}

impl BulkItemResult {
    /// Returns `true` if the item failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-item outcome of a bulk batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    /// Item results in submission order.
    pub items: Vec<BulkItemResult>,
}

impl BulkOutcome {
    /// Parses a bulk API response body.
    pub fn from_response(body: &Value) -> Self {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_bulk_item).collect())
            .unwrap_or_default();
        Self { items }
    }

    /// Returns `true` if any item failed.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(BulkItemResult::is_error)
    }

    /// Returns the failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| item.is_error())
    }
}

fn parse_bulk_item(item: &Value) -> Option<BulkItemResult> {
    // Each item is keyed by its action: {"index": {...}} or {"delete": {...}}
    let (_, result) = item.as_object()?.iter().next()?;
    let id = result.get("_id").and_then(Value::as_str).unwrap_or_default();
    let status = result.get("status").and_then(Value::as_u64).unwrap_or(0) as u16;
    let error = result.get("error").map(|error| match error {
        Value::String(s) => s.clone(),
        _ => {
            let kind = error.get("type").and_then(Value::as_str).unwrap_or("error");
            let reason = error.get("reason").and_then(Value::as_str).unwrap_or("");
            format!("{}: {}", kind, reason)
        }
    });
    Some(BulkItemResult {
        id: id.to_string(),
        status,
        error,
    })
}

/// Capability the connector needs from the search engine transport.
///
/// All network failures surface as [`ClientError`](crate::error::ClientError):
/// either a connection failure or a non-success response.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Returns `true` if the transport has a usable connection configured.
    fn has_connection(&self) -> bool;

    /// Returns the engine version; fails on transport or response errors.
    async fn version(&self) -> ClientResult<String>;

    /// Creates an index with the given settings body.
    async fn create_index(&self, name: &str, settings: &Value) -> ClientResult<EngineResponse>;

    /// Deletes an index; a missing index is not an error.
    async fn delete_index(&self, name: &str) -> ClientResult<EngineResponse>;

    /// Returns `true` if the index exists.
    async fn index_exists(&self, name: &str) -> ClientResult<bool>;

    /// Applies a mapping document to an index.
    async fn put_mapping(&self, name: &str, mapping: &Value) -> ClientResult<EngineResponse>;

    /// Executes a bulk batch.
    async fn bulk(&self, request: &BulkRequest) -> ClientResult<BulkOutcome>;

    /// Refreshes an index so recent changes become searchable.
    async fn refresh_index(&self, name: &str) -> ClientResult<()>;

    /// Executes a search and returns the raw response body.
    async fn search(&self, index: &str, query: &EngineQuery) -> ClientResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_lines_pair_actions_and_sources() {
        let request = BulkRequest {
            index: "products".to_string(),
            operations: vec![
                BulkOperation::Index {
                    id: "1".to_string(),
                    source: json!({ "title": ["red shoes"] }),
                },
                BulkOperation::Delete {
                    id: "2".to_string(),
                },
            ],
        };

        let lines = request.to_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["index"]["_id"], "1");
        assert_eq!(lines[0]["index"]["_index"], "products");
        assert_eq!(lines[1]["title"][0], "red shoes");
        assert_eq!(lines[2]["delete"]["_id"], "2");
        assert_eq!(request.ids(), vec!["1", "2"]);
    }

    #[test]
    fn test_bulk_outcome_parses_errors() {
        let outcome = BulkOutcome::from_response(&json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_id": "1", "status": 201, "result": "created" } },
                { "index": { "_id": "2", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [price]"
                } } },
                { "delete": { "_id": "3", "status": 404, "result": "not_found" } }
            ]
        }));

        assert_eq!(outcome.items.len(), 3);
        assert!(outcome.has_errors());
        let failures: Vec<_> = outcome.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "2");
        assert_eq!(
            failures[0].error.as_deref(),
            Some("mapper_parsing_exception: failed to parse field [price]")
        );
    }

    #[test]
    fn test_engine_response_error_message() {
        let response = EngineResponse::new(
            400,
            json!({ "error": { "type": "resource_already_exists_exception", "reason": "index exists" } }),
        );
        assert!(!response.is_ok());
        assert_eq!(response.error_message().as_deref(), Some("index exists"));

        assert!(EngineResponse::acknowledged().is_ok());
        assert_eq!(EngineResponse::acknowledged().error_message(), None);
    }
}
