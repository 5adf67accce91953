//! In-memory search engine.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use helios_search_connector::client::{
    BulkItemResult, BulkOperation, BulkOutcome, BulkRequest, EngineResponse, SearchEngineClient,
};
use helios_search_connector::error::{ClientError, ClientResult};
use helios_search_connector::search::EngineQuery;
use parking_lot::Mutex;
use serde_json::{Value, json};

/// One stored index.
#[derive(Debug, Clone, Default)]
pub struct MockIndex {
    pub settings: Value,
    pub mapping: Option<Value>,
    pub documents: BTreeMap<String, Value>,
    pub refreshes: usize,
}

#[derive(Debug, Default)]
struct MockState {
    unreachable: bool,
    indices: BTreeMap<String, MockIndex>,
    item_failures: HashMap<String, String>,
    create_rejection: Option<String>,
    mapping_rejection: Option<String>,
    canned_response: Option<Value>,
    queries: Vec<Value>,
    calls: Vec<String>,
}

/// A [`SearchEngineClient`] keeping indices in memory.
///
/// Searches match a `multi_match` query by case-insensitive substring
/// against every string in a document; a canned response replaces that.
#[derive(Debug, Default)]
pub struct MockClient {
    state: Mutex<MockState>,
}

impl MockClient {
    /// Creates a reachable engine with no indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that fails every call with a connection error.
    pub fn unreachable() -> Self {
        let client = Self::default();
        client.state.lock().unreachable = true;
        client
    }

    /// Makes bulk index operations for `id` fail with `message`.
    pub fn fail_item(&self, id: &str, message: &str) {
        self.state
            .lock()
            .item_failures
            .insert(id.to_string(), message.to_string());
    }

    /// Makes index creation answer with a 400 carrying `reason`.
    pub fn reject_create(&self, reason: &str) {
        self.state.lock().create_rejection = Some(reason.to_string());
    }

    /// Makes mapping updates answer with a 400 carrying `reason`.
    pub fn reject_mapping(&self, reason: &str) {
        self.state.lock().mapping_rejection = Some(reason.to_string());
    }

    /// Answers every search with `response`.
    pub fn set_search_response(&self, response: Value) {
        self.state.lock().canned_response = Some(response);
    }

    /// Returns the names of all calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Returns a snapshot of an index.
    pub fn index(&self, name: &str) -> Option<MockIndex> {
        self.state.lock().indices.get(name).cloned()
    }

    /// Returns the body of the most recent search.
    pub fn last_query(&self) -> Option<Value> {
        self.state.lock().queries.last().cloned()
    }

    fn enter(&self, call: &str) -> ClientResult<parking_lot::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock();
        state.calls.push(call.to_string());
        if state.unreachable {
            return Err(ClientError::connection("connection refused"));
        }
        Ok(state)
    }
}

fn bad_request(kind: &str, reason: &str) -> EngineResponse {
    EngineResponse::new(
        400,
        json!({ "error": { "type": kind, "reason": reason }, "status": 400 }),
    )
}

fn index_not_found(name: &str) -> ClientError {
    ClientError::response(404, format!("index_not_found_exception: no such index [{}]", name))
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push_str(&s.to_lowercase());
            out.push(' ');
        }
        Value::Array(values) => values.iter().for_each(|v| collect_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        _ => {}
    }
}

fn matches_keys(source: &Value, keys: Option<&str>) -> bool {
    let Some(keys) = keys else {
        return true;
    };
    let mut text = String::new();
    collect_text(source, &mut text);
    keys.split_whitespace()
        .any(|token| text.contains(&token.to_lowercase()))
}

#[async_trait]
impl SearchEngineClient for MockClient {
    fn has_connection(&self) -> bool {
        true
    }

    async fn version(&self) -> ClientResult<String> {
        self.enter("version")?;
        Ok("8.15.0".to_string())
    }

    async fn create_index(&self, name: &str, settings: &Value) -> ClientResult<EngineResponse> {
        let mut state = self.enter("create_index")?;
        if let Some(reason) = &state.create_rejection {
            return Ok(bad_request("illegal_argument_exception", reason));
        }
        if state.indices.contains_key(name) {
            return Ok(EngineResponse::new(
                400,
                json!({ "error": { "type": "resource_already_exists_exception", "reason": format!("index [{}] already exists", name) } }),
            ));
        }
        state.indices.insert(
            name.to_string(),
            MockIndex {
                settings: settings.clone(),
                ..Default::default()
            },
        );
        Ok(EngineResponse::acknowledged())
    }

    async fn delete_index(&self, name: &str) -> ClientResult<EngineResponse> {
        let mut state = self.enter("delete_index")?;
        state.indices.remove(name);
        Ok(EngineResponse::acknowledged())
    }

    async fn index_exists(&self, name: &str) -> ClientResult<bool> {
        let state = self.enter("index_exists")?;
        Ok(state.indices.contains_key(name))
    }

    async fn put_mapping(&self, name: &str, mapping: &Value) -> ClientResult<EngineResponse> {
        let mut state = self.enter("put_mapping")?;
        if let Some(reason) = &state.mapping_rejection {
            return Ok(bad_request("mapper_parsing_exception", reason));
        }
        match state.indices.get_mut(name) {
            Some(index) => {
                index.mapping = Some(mapping.clone());
                Ok(EngineResponse::acknowledged())
            }
            None => Err(index_not_found(name)),
        }
    }

    async fn bulk(&self, request: &BulkRequest) -> ClientResult<BulkOutcome> {
        let mut state = self.enter("bulk")?;
        let failures = state.item_failures.clone();
        let index = state.indices.entry(request.index.clone()).or_default();

        let items = request
            .operations
            .iter()
            .map(|op| match op {
                BulkOperation::Index { id, source } => match failures.get(id) {
                    Some(message) => BulkItemResult {
                        id: id.clone(),
                        status: 400,
                        error: Some(message.clone()),
                    },
                    None => {
                        index.documents.insert(id.clone(), source.clone());
                        BulkItemResult {
                            id: id.clone(),
                            status: 201,
                            error: None,
                        }
                    }
                },
                BulkOperation::Delete { id } => {
                    let status = if index.documents.remove(id).is_some() { 200 } else { 404 };
                    BulkItemResult {
                        id: id.clone(),
                        status,
                        error: None,
                    }
                }
            })
            .collect();

        Ok(BulkOutcome { items })
    }

    async fn refresh_index(&self, name: &str) -> ClientResult<()> {
        let mut state = self.enter("refresh_index")?;
        match state.indices.get_mut(name) {
            Some(index) => {
                index.refreshes += 1;
                Ok(())
            }
            None => Err(index_not_found(name)),
        }
    }

    async fn search(&self, index: &str, query: &EngineQuery) -> ClientResult<Value> {
        let mut state = self.enter("search")?;
        state.queries.push(query.body.clone());

        if let Some(response) = &state.canned_response {
            return Ok(response.clone());
        }

        let stored = state.indices.get(index).ok_or_else(|| index_not_found(index))?;
        let keys = query
            .body
            .pointer("/query/bool/must/0/multi_match/query")
            .and_then(Value::as_str);

        let hits: Vec<Value> = stored
            .documents
            .iter()
            .filter(|(_, source)| matches_keys(source, keys))
            .map(|(id, source)| json!({ "_id": id, "_score": 1.0, "_source": source }))
            .collect();

        Ok(json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": { "value": hits.len(), "relation": "eq" },
                "max_score": 1.0,
                "hits": hits
            }
        }))
    }
}
