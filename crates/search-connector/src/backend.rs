//! The index backend.
//!
//! [`IndexBackend`] owns the lifecycle of physical indexes and applies the
//! failure policy of the connector:
//!
//! - Reads and availability checks degrade: engine failures are logged and
//!   turned into empty results, `false`, or a [`LifecycleOutcome`].
//! - Bulk indexing fails loudly: any rejected item fails the whole call with
//!   an [`IndexingError`], after every rejection has been logged.
//! - Query validation errors (e.g. an ambiguous autocomplete field) are
//!   returned to the caller unchanged.
//!
//! No call retries; retry policy belongs to the transport.

use std::sync::Arc;

use serde_json::Value;

use crate::bulk::BulkEncoder;
use crate::client::SearchEngineClient;
use crate::config::ConnectorConfig;
use crate::error::{BulkItemFailure, ConfigError, ConnectorResult, IndexingError};
use crate::hooks::Hooks;
use crate::mapping::{MappingBuilder, index_settings};
use crate::naming::IndexNaming;
use crate::response::ResponseDecoder;
use crate::search::{AUTOCOMPLETE_AGGREGATION, QueryBuilder};
use crate::types::{
    AutocompleteRequest, AutocompleteSuggestion, IndexItem, IndexSchema, Query, ResultSet,
};

/// Result of a lifecycle operation that degrades instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The operation ran to completion.
    Completed,
    /// The engine could not be reached; nothing was changed.
    Unavailable,
    /// The operation does not apply, e.g. to a read-only index.
    Skipped,
    /// The index was recreated; the application must reindex all items.
    ReindexRequested,
    /// The engine rejected a step; the message was logged.
    Failed {
        /// Engine or transport error message.
        message: String,
    },
}

impl LifecycleOutcome {
    /// Returns `true` for outcomes that leave the index usable.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            LifecycleOutcome::Completed
                | LifecycleOutcome::Skipped
                | LifecycleOutcome::ReindexRequested
        )
    }

    fn failed(message: impl Into<String>) -> Self {
        LifecycleOutcome::Failed {
            message: message.into(),
        }
    }
}

/// Connector backend bound to one search engine.
pub struct IndexBackend {
    client: Arc<dyn SearchEngineClient>,
    config: ConnectorConfig,
    naming: IndexNaming,
    mapping_builder: MappingBuilder,
    query_builder: QueryBuilder,
    encoder: BulkEncoder,
    decoder: ResponseDecoder,
    hooks: Arc<Hooks>,
}

impl std::fmt::Debug for IndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBackend")
            .field("config", &self.config)
            .field("naming", &self.naming)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl IndexBackend {
    /// Creates a backend with no hooks registered.
    pub fn new(
        client: Arc<dyn SearchEngineClient>,
        config: ConnectorConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_hooks(client, config, Hooks::default())
    }

    /// Creates a backend with the given hooks.
    pub fn with_hooks(
        client: Arc<dyn SearchEngineClient>,
        config: ConnectorConfig,
        hooks: Hooks,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let naming = IndexNaming::from_config(&config);
        let hooks = Arc::new(hooks);

        Ok(Self {
            client,
            naming: naming.clone(),
            mapping_builder: MappingBuilder::new(),
            query_builder: QueryBuilder::new(&config),
            encoder: BulkEncoder::new(naming, Arc::clone(&hooks)),
            decoder: ResponseDecoder::new(),
            hooks,
            config,
        })
    }

    /// Creates a backend talking to the configured cluster.
    #[cfg(feature = "elasticsearch")]
    pub fn connect(config: ConnectorConfig, hooks: Hooks) -> Result<Self, ConfigError> {
        let client = crate::client::elasticsearch::ElasticsearchClient::new(&config.cluster)?;
        Self::with_hooks(Arc::new(client), config, hooks)
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Returns the physical index name of a schema.
    pub fn index_name(&self, schema: &IndexSchema) -> String {
        self.naming.physical_name(&schema.id)
    }

    /// Returns `true` if the transport has a connection and answers a version probe.
    pub async fn is_available(&self) -> bool {
        if !self.client.has_connection() {
            tracing::warn!("Search engine has no connection configured");
            return false;
        }

        match self.client.version().await {
            Ok(version) => {
                tracing::debug!(version = %version, "Search engine is available");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Search engine version probe failed");
                false
            }
        }
    }

    /// Creates the physical index, replacing any existing one, and applies the mapping.
    pub async fn add_index(&self, schema: &IndexSchema) -> LifecycleOutcome {
        if !self.is_available().await {
            return LifecycleOutcome::Unavailable;
        }

        let name = self.index_name(schema);
        match self.index_exists(&name).await {
            Ok(exists) => self.recreate_index(schema, &name, exists).await,
            Err(outcome) => outcome,
        }
    }

    /// Recreates an existing index and requests a reindex.
    ///
    /// A missing index is left alone.
    pub async fn update_index(&self, schema: &IndexSchema) -> LifecycleOutcome {
        if schema.read_only {
            return LifecycleOutcome::Skipped;
        }
        if !self.is_available().await {
            return LifecycleOutcome::Unavailable;
        }

        let name = self.index_name(schema);
        match self.index_exists(&name).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(index = %name, "Index to update does not exist");
                return LifecycleOutcome::Completed;
            }
            Err(outcome) => return outcome,
        }

        match self.recreate_index(schema, &name, true).await {
            LifecycleOutcome::Completed => {
                tracing::info!(index = %name, "Index recreated, reindex requested");
                LifecycleOutcome::ReindexRequested
            }
            other => other,
        }
    }

    async fn index_exists(&self, name: &str) -> Result<bool, LifecycleOutcome> {
        self.client.index_exists(name).await.map_err(|e| {
            tracing::error!(index = %name, error = %e, "Failed to check index existence");
            LifecycleOutcome::failed(e.to_string())
        })
    }

    async fn recreate_index(
        &self,
        schema: &IndexSchema,
        name: &str,
        exists: bool,
    ) -> LifecycleOutcome {
        if exists {
            if let Err(e) = self.client.delete_index(name).await {
                tracing::error!(index = %name, error = %e, "Failed to delete existing index");
                return LifecycleOutcome::failed(e.to_string());
            }
            tracing::debug!(index = %name, "Deleted existing index before recreation");
        }

        let settings = self.hooks.index_settings.apply(index_settings(schema));
        match self.client.create_index(name, &settings).await {
            Ok(response) if response.is_ok() => {}
            Ok(response) => {
                let message = response
                    .error_message()
                    .unwrap_or_else(|| format!("status {}", response.status));
                tracing::error!(index = %name, error = %message, "Failed to create index");
                return LifecycleOutcome::failed(message);
            }
            Err(e) => {
                tracing::error!(index = %name, error = %e, "Failed to create index");
                return LifecycleOutcome::failed(e.to_string());
            }
        }

        let mapping = self.hooks.mapping.apply(
            self.mapping_builder
                .build(schema, &schema.options.autocomplete_fields),
        );
        match self.client.put_mapping(name, &mapping).await {
            Ok(response) if response.is_ok() => {}
            Ok(response) => {
                let message = response
                    .error_message()
                    .unwrap_or_else(|| format!("status {}", response.status));
                tracing::error!(index = %name, error = %message, "Failed to apply index mapping");
                return LifecycleOutcome::failed(message);
            }
            Err(e) => {
                tracing::error!(index = %name, error = %e, "Failed to apply index mapping");
                return LifecycleOutcome::failed(e.to_string());
            }
        }

        tracing::info!(index = %name, fields = schema.fields().len(), "Created index");
        LifecycleOutcome::Completed
    }

    /// Deletes the physical index; a missing index is not an error.
    pub async fn remove_index(&self, schema: &IndexSchema) -> LifecycleOutcome {
        if schema.read_only {
            return LifecycleOutcome::Skipped;
        }
        if !self.is_available().await {
            return LifecycleOutcome::Unavailable;
        }

        let name = self.index_name(schema);
        match self.index_exists(&name).await {
            Ok(false) => {
                tracing::debug!(index = %name, "Index to remove does not exist");
                return LifecycleOutcome::Completed;
            }
            Ok(true) => {}
            Err(outcome) => return outcome,
        }

        match self.client.delete_index(&name).await {
            Ok(response) if response.is_ok() => {
                tracing::info!(index = %name, "Removed index");
                LifecycleOutcome::Completed
            }
            Ok(response) => {
                let message = response
                    .error_message()
                    .unwrap_or_else(|| format!("status {}", response.status));
                tracing::error!(index = %name, error = %message, "Failed to remove index");
                LifecycleOutcome::failed(message)
            }
            Err(e) => {
                tracing::error!(index = %name, error = %e, "Failed to remove index");
                LifecycleOutcome::failed(e.to_string())
            }
        }
    }

    /// Indexes items and returns the submitted ids.
    ///
    /// Fails with [`IndexingError::BulkItemsFailed`] if any item is rejected,
    /// even though other items of the batch may have been written.
    pub async fn index_items(
        &self,
        schema: &IndexSchema,
        items: &[IndexItem],
    ) -> ConnectorResult<Vec<String>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.encoder.encode_index_batch(schema, items);
        let outcome = self.client.bulk(&request).await.map_err(|e| {
            tracing::error!(index = %request.index, error = %e, "Bulk indexing request failed");
            e
        })?;

        if outcome.has_errors() {
            let failures: Vec<BulkItemFailure> = outcome
                .failures()
                .map(|item| {
                    let message = item.error.clone().unwrap_or_default();
                    tracing::error!(index = %request.index, id = %item.id, error = %message, "Failed to index item");
                    BulkItemFailure {
                        id: item.id.clone(),
                        message,
                    }
                })
                .collect();
            return Err(IndexingError::BulkItemsFailed {
                index: request.index,
                failures,
            }
            .into());
        }

        tracing::debug!(index = %request.index, count = request.len(), "Indexed items");
        Ok(request.ids())
    }

    /// Removes all items by recreating the index.
    pub async fn delete_all_index_items(&self, schema: &IndexSchema) -> LifecycleOutcome {
        if schema.read_only {
            return LifecycleOutcome::Skipped;
        }
        match self.remove_index(schema).await {
            LifecycleOutcome::Completed => self.add_index(schema).await,
            other => other,
        }
    }

    /// Deletes items and refreshes the index so the deletions are visible.
    pub async fn delete_items(&self, schema: &IndexSchema, ids: &[String]) -> LifecycleOutcome {
        if ids.is_empty() {
            return LifecycleOutcome::Completed;
        }

        let request = self.encoder.encode_delete_batch(schema, ids);
        match self.client.bulk(&request).await {
            Ok(outcome) => {
                for item in outcome.failures() {
                    tracing::error!(
                        index = %request.index,
                        id = %item.id,
                        error = %item.error.as_deref().unwrap_or_default(),
                        "Failed to delete item"
                    );
                }
            }
            Err(e) => {
                tracing::error!(index = %request.index, error = %e, "Bulk delete request failed");
                return LifecycleOutcome::failed(e.to_string());
            }
        }

        if let Err(e) = self.client.refresh_index(&request.index).await {
            tracing::error!(index = %request.index, error = %e, "Failed to refresh index");
            return LifecycleOutcome::failed(e.to_string());
        }

        tracing::debug!(index = %request.index, count = request.len(), "Deleted items");
        LifecycleOutcome::Completed
    }

    /// Runs a search.
    ///
    /// Engine failures degrade to an empty result set carrying a message;
    /// only query validation errors are returned.
    pub async fn search(&self, schema: &IndexSchema, query: Query) -> ConnectorResult<ResultSet> {
        let query = self.hooks.search_query.apply(query);
        let engine_query = self.query_builder.build(&query, schema)?;
        let engine_query = self.hooks.engine_query.apply(engine_query);
        let engine_query = self.hooks.build_query.apply(engine_query);

        let name = self.index_name(schema);
        let raw = match self.client.search(&name, &engine_query).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(index = %name, error = %e, "Search failed");
                let mut results = ResultSet::empty();
                results.messages.push(e.to_string());
                return Ok(results);
            }
        };

        let results = self.decoder.decode(&query, &raw, schema);
        tracing::debug!(
            index = %name,
            total = results.result_count,
            returned = results.items.len(),
            "Search completed"
        );
        Ok(self.hooks.search_results.apply(results))
    }

    /// Returns completions for `incomplete_key`, the word being typed at the
    /// end of `user_input`.
    ///
    /// Every failure, including an ambiguous target field, yields an empty list.
    pub async fn get_autocomplete_suggestions(
        &self,
        schema: &IndexSchema,
        mut query: Query,
        incomplete_key: &str,
        user_input: &str,
    ) -> Vec<AutocompleteSuggestion> {
        let field = query.options.autocomplete.take().and_then(|a| a.field);
        query.options.autocomplete = Some(AutocompleteRequest {
            prefix: incomplete_key.to_string(),
            field,
        });
        query.options.disable_facets = true;

        let results = match self.search(schema, query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(index = %schema.id, error = %e, "Autocomplete failed");
                return Vec::new();
            }
        };

        let Some(buckets) = results
            .raw_response()
            .and_then(|raw| raw.pointer(&format!("/aggregations/{}/buckets", AUTOCOMPLETE_AGGREGATION)))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        // Bucket keys come back lowercased, like the prefix sent in the query
        let prefix = incomplete_key.to_lowercase();
        buckets
            .iter()
            .filter_map(|bucket| {
                let key = bucket.get("key")?.as_str()?;
                let suffix = key
                    .strip_prefix(prefix.as_str())
                    .or_else(|| key.get(incomplete_key.len()..))
                    .unwrap_or_default();
                Some(AutocompleteSuggestion {
                    user_input: user_input.to_string(),
                    suffix: suffix.to_string(),
                    count: bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0),
                })
            })
            .collect()
    }
}
