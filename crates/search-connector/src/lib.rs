//! Helios Search Connector
//!
//! This crate connects a content-indexing application to an Elasticsearch
//! cluster. It maps index schemas to engine mappings, encodes documents into
//! bulk batches, translates abstract queries (keywords, conditions, facets,
//! sorting, paging, autocomplete) into the query DSL, and decodes responses
//! back into result sets.
//!
//! # Features
//!
//! - `elasticsearch` (default) - [`ElasticsearchClient`] transport on top of
//!   the official client
//! - `cli` - the `search-connector-probe` binary
//!
//! # Architecture
//!
//! - [`types`] - schemas, items, queries and results
//! - [`naming`] - physical index names
//! - [`mapping`] - index settings and mappings
//! - [`bulk`] - bulk document encoding
//! - [`search`] - query translation
//! - [`response`] - response decoding
//! - [`backend`] - lifecycle operations and failure policy
//! - [`client`] - the transport seam
//! - [`hooks`] - extension points
//! - [`config`] - configuration
//! - [`error`] - error types
//!
//! # Quick Start
//!
//! ```no_run
//! use helios_search_connector::config::ConnectorConfig;
//! use helios_search_connector::hooks::Hooks;
//! use helios_search_connector::types::{FieldSpec, FieldType, IndexItem, IndexSchema, Query};
//! use helios_search_connector::IndexBackend;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = IndexBackend::connect(ConnectorConfig::default(), Hooks::default())?;
//!
//! let schema = IndexSchema::new("products")
//!     .with_field(FieldSpec::new("title", FieldType::Text))
//!     .with_field(FieldSpec::new("price", FieldType::Decimal));
//!
//! backend.add_index(&schema).await;
//! backend
//!     .index_items(
//!         &schema,
//!         &[IndexItem::new("1")
//!             .with_value("title", "red shoes")
//!             .with_value("price", 19.99)],
//!     )
//!     .await?;
//!
//! let results = backend.search(&schema, Query::new().with_keys("shoes")).await?;
//! println!("{} hits", results.result_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backend;
pub mod bulk;
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod mapping;
pub mod naming;
pub mod response;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use backend::{IndexBackend, LifecycleOutcome};
pub use client::SearchEngineClient;
pub use config::{ClusterConfig, ConnectorConfig, Fuzziness};
pub use error::{ConnectorError, ConnectorResult};

#[cfg(feature = "elasticsearch")]
pub use client::elasticsearch::ElasticsearchClient;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
