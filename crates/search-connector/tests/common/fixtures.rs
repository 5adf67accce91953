//! Schema and backend fixtures.

use std::sync::Arc;

use helios_search_connector::hooks::Hooks;
use helios_search_connector::types::{FieldSpec, FieldType, IndexSchema};
use helios_search_connector::{ConnectorConfig, IndexBackend};

use super::mock_client::MockClient;

/// `{id: string, title: text, price: decimal}`.
pub fn product_schema() -> IndexSchema {
    IndexSchema::new("products")
        .with_field(FieldSpec::new("id", FieldType::String))
        .with_field(FieldSpec::new("title", FieldType::Text))
        .with_field(FieldSpec::new("price", FieldType::Decimal))
}

/// A schema with two fulltext fields and a facetable color.
pub fn article_schema() -> IndexSchema {
    IndexSchema::new("articles")
        .with_field(FieldSpec::new("title", FieldType::Text))
        .with_field(FieldSpec::new("body", FieldType::Text))
        .with_field(FieldSpec::new("color", FieldType::String))
}

/// Creates a backend over the given mock with default configuration.
pub fn backend(client: &Arc<MockClient>) -> IndexBackend {
    backend_with_hooks(client, Hooks::default())
}

/// Creates a backend over the given mock with hooks.
pub fn backend_with_hooks(client: &Arc<MockClient>, hooks: Hooks) -> IndexBackend {
    let config = ConnectorConfig {
        database: "test".to_string(),
        ..Default::default()
    };
    IndexBackend::with_hooks(client.clone(), config, hooks).expect("valid test configuration")
}
