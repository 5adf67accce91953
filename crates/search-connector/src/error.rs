//! Error types for the search connector.
//!
//! Errors are layered the same way the backend reports them: transport
//! problems come from the [`SearchEngineClient`](crate::client::SearchEngineClient)
//! as [`ClientError`], query construction problems are [`ValidationError`]s,
//! failed bulk batches are [`IndexingError`]s, and broken settings are
//! [`ConfigError`]s. [`ConnectorError`] wraps all of them.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for connector operations.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Transport or engine response errors
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Query or schema validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Bulk indexing errors
    #[error(transparent)]
    Indexing(#[from] IndexingError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConnectorError {
    /// Returns `true` for errors the backend degrades on instead of raising.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConnectorError::Client(_))
    }
}

/// Errors reported by the search engine transport.
///
/// Both kinds are treated uniformly by the backend: logged, then degraded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The engine could not be reached.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// The engine answered with a non-success status.
    #[error("engine responded with status {status}: {message}")]
    Response { status: u16, message: String },
}

impl ClientError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        ClientError::Connection {
            message: message.into(),
        }
    }

    /// Creates a response error.
    pub fn response(status: u16, message: impl Into<String>) -> Self {
        ClientError::Response {
            status,
            message: message.into(),
        }
    }
}

/// Errors raised while translating an abstract query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// More than one field could back an autocomplete request.
    #[error(
        "autocomplete requires a single fulltext field, found {}: {}",
        .candidates.len(),
        .candidates.join(", ")
    )]
    AmbiguousAutocompleteField { candidates: Vec<String> },

    /// No field is available for an autocomplete request.
    #[error("autocomplete requires a fulltext field, none is configured")]
    NoAutocompleteField,

    /// A condition value does not fit its operator.
    #[error("invalid condition on '{field}': {message}")]
    InvalidCondition { field: String, message: String },
}

/// Errors raised by bulk indexing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexingError {
    /// At least one item of the batch was rejected by the engine.
    #[error(
        "an error occurred during indexing into {index}: {} item(s) failed, check the logs for details",
        .failures.len()
    )]
    BulkItemsFailed {
        index: String,
        failures: Vec<BulkItemFailure>,
    },
}

/// A single rejected bulk item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// The document id.
    pub id: String,
    /// The engine's error message.
    pub message: String,
}

/// Errors in connector configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No cluster is configured for the backend.
    #[error("cannot load the Elasticsearch cluster for this index: no cluster url configured")]
    MissingCluster,

    /// The cluster url could not be parsed.
    #[error("invalid cluster url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The fuzziness value is outside the supported set.
    #[error("invalid fuzziness '{value}': expected 0, auto or 1-5")]
    InvalidFuzziness { value: String },
}

/// Result type alias for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Result type alias for transport operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::response(404, "index_not_found_exception");
        assert_eq!(
            err.to_string(),
            "engine responded with status 404: index_not_found_exception"
        );
        assert!(
            ClientError::connection("refused")
                .to_string()
                .contains("connection failed")
        );
    }

    #[test]
    fn test_ambiguous_autocomplete_display() {
        let err = ValidationError::AmbiguousAutocompleteField {
            candidates: vec!["title".to_string(), "body".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("single fulltext field"));
        assert!(msg.contains("title, body"));
    }

    #[test]
    fn test_indexing_error_counts_failures() {
        let err = IndexingError::BulkItemsFailed {
            index: "products".to_string(),
            failures: vec![BulkItemFailure {
                id: "2".to_string(),
                message: "mapper_parsing_exception".to_string(),
            }],
        };
        assert!(err.to_string().contains("1 item(s) failed"));
    }

    #[test]
    fn test_recoverable_classification() {
        let transport: ConnectorError = ClientError::connection("down").into();
        assert!(transport.is_recoverable());

        let validation: ConnectorError = ValidationError::NoAutocompleteField.into();
        assert!(!validation.is_recoverable());
    }
}
