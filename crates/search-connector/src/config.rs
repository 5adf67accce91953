//! Connector configuration.
//!
//! Configuration is resolved once at startup and passed to the backend; no
//! component reaches for process-wide settings at call time.
//!
//! # Example
//!
//! ```rust
//! use helios_search_connector::config::{ClusterConfig, ConnectorConfig, Fuzziness};
//!
//! let config = ConnectorConfig {
//!     cluster: ClusterConfig {
//!         url: "http://localhost:9200".to_string(),
//!         ..Default::default()
//!     },
//!     database: "drupal".to_string(),
//!     fuzziness: Fuzziness::Distance(2),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ConfigError;

/// Authentication configuration for the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Custom prefix/suffix applied to physical index names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRewrite {
    /// Prefix, joined with `_`.
    #[serde(default)]
    pub prefix: String,
    /// Suffix, joined with `_`.
    #[serde(default)]
    pub suffix: String,
}

/// Connection settings of the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster url (default: `http://localhost:9200`).
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds (default: 3).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,

    /// Index name rewrite; `None` derives the prefix from the database name.
    #[serde(default)]
    pub rewrite: Option<IndexRewrite>,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_secs() -> u64 {
    3
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            auth: None,
            disable_certificate_validation: false,
            rewrite: None,
        }
    }
}

/// Permitted edit distance for fulltext matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "FuzzinessRepr", into = "String")]
pub enum Fuzziness {
    /// Exact matching.
    Disabled,
    /// Fixed edit distance between 1 and 5.
    Distance(u8),
    /// Engine-chosen distance based on term length.
    #[default]
    Auto,
}

/// Maximum configurable edit distance.
pub const MAX_FUZZINESS: u8 = 5;

impl Fuzziness {
    /// Returns the engine's `fuzziness` value, or `None` when disabled.
    pub fn to_engine_value(&self) -> Option<Value> {
        match self {
            Fuzziness::Disabled => None,
            Fuzziness::Distance(n) => Some(json!(n)),
            Fuzziness::Auto => Some(json!("AUTO")),
        }
    }

    fn from_distance(n: u64) -> Result<Self, ConfigError> {
        match n {
            0 => Ok(Fuzziness::Disabled),
            1..=5 => Ok(Fuzziness::Distance(n as u8)),
            _ => Err(ConfigError::InvalidFuzziness {
                value: n.to_string(),
            }),
        }
    }
}

impl FromStr for Fuzziness {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Fuzziness::Auto);
        }
        trimmed
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidFuzziness {
                value: s.to_string(),
            })
            .and_then(Fuzziness::from_distance)
    }
}

impl From<Fuzziness> for String {
    fn from(fuzziness: Fuzziness) -> Self {
        match fuzziness {
            Fuzziness::Disabled => "0".to_string(),
            Fuzziness::Distance(n) => n.to_string(),
            Fuzziness::Auto => "auto".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FuzzinessRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<FuzzinessRepr> for Fuzziness {
    type Error = ConfigError;

    fn try_from(repr: FuzzinessRepr) -> Result<Self, Self::Error> {
        match repr {
            FuzzinessRepr::Number(n) => Fuzziness::from_distance(n),
            FuzzinessRepr::Text(s) => s.parse(),
        }
    }
}

/// Configuration for the connector backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Cluster connection settings.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Database/tenant name used in the default index prefix.
    #[serde(default = "default_database")]
    pub database: String,

    /// Fulltext fuzziness (default: auto).
    #[serde(default)]
    pub fuzziness: Fuzziness,

    /// Page size used when a query sets no limit (default: 10).
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Bucket size used for facets without a limit (default: 10000).
    #[serde(default = "default_facet_no_limit_size")]
    pub facet_no_limit_size: u32,

    /// Maximum number of autocomplete buckets (default: 10).
    #[serde(default = "default_autocomplete_size")]
    pub autocomplete_size: u32,

    /// Whether spelling suggestions are requested by default (default: true).
    #[serde(default = "default_spellcheck")]
    pub spellcheck: bool,
}

fn default_database() -> String {
    "default".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_facet_no_limit_size() -> u32 {
    10000
}

fn default_autocomplete_size() -> u32 {
    10
}

fn default_spellcheck() -> bool {
    true
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            database: default_database(),
            fuzziness: Fuzziness::default(),
            default_page_size: default_page_size(),
            facet_no_limit_size: default_facet_no_limit_size(),
            autocomplete_size: default_autocomplete_size(),
            spellcheck: default_spellcheck(),
        }
    }
}

impl ConnectorConfig {
    /// Validates settings the backend cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.cluster.url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingCluster);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                message: "expected an http or https url".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.cluster.url, "http://localhost:9200");
        assert_eq!(config.database, "default");
        assert_eq!(config.fuzziness, Fuzziness::Auto);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.facet_no_limit_size, 10000);
        assert!(config.cluster.rewrite.is_none());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: ConnectorConfig = serde_json::from_str(
            r#"{ "cluster": { "url": "https://es.example.com", "rewrite": { "prefix": "stage" } }, "fuzziness": 2 }"#,
        )
        .unwrap();
        assert_eq!(config.cluster.url, "https://es.example.com");
        assert_eq!(config.cluster.timeout_secs, 3);
        assert_eq!(
            config.cluster.rewrite.as_ref().map(|r| r.prefix.as_str()),
            Some("stage")
        );
        assert_eq!(config.fuzziness, Fuzziness::Distance(2));
    }

    #[test]
    fn test_fuzziness_parsing() {
        assert_eq!("auto".parse::<Fuzziness>().unwrap(), Fuzziness::Auto);
        assert_eq!("0".parse::<Fuzziness>().unwrap(), Fuzziness::Disabled);
        assert_eq!("5".parse::<Fuzziness>().unwrap(), Fuzziness::Distance(5));
        assert!("6".parse::<Fuzziness>().is_err());
        assert!("fuzzy".parse::<Fuzziness>().is_err());
    }

    #[test]
    fn test_fuzziness_roundtrip_as_string() {
        let json = serde_json::to_string(&Fuzziness::Distance(3)).unwrap();
        assert_eq!(json, "\"3\"");
        let back: Fuzziness = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Fuzziness::Distance(3));
    }

    #[test]
    fn test_fuzziness_engine_value() {
        assert_eq!(Fuzziness::Disabled.to_engine_value(), None);
        assert_eq!(Fuzziness::Auto.to_engine_value(), Some(json!("AUTO")));
        assert_eq!(Fuzziness::Distance(1).to_engine_value(), Some(json!(1)));
    }

    #[test]
    fn test_validate_missing_cluster() {
        let config = ConnectorConfig {
            cluster: ClusterConfig {
                url: "  ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingCluster));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = ConnectorConfig {
            cluster: ClusterConfig {
                url: "localhost:9200".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }
}
