//! Physical index names.
//!
//! A logical index id becomes `{prefix}{id}{suffix}`, lower-cased and stripped
//! of everything outside `[A-Za-z0-9_]`. With a rewrite configured, prefix and
//! suffix come from it and are joined with `_`; otherwise the prefix is
//! `elasticsearch_index_{database}_`.

use crate::config::{ConnectorConfig, IndexRewrite};

/// Computes physical index names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNaming {
    prefix: String,
    suffix: String,
}

impl IndexNaming {
    /// Creates naming rules from an optional rewrite and the database name.
    pub fn new(rewrite: Option<&IndexRewrite>, database: &str) -> Self {
        match rewrite {
            Some(rewrite) => {
                let mut prefix = rewrite.prefix.clone();
                if !prefix.is_empty() && !prefix.ends_with('_') {
                    prefix.push('_');
                }
                let mut suffix = rewrite.suffix.clone();
                if !suffix.is_empty() && !suffix.starts_with('_') {
                    suffix.insert(0, '_');
                }
                Self { prefix, suffix }
            }
            None => Self {
                prefix: format!("elasticsearch_index_{}_", database),
                suffix: String::new(),
            },
        }
    }

    /// Creates naming rules from connector configuration.
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(config.cluster.rewrite.as_ref(), &config.database)
    }

    /// Returns the physical name for a logical index id.
    pub fn physical_name(&self, logical_id: &str) -> String {
        format!("{}{}{}", self.prefix, logical_id, self.suffix)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix_from_database() {
        let naming = IndexNaming::new(None, "drupal");
        assert_eq!(
            naming.physical_name("content"),
            "elasticsearch_index_drupal_content"
        );
    }

    #[test]
    fn test_rewrite_adds_separators() {
        let rewrite = IndexRewrite {
            prefix: "stage".to_string(),
            suffix: "v2".to_string(),
        };
        let naming = IndexNaming::new(Some(&rewrite), "ignored");
        assert_eq!(naming.physical_name("content"), "stage_content_v2");
    }

    #[test]
    fn test_rewrite_keeps_existing_separators() {
        let rewrite = IndexRewrite {
            prefix: "stage_".to_string(),
            suffix: "_v2".to_string(),
        };
        let naming = IndexNaming::new(Some(&rewrite), "ignored");
        assert_eq!(naming.physical_name("content"), "stage_content_v2");
    }

    #[test]
    fn test_empty_rewrite_means_bare_name() {
        let naming = IndexNaming::new(Some(&IndexRewrite::default()), "drupal");
        assert_eq!(naming.physical_name("Content"), "content");
    }

    #[test]
    fn test_strips_and_lowercases() {
        let naming = IndexNaming::new(None, "My-DB");
        assert_eq!(
            naming.physical_name("Default Index.v1"),
            "elasticsearch_index_mydb_defaultindexv1"
        );
    }
}
