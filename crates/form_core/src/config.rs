//! Per-form configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::DEFAULT_NAMESPACE;

/// Tunables for a single form instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    /// Prefix for conventional base widget names
    pub namespace: String,
    /// Longest allowed chain of reactions triggering reactions
    pub max_reaction_depth: usize,
    /// Label width used when titles are hidden.
    ///
    /// Some host toolkits read `0` as "unset", so a tiny non-zero width is used.
    pub hidden_label_width: f64,
    /// Run per-field validation after every input
    pub validate_on_change: bool,
    /// Message shown for required fields left empty
    pub required_message: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_reaction_depth: 16,
            hidden_label_width: 0.1,
            validate_on_change: true,
            required_message: "required".to_string(),
        }
    }
}

impl FormConfig {
    /// Parse from a JSON document; missing keys take their defaults
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Override the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Override the reaction depth limit
    pub fn with_max_reaction_depth(mut self, depth: usize) -> Self {
        self.max_reaction_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FormConfig::default();
        assert_eq!(config.namespace, "bk");
        assert_eq!(config.hidden_label_width, 0.1);
        assert!(config.validate_on_change);
    }

    #[test]
    fn test_partial_json() {
        let config =
            FormConfig::from_json(r#"{"namespace": "tea", "maxReactionDepth": 4}"#).unwrap();
        assert_eq!(config.namespace, "tea");
        assert_eq!(config.max_reaction_depth, 4);
        assert_eq!(config.required_message, "required");
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(FormConfig::from_json("{"), Err(Error::Config(_))));
    }
}
