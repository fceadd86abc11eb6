//! Remote option loading for choice widgets

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use form_schema::{DataSourceItem, RemoteConfig, ResponseMapping};
use serde_json::{Map, Value};

use crate::error::LoadError;

/// Request settings handed to the loader
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: String,
    /// Query parameters for GET-like methods, JSON body otherwise
    pub params: Map<String, Value>,
    pub headers: Map<String, Value>,
    pub response_type: String,
}

impl RequestConfig {
    /// Settings from a field's remote config, with already evaluated params
    pub fn from_remote(remote: &RemoteConfig, params: Map<String, Value>) -> Self {
        Self {
            method: remote.method.to_lowercase(),
            params,
            headers: remote.headers.clone(),
            response_type: remote.response_type.clone(),
        }
    }

    /// Whether params travel in the query string
    pub fn params_in_query(&self) -> bool {
        matches!(self.method.as_str(), "get" | "head" | "delete" | "options")
    }
}

/// HTTP collaborator used to fetch options
#[async_trait]
pub trait DataSourceLoader: Send + Sync {
    /// Perform the request and return the parsed response body
    async fn request(&self, url: &str, config: &RequestConfig) -> Result<Value, LoadError>;
}

/// Custom response parser
pub type ParseFn = Arc<dyn Fn(&Value) -> Result<Vec<DataSourceItem>, LoadError> + Send + Sync>;

/// How a response becomes options
#[derive(Clone)]
pub enum ResponseParse {
    Mapping(ResponseMapping),
    Custom(ParseFn),
}

impl ResponseParse {
    /// Declared mapping, or the default `label`/`value` mapping
    pub fn from_remote(remote: &RemoteConfig) -> Self {
        Self::Mapping(remote.response_parse.clone().unwrap_or_default())
    }

    /// Parse a response
    pub fn parse(&self, response: &Value) -> Result<Vec<DataSourceItem>, LoadError> {
        match self {
            Self::Mapping(mapping) => mapping.apply(response).ok_or_else(|| {
                let key = if mapping.data_key.is_empty() {
                    "<response>"
                } else {
                    mapping.data_key.as_str()
                };
                LoadError::Response(format!("'{}' is not a list", key))
            }),
            Self::Custom(parse) => parse(response),
        }
    }
}

impl fmt::Debug for ResponseParse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mapping(mapping) => f.debug_tuple("Mapping").field(mapping).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_parse() {
        let parse = ResponseParse::Mapping(ResponseMapping {
            data_key: "data.items".into(),
            label_key: "name".into(),
            value_key: "id".into(),
        });
        let items = parse
            .parse(&json!({"data": {"items": [{"name": "Alpha", "id": 1}]}}))
            .unwrap();
        assert_eq!(items[0].label, "Alpha");
        assert_eq!(items[0].value, json!(1));

        assert!(matches!(parse.parse(&json!({"data": {}})), Err(LoadError::Response(_))));
    }

    #[test]
    fn test_custom_parse() {
        let parse = ResponseParse::Custom(Arc::new(|response: &Value| {
            Ok(response
                .as_array()
                .map(|names| names.iter().cloned().map(DataSourceItem::from_value).collect())
                .unwrap_or_default())
        }));
        let items = parse.parse(&json!(["a", "b"])).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_params_placement() {
        let remote: RemoteConfig =
            serde_json::from_value(json!({"url": "/api", "method": "POST"})).unwrap();
        let config = RequestConfig::from_remote(&remote, Map::new());
        assert_eq!(config.method, "post");
        assert!(!config.params_in_query());
    }
}
