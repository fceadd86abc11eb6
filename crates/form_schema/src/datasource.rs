//! Option lists for choice widgets
//!
//! A datasource is the list of `{label, value}` records a select, radio or
//! checkbox offers. It comes from the schema itself or from a remote
//! endpoint described by `ui:component.props.remoteConfig`.

use form_core::path::path_value;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ui::get_ui_component;

/// One selectable option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceItem {
    pub label: String,
    pub value: Value,
    /// Any other keys carried by the source record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataSourceItem {
    /// Option whose label is the text of its value
    pub fn from_value(value: Value) -> Self {
        Self {
            label: label_text(&value),
            value,
            extra: Map::new(),
        }
    }
}

/// Declarative mapping of a list response onto option records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseMapping {
    /// Dotted path to the list inside the response; the response itself when empty
    pub data_key: String,
    pub label_key: String,
    pub value_key: String,
}

impl Default for ResponseMapping {
    fn default() -> Self {
        Self {
            data_key: String::new(),
            label_key: "label".to_string(),
            value_key: "value".to_string(),
        }
    }
}

impl ResponseMapping {
    /// Turn a response into options. Returns `None` if the list is missing.
    pub fn apply(&self, response: &Value) -> Option<Vec<DataSourceItem>> {
        let list = path_value(response, &self.data_key, 0)?.as_array()?;
        Some(list.iter().map(|record| self.map_record(record)).collect())
    }

    fn map_record(&self, record: &Value) -> DataSourceItem {
        let Some(object) = record.as_object() else {
            return DataSourceItem::from_value(record.clone());
        };
        let value = object.get(&self.value_key).cloned().unwrap_or(Value::Null);
        let label = object
            .get(&self.label_key)
            .map(label_text)
            .unwrap_or_else(|| label_text(&value));
        let extra = object
            .iter()
            .filter(|(k, _)| **k != self.label_key && **k != self.value_key)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        DataSourceItem { label, value, extra }
    }
}

/// Endpoint description for remotely loaded options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default = "default_response_type")]
    pub response_type: String,
    #[serde(default)]
    pub response_parse: Option<ResponseMapping>,
}

fn default_method() -> String {
    "get".to_string()
}

fn default_response_type() -> String {
    "json".to_string()
}

/// Options known without a request.
///
/// Explicit `datasource` prop first, then `enum` (or `items.enum` for
/// multi-selects), then `oneOf`/`anyOf` constants labelled by their title.
pub fn resolve_default_datasource(schema: &Value) -> Vec<DataSourceItem> {
    if let Some(list) = get_ui_component(schema).props.get("datasource").and_then(Value::as_array) {
        return list
            .iter()
            .map(|record| ResponseMapping::default().map_record(record))
            .collect();
    }

    let enum_values = schema
        .get("enum")
        .or_else(|| schema.get("items").and_then(|items| items.get("enum")))
        .and_then(Value::as_array);
    if let Some(values) = enum_values {
        return values.iter().cloned().map(DataSourceItem::from_value).collect();
    }

    let node = if schema.get("oneOf").is_some() || schema.get("anyOf").is_some() {
        schema
    } else {
        schema.get("items").unwrap_or(schema)
    };
    let alternatives = node
        .get("oneOf")
        .or_else(|| node.get("anyOf"))
        .and_then(Value::as_array);
    alternatives
        .map(|alts| {
            alts.iter()
                .filter_map(|alt| {
                    let value = alt.get("const")?.clone();
                    let label = alt
                        .get("title")
                        .map(label_text)
                        .unwrap_or_else(|| label_text(&value));
                    Some(DataSourceItem {
                        label,
                        value,
                        extra: Map::new(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Remote endpoint configured on the node, if any
pub fn remote_config(schema: &Value) -> Option<RemoteConfig> {
    let raw = get_ui_component(schema).props.get("remoteConfig")?.clone();
    match serde_json::from_value(raw) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("invalid remoteConfig: {}", e);
            None
        }
    }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_datasource() {
        let items = resolve_default_datasource(&json!({"enum": ["a", 2]}));
        assert_eq!(items[0].label, "a");
        assert_eq!(items[1].label, "2");
        assert_eq!(items[1].value, json!(2));

        let multi = resolve_default_datasource(&json!({"type": "array", "items": {"enum": ["x"]}}));
        assert_eq!(multi.len(), 1);
    }

    #[test]
    fn test_one_of_datasource() {
        let schema = json!({
            "oneOf": [{"const": "eu", "title": "Europe"}, {"const": "us"}, {"title": "skip"}]
        });
        let items = resolve_default_datasource(&schema);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "Europe");
        assert_eq!(items[1].label, "us");
    }

    #[test]
    fn test_explicit_datasource_wins() {
        let schema = json!({
            "enum": ["a"],
            "ui:component": {
                "name": "radio",
                "props": {"datasource": [{"label": "On", "value": 1, "tip": "t"}]}
            }
        });
        let items = resolve_default_datasource(&schema);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "On");
        assert_eq!(items[0].extra["tip"], json!("t"));
    }

    #[test]
    fn test_response_mapping() {
        let mapping = ResponseMapping {
            data_key: "data.items".into(),
            label_key: "name".into(),
            value_key: "id".into(),
        };
        let response = json!({"data": {"items": [{"name": "node-1", "id": 1, "ip": "10.0.0.1"}]}});
        let items = mapping.apply(&response).unwrap();
        assert_eq!(items[0].label, "node-1");
        assert_eq!(items[0].value, json!(1));
        assert_eq!(items[0].extra["ip"], json!("10.0.0.1"));

        assert!(mapping.apply(&json!({"data": {}})).is_none());
    }

    #[test]
    fn test_remote_config() {
        let schema = json!({
            "ui:component": {"name": "select", "props": {"remoteConfig": {
                "url": "/api/nodes",
                "params": {"cluster": "c1"},
                "responseParse": {"dataKey": "data", "labelKey": "name"}
            }}}
        });
        let config = remote_config(&schema).unwrap();
        assert_eq!(config.method, "get");
        assert_eq!(config.response_type, "json");
        let parse = config.response_parse.unwrap();
        assert_eq!(parse.label_key, "name");
        assert_eq!(parse.value_key, "value");

        assert!(remote_config(&json!({"type": "string"})).is_none());
    }
}
