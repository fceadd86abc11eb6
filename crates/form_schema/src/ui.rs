//! Field, widget and presentation option selection
//!
//! Everything here reads the `ui:*` extension keywords of one resolved schema
//! node. Lookups against the `Registry` decide which registered field or
//! widget renders the node.

use form_core::{Registry, WidgetRef};
use serde_json::{Map, Value};

use crate::kind::{get_schema_type, is_multi_select, is_select, SchemaType};

/// Field used for object nodes
pub const OBJECT_FIELD: &str = "object";
/// Field used for array nodes
pub const ARRAY_FIELD: &str = "array";
/// Field used for every leaf node
pub const WIDGET_FIELD: &str = "widget";

/// `ui:component` in normalized form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiComponent {
    pub name: Option<String>,
    pub props: Map<String, Value>,
}

/// `ui:group` in normalized form
#[derive(Debug, Clone, PartialEq)]
pub struct GroupWrap {
    pub name: String,
    pub props: Map<String, Value>,
}

impl Default for GroupWrap {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            props: Map::new(),
        }
    }
}

/// Pick the field that renders `schema`.
///
/// An explicit `ui:field` always wins. Otherwise the type picks one of the
/// built-in field names, provided it has been registered.
pub fn get_schema_field<C: Clone>(schema: &Value, registry: &Registry<C>) -> Option<String> {
    match schema.get("ui:field") {
        Some(Value::String(name)) if !name.is_empty() => return Some(name.clone()),
        Some(Value::Object(field)) => {
            if let Some(name) = field.get("name").and_then(Value::as_str) {
                return Some(name.to_string());
            }
        }
        _ => {}
    }

    let name = match get_schema_type(schema) {
        Some(SchemaType::Object) => OBJECT_FIELD,
        Some(SchemaType::Array) => ARRAY_FIELD,
        _ => WIDGET_FIELD,
    };
    registry.has_field(name).then(|| name.to_string())
}

/// Normalize `ui:component`
pub fn get_ui_component(schema: &Value) -> UiComponent {
    match schema.get("ui:component") {
        Some(Value::String(name)) => UiComponent {
            name: Some(name.clone()).filter(|n| !n.is_empty()),
            props: Map::new(),
        },
        Some(Value::Object(component)) => UiComponent {
            name: component
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            props: component
                .get("props")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        },
        _ => UiComponent::default(),
    }
}

/// Pick the base widget for a leaf node.
///
/// `ui:component` names a component or base widget directly. Fixed option
/// sets render as `select`; remaining types use the built-in table.
/// A `null` node renders nothing.
pub fn get_default_widget<C: Clone>(
    schema: &Value,
    registry: &Registry<C>,
) -> Option<WidgetRef<C>> {
    if let Some(name) = get_ui_component(schema).name {
        if let Some(component) = registry.get_component(&name) {
            return Some(WidgetRef::Registered(component.clone()));
        }
        return Some(registry.get_base_widget(&name));
    }

    if is_select(schema) || is_multi_select(schema) {
        return Some(registry.get_base_widget("select"));
    }

    let name = match get_schema_type(schema) {
        Some(SchemaType::String | SchemaType::Number | SchemaType::Integer) => "input",
        Some(SchemaType::Boolean) => "switcher",
        Some(SchemaType::Null) => return None,
        other => {
            log::warn!(
                "no default widget for schema type {}",
                other.map(|t| t.as_str()).unwrap_or("<none>")
            );
            return None;
        }
    };
    Some(registry.get_base_widget(name))
}

/// Presentation options for the form item wrapping a field.
///
/// `ui:props` overrides the derived values. When the title is hidden the
/// label width is forced to `hidden_label_width`.
pub fn get_ui_options(schema: &Value, hidden_label_width: f64) -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("showTitle".into(), Value::Bool(true));
    if let Some(title) = schema.get("title") {
        options.insert("label".into(), title.clone());
    }
    for key in ["description", "minLength", "maxLength"] {
        if let Some(value) = schema.get(key) {
            options.insert(key.into(), value.clone());
        }
    }

    if let Some(props) = schema.get("ui:props").and_then(Value::as_object) {
        for (key, value) in props {
            options.insert(key.clone(), value.clone());
        }
    }

    let show_title = options.get("showTitle").and_then(Value::as_bool).unwrap_or(true);
    if !show_title {
        options.insert("labelWidth".into(), Value::from(hidden_label_width));
    }
    options
}

/// Normalize `ui:group`
pub fn get_group_wrap(schema: &Value) -> GroupWrap {
    match schema.get("ui:group") {
        Some(Value::String(name)) if !name.is_empty() => GroupWrap {
            name: name.clone(),
            props: Map::new(),
        },
        Some(Value::Object(group)) => {
            let mut props = group
                .get("props")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            // Extra keys beside name and props are props too
            let extra = group
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "name" | "props"));
            for (key, value) in extra {
                props.entry(key.clone()).or_insert_with(|| value.clone());
            }
            GroupWrap {
                name: group
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("default")
                    .to_string(),
                props,
            }
        }
        _ => GroupWrap::default(),
    }
}

/// Property names of an object node in render order.
///
/// `ui:order` lists names explicitly; `"*"` marks where the unlisted ones
/// go. Without a wildcard the unlisted names follow the listed ones.
pub fn ordered_properties(schema: &Value) -> Vec<String> {
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let names: Vec<String> = props.keys().cloned().collect();

    let Some(order) = schema.get("ui:order").and_then(Value::as_array) else {
        return names;
    };
    let order: Vec<&str> = order.iter().filter_map(Value::as_str).collect();

    let rest: Vec<String> = names
        .iter()
        .filter(|n| !order.contains(&n.as_str()))
        .cloned()
        .collect();

    let mut out = Vec::with_capacity(names.len());
    let mut placed_rest = false;
    for entry in &order {
        if *entry == "*" {
            if !placed_rest {
                out.extend(rest.iter().cloned());
                placed_rest = true;
            }
        } else if props.contains_key(*entry) {
            if !out.iter().any(|n| n == entry) {
                out.push(entry.to_string());
            }
        } else {
            log::debug!("ui:order names unknown property '{}'", entry);
        }
    }
    if !placed_rest {
        out.extend(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.add_fields_map([
            ("object", "ObjectField".to_string()),
            ("widget", "WidgetField".to_string()),
        ]);
        registry.add_components_map([("colorful", "ColorPicker".to_string())]);
        registry
    }

    #[test]
    fn test_schema_field() {
        let registry = registry();
        assert_eq!(get_schema_field(&json!({"type": "object"}), &registry), Some("object".into()));
        assert_eq!(get_schema_field(&json!({"type": "string"}), &registry), Some("widget".into()));
        // No array field registered
        assert_eq!(get_schema_field(&json!({"type": "array"}), &registry), None);
        assert_eq!(
            get_schema_field(&json!({"type": "array", "ui:field": "table"}), &registry),
            Some("table".into())
        );
    }

    #[test]
    fn test_default_widget() {
        let registry = registry();
        assert_eq!(
            get_default_widget(&json!({"type": "integer"}), &registry),
            Some(WidgetRef::Conventional("bk-input".into()))
        );
        assert_eq!(
            get_default_widget(&json!({"type": "string", "enum": ["a"]}), &registry),
            Some(WidgetRef::Conventional("bk-select".into()))
        );
        assert_eq!(
            get_default_widget(&json!({"type": "string", "ui:component": "colorful"}), &registry),
            Some(WidgetRef::Registered("ColorPicker".into()))
        );
        assert_eq!(
            get_default_widget(
                &json!({"type": "string", "ui:component": {"name": "radio"}}),
                &registry
            ),
            Some(WidgetRef::Conventional("bk-radio".into()))
        );
        assert_eq!(get_default_widget(&json!({"type": "null"}), &registry), None);
        assert_eq!(get_default_widget(&json!({"type": "object"}), &registry), None);
    }

    #[test]
    fn test_ui_options() {
        let schema = json!({
            "title": "Name",
            "description": "Cluster name",
            "maxLength": 10,
            "ui:props": {"placeholder": "enter"}
        });
        let options = get_ui_options(&schema, 0.1);
        assert_eq!(options["showTitle"], json!(true));
        assert_eq!(options["label"], json!("Name"));
        assert_eq!(options["maxLength"], json!(10));
        assert_eq!(options["placeholder"], json!("enter"));
        assert!(!options.contains_key("labelWidth"));

        let hidden = get_ui_options(
            &json!({"ui:props": {"showTitle": false, "labelWidth": 0}}),
            0.1,
        );
        assert_eq!(hidden["labelWidth"], json!(0.1));
    }

    #[test]
    fn test_group_wrap() {
        assert_eq!(get_group_wrap(&json!({})).name, "default");
        assert_eq!(get_group_wrap(&json!({"ui:group": "card"})).name, "card");

        let group = get_group_wrap(&json!({
            "ui:group": {"name": "tab", "props": {"border": true}, "title": "T"}
        }));
        assert_eq!(group.name, "tab");
        assert_eq!(group.props["border"], json!(true));
        assert_eq!(group.props["title"], json!("T"));
    }

    #[test]
    fn test_ordered_properties() {
        let schema = json!({
            "properties": {"a": {}, "b": {}, "c": {}, "d": {}},
            "ui:order": ["c", "*", "a", "missing"]
        });
        assert_eq!(ordered_properties(&schema), vec!["c", "b", "d", "a"]);

        let no_wildcard = json!({"properties": {"a": {}, "b": {}, "c": {}}, "ui:order": ["b"]});
        assert_eq!(ordered_properties(&no_wildcard), vec!["b", "a", "c"]);
    }
}
