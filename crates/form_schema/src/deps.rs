//! Required-ness and property dependencies

use serde_json::Value;

/// What a property's presence implies, from the `dependencies` keyword
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    /// Other properties become required
    Properties(Vec<String>),
    /// The parent must also satisfy this schema
    Schema(Value),
}

/// Whether `prop` is listed in the parent object's `required`
pub fn is_required(parent: &Value, prop: &str) -> bool {
    parent
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().any(|n| n.as_str() == Some(prop)))
        .unwrap_or(false)
}

/// Dependency declared for `prop`
pub fn get_dependencies(schema: &Value, prop: &str) -> Option<Dependency> {
    match schema.get("dependencies")?.get(prop)? {
        Value::Array(names) => Some(Dependency::Properties(
            names.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        )),
        value @ Value::Object(_) => Some(Dependency::Schema(value.clone())),
        _ => None,
    }
}

/// Properties made required by the properties present in `data`
pub fn dependent_required(schema: &Value, data: &Value) -> Vec<String> {
    let (Some(deps), Some(data)) = (
        schema.get("dependencies").and_then(Value::as_object),
        data.as_object(),
    ) else {
        return Vec::new();
    };

    let mut out: Vec<String> = Vec::new();
    for (prop, dep) in deps {
        if !data.get(prop).map(is_present).unwrap_or(false) {
            continue;
        }
        if let Value::Array(names) = dep {
            for name in names.iter().filter_map(Value::as_str) {
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_string());
                }
            }
        }
    }
    out
}

/// Whether a value counts as filled in for required checks
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {}, "card": {}, "billing": {}, "region": {}},
            "dependencies": {
                "card": ["billing"],
                "region": {"properties": {"zone": {"type": "string"}}}
            }
        })
    }

    #[test]
    fn test_is_required() {
        assert!(is_required(&schema(), "name"));
        assert!(!is_required(&schema(), "card"));
        assert!(!is_required(&json!({}), "name"));
    }

    #[test]
    fn test_get_dependencies() {
        assert_eq!(
            get_dependencies(&schema(), "card"),
            Some(Dependency::Properties(vec!["billing".into()]))
        );
        assert!(matches!(get_dependencies(&schema(), "region"), Some(Dependency::Schema(_))));
        assert_eq!(get_dependencies(&schema(), "name"), None);
    }

    #[test]
    fn test_dependent_required() {
        assert_eq!(dependent_required(&schema(), &json!({"card": "4242"})), vec!["billing"]);
        assert!(dependent_required(&schema(), &json!({"card": ""})).is_empty());
        assert!(dependent_required(&schema(), &json!({"region": "eu"})).is_empty());
    }

    #[test]
    fn test_is_present() {
        for empty in [json!(null), json!(""), json!([]), json!({})] {
            assert!(!is_present(&empty), "{empty} counts as empty");
        }
        for filled in [json!(0), json!(false), json!(" "), json!([null]), json!({"a": null})] {
            assert!(is_present(&filled), "{filled} counts as filled");
        }
    }
}
