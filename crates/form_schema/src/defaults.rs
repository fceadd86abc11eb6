//! Initial value derivation

use serde_json::{Map, Value};

use crate::kind::{get_schema_type, is_tuple_array, SchemaType};

/// Compute the initial value for a schema node.
///
/// Objects are populated property by property, with an object-valued
/// `default` overlaid on top. Tuple arrays default each position; other
/// arrays only take their literal `default`. Scalars use `default` or the
/// zero value of their type. Returns `None` for `any` and untyped nodes
/// without a `default`.
pub fn get_schema_default_value(schema: &Value) -> Option<Value> {
    let literal = schema.get("default").cloned();

    match get_schema_type(schema) {
        Some(SchemaType::Null) => Some(Value::Null),
        Some(SchemaType::Object) => {
            let mut object = Map::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    if let Some(value) = get_schema_default_value(prop) {
                        object.insert(name.clone(), value);
                    }
                }
            }
            if let Some(Value::Object(overlay)) = literal {
                for (name, value) in overlay {
                    object.insert(name, value);
                }
            }
            Some(Value::Object(object))
        }
        Some(SchemaType::Array) => {
            if let Some(literal) = literal {
                return Some(literal);
            }
            if is_tuple_array(schema) {
                let items = schema
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .map(|item| get_schema_default_value(item).unwrap_or(Value::Null))
                            .collect()
                    })
                    .unwrap_or_default();
                return Some(Value::Array(items));
            }
            Some(Value::Array(Vec::new()))
        }
        Some(kind) => literal.or_else(|| zero_value(kind)),
        None => literal,
    }
}

/// Type-keyed zero value
pub fn zero_value(kind: SchemaType) -> Option<Value> {
    match kind {
        SchemaType::String => Some(Value::String(String::new())),
        SchemaType::Number | SchemaType::Integer => Some(Value::from(0)),
        SchemaType::Boolean => Some(Value::Bool(false)),
        SchemaType::Array => Some(Value::Array(Vec::new())),
        SchemaType::Object => Some(Value::Object(Map::new())),
        SchemaType::Null => Some(Value::Null),
        SchemaType::Any => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_defaults() {
        assert_eq!(get_schema_default_value(&json!({"type": "string"})), Some(json!("")));
        assert_eq!(get_schema_default_value(&json!({"type": "integer"})), Some(json!(0)));
        assert_eq!(get_schema_default_value(&json!({"type": "boolean"})), Some(json!(false)));
        assert_eq!(
            get_schema_default_value(&json!({"type": "null", "default": 3})),
            Some(json!(null))
        );
        assert_eq!(
            get_schema_default_value(&json!({"type": "string", "default": "hi"})),
            Some(json!("hi"))
        );
        assert_eq!(get_schema_default_value(&json!({"type": "any"})), None);
    }

    #[test]
    fn test_object_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "enabled": {"type": "boolean", "default": true},
                "anything": {"type": "any"},
                "nested": {"type": "object", "properties": {"count": {"type": "number"}}}
            },
            "default": {"name": "web"}
        });
        assert_eq!(
            get_schema_default_value(&schema),
            Some(json!({"name": "web", "enabled": true, "nested": {"count": 0}}))
        );
    }

    #[test]
    fn test_array_defaults() {
        let tuple = json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "number", "default": 8}]
        });
        assert_eq!(get_schema_default_value(&tuple), Some(json!(["", 8])));

        let list = json!({"type": "array", "items": {"type": "string", "default": "x"}});
        assert_eq!(get_schema_default_value(&list), Some(json!([])));

        let literal = json!({"type": "array", "default": ["a"]});
        assert_eq!(get_schema_default_value(&literal), Some(json!(["a"])));
    }
}
