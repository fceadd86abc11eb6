//! Schema type inference and array rendering predicates

use std::fmt;

use serde_json::Value;

/// Effective type of a resolved schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Object,
    Array,
    Any,
}

impl SchemaType {
    /// Parse a JSON Schema `type` keyword
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            "object" => Self::Object,
            "array" => Self::Array,
            "any" => Self::Any,
            _ => return None,
        })
    }

    /// Keyword spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }

    /// Type of a literal JSON value
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective type: explicit `type`, else inferred from `const`, `enum` or `items`
pub fn get_schema_type(schema: &Value) -> Option<SchemaType> {
    match schema.get("type") {
        Some(Value::String(name)) => return SchemaType::parse(name),
        Some(Value::Array(names)) => {
            // A resolved node carries a single type; prefer the first non-null
            let first = names
                .iter()
                .filter_map(Value::as_str)
                .find(|n| *n != "null")
                .or_else(|| names.first().and_then(Value::as_str));
            return first.and_then(SchemaType::parse);
        }
        _ => {}
    }

    if let Some(value) = schema.get("const") {
        return Some(SchemaType::of_value(value));
    }
    if schema.get("enum").is_some() {
        return Some(SchemaType::String);
    }
    if schema.get("items").is_some() {
        return Some(SchemaType::Array);
    }
    None
}

/// Whether every option of `schema` is a fixed value (`enum` or `oneOf`/`anyOf` of consts)
pub fn is_select(schema: &Value) -> bool {
    if schema.get("enum").map(Value::is_array).unwrap_or(false) {
        return true;
    }
    ["oneOf", "anyOf"].iter().any(|key| {
        schema
            .get(*key)
            .and_then(Value::as_array)
            .map(|alts| !alts.is_empty() && alts.iter().all(|alt| alt.get("const").is_some()))
            .unwrap_or(false)
    })
}

/// Array of unique values drawn from a fixed set
pub fn is_multi_select(schema: &Value) -> bool {
    let unique = schema.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false);
    let items = match schema.get("items") {
        Some(items) if items.is_object() => items,
        _ => return false,
    };
    unique && is_select(items)
}

/// Array whose `items` is a positional list of schemas
pub fn is_tuple_array(schema: &Value) -> bool {
    schema
        .get("items")
        .and_then(Value::as_array)
        .map(|items| !items.is_empty() && items.iter().all(Value::is_object))
        .unwrap_or(false)
}

/// Array rendered entirely by a widget named in `ui:component`
pub fn is_custom_array_widget(schema: &Value) -> bool {
    if get_schema_type(schema) != Some(SchemaType::Array) {
        return false;
    }
    match schema.get("ui:component") {
        Some(Value::String(name)) => !name.is_empty(),
        Some(Value::Object(component)) => component
            .get("name")
            .and_then(Value::as_str)
            .map(|n| !n.is_empty())
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_and_inferred_types() {
        assert_eq!(get_schema_type(&json!({"type": "integer"})), Some(SchemaType::Integer));
        assert_eq!(get_schema_type(&json!({"type": ["null", "string"]})), Some(SchemaType::String));
        assert_eq!(get_schema_type(&json!({"const": true})), Some(SchemaType::Boolean));
        assert_eq!(get_schema_type(&json!({"const": 1})), Some(SchemaType::Number));
        assert_eq!(get_schema_type(&json!({"enum": [1, 2]})), Some(SchemaType::String));
        assert_eq!(get_schema_type(&json!({"items": {}})), Some(SchemaType::Array));
        assert_eq!(get_schema_type(&json!({"title": "x"})), None);
    }

    #[test]
    fn test_array_predicates() {
        let multi = json!({"type": "array", "uniqueItems": true, "items": {"enum": ["a", "b"]}});
        assert!(is_multi_select(&multi));
        assert!(!is_tuple_array(&multi));

        let one_of = json!({
            "type": "array",
            "uniqueItems": true,
            "items": {"oneOf": [{"const": 1, "title": "One"}, {"const": 2}]}
        });
        assert!(is_multi_select(&one_of));

        let tuple = json!({"type": "array", "items": [{"type": "string"}, {"type": "number"}]});
        assert!(is_tuple_array(&tuple));
        assert!(!is_multi_select(&tuple));

        let custom = json!({"type": "array", "ui:component": {"name": "table"}});
        assert!(is_custom_array_widget(&custom));
        assert!(!is_custom_array_widget(&json!({"type": "string", "ui:component": "table"})));
    }
}
