//! Conversion between expression values and JSON form data

use crate::value::Value;

/// Convert a JSON value into an expression value
pub fn json_to_script_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => {
            Value::Array(arr.iter().map(json_to_script_value).collect())
        }
        serde_json::Value::Object(obj) => {
            Value::Object(obj.iter().map(|(k, v)| (k.clone(), json_to_script_value(v))).collect())
        }
    }
}

/// Convert an expression value back into JSON
pub fn script_to_json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        // NaN and infinities have no JSON form
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(script_to_json_value).collect())
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            serde_json::Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), script_to_json_value(&obj[k])))
                    .collect(),
            )
        }
        Value::Native(_) => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_conversion() {
        let data = json!({ "name": "web", "replicas": 3, "ratio": 0.5, "tags": ["a", null] });
        let script = json_to_script_value(&data);

        if let Value::Object(obj) = &script {
            assert_eq!(obj.get("replicas"), Some(&Value::Int(3)));
            assert_eq!(obj.get("ratio"), Some(&Value::Float(0.5)));
        } else {
            panic!("Expected object");
        }
        assert_eq!(script_to_json_value(&script), data);
    }

    #[test]
    fn test_unrepresentable_values_become_null() {
        assert_eq!(script_to_json_value(&Value::Float(f64::NAN)), serde_json::Value::Null);
        let native = crate::value::NativeFunction::new("f", 0, |_| Ok(Value::Null));
        assert_eq!(script_to_json_value(&Value::Native(native)), serde_json::Value::Null);
    }
}
