//! `allOf` composition
//!
//! Schemas are folded left to right. Per keyword:
//! - objects on both sides merge recursively
//! - an object against a non-object wins, except for `additionalProperties`
//!   where anything but a literal `true` on the other side forces `false`
//! - arrays intersect (`required` unions); an empty intersection is an error
//! - an array against a scalar requires the scalar to be a member
//! - numeric bounds tighten, `multipleOf` takes the least common multiple
//! - any other scalar pair keeps the left value

use serde_json::{Map, Number, Value};

use crate::error::{SchemaError, SchemaResult};

/// Upper-bound keywords: the merge keeps the smaller value
pub const MAX_KEYWORDS: &[&str] = &[
    "maximum",
    "maxItems",
    "maxLength",
    "exclusiveMaximum",
    "maxProperties",
];

/// Lower-bound keywords: the merge keeps the larger value
pub const MIN_KEYWORDS: &[&str] = &[
    "minimum",
    "minItems",
    "minLength",
    "exclusiveMinimum",
    "minProperties",
];

/// Keywords whose arrays accumulate rather than intersect
const UNION_KEYWORDS: &[&str] = &["required"];

/// Merge any number of schemas into one composite
pub fn merge_schema_all_of<'a, I>(schemas: I) -> SchemaResult<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut merged = Map::new();
    for schema in schemas {
        let map = schema
            .as_object()
            .ok_or_else(|| SchemaError::NotAnObject(kind_of(schema).to_string()))?;
        merged = merge_maps(&merged, map)?;
    }
    Ok(Value::Object(merged))
}

/// Merge two schema objects
pub fn merge_maps(
    left: &Map<String, Value>,
    right: &Map<String, Value>,
) -> SchemaResult<Map<String, Value>> {
    let mut out = Map::new();
    for key in left.keys().chain(right.keys().filter(|k| !left.contains_key(*k))) {
        let merged = merge_value(key, left.get(key), right.get(key))?;
        out.insert(key.clone(), merged);
    }
    Ok(out)
}

fn merge_value(key: &str, left: Option<&Value>, right: Option<&Value>) -> SchemaResult<Value> {
    let (l, r) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        (Some(v), None) | (None, Some(v)) => return Ok(v.clone()),
        (None, None) => return Ok(Value::Null),
    };

    match (l, r) {
        (Value::Object(a), Value::Object(b)) => Ok(Value::Object(merge_maps(a, b)?)),

        (Value::Object(_), other) | (other, Value::Object(_)) => {
            let object_side = if l.is_object() { l } else { r };
            if key == "additionalProperties" {
                if *other == Value::Bool(true) {
                    Ok(object_side.clone())
                } else {
                    Ok(Value::Bool(false))
                }
            } else {
                Ok(object_side.clone())
            }
        }

        (Value::Array(a), Value::Array(b)) => merge_arrays(key, a, b),

        (Value::Array(items), scalar) | (scalar, Value::Array(items)) => {
            if items.contains(scalar) {
                Ok(scalar.clone())
            } else {
                Err(SchemaError::ValueNotAllowed {
                    key: key.to_string(),
                    value: scalar.to_string(),
                })
            }
        }

        (Value::Number(a), Value::Number(b)) => Ok(merge_numbers(key, a, b)),

        _ => {
            if l != r {
                log::warn!(
                    "allOf: conflicting values for '{}' ({} vs {}), keeping {}",
                    key,
                    l,
                    r,
                    l
                );
            }
            Ok(l.clone())
        }
    }
}

fn merge_arrays(key: &str, a: &[Value], b: &[Value]) -> SchemaResult<Value> {
    if a.iter().chain(b).any(Value::is_object) {
        return Err(SchemaError::UnsupportedArrayItems { key: key.to_string() });
    }

    if UNION_KEYWORDS.contains(&key) {
        let mut union = a.to_vec();
        union.extend(b.iter().filter(|v| !a.contains(v)).cloned());
        return Ok(Value::Array(union));
    }

    let common: Vec<Value> = a.iter().filter(|v| b.contains(v)).cloned().collect();
    if common.is_empty() {
        return Err(SchemaError::Unsatisfiable { key: key.to_string() });
    }
    Ok(Value::Array(common))
}

fn merge_numbers(key: &str, a: &Number, b: &Number) -> Value {
    let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));

    if MAX_KEYWORDS.contains(&key) {
        return Value::Number(if y < x { b.clone() } else { a.clone() });
    }
    if MIN_KEYWORDS.contains(&key) {
        return Value::Number(if y > x { b.clone() } else { a.clone() });
    }
    if key == "multipleOf" {
        return lcm_number(a, b);
    }

    if x != y {
        log::warn!("allOf: conflicting values for '{}' ({} vs {}), keeping {}", key, a, b, a);
    }
    Value::Number(a.clone())
}

fn lcm_number(a: &Number, b: &Number) -> Value {
    let (x, y) = (a.as_f64().unwrap_or(1.0), b.as_f64().unwrap_or(1.0));

    if let (Some(ix), Some(iy)) = (a.as_u64(), b.as_u64()) {
        return match lcm(ix, iy) {
            Some(m) => Value::from(m),
            None => product(a, x, y),
        };
    }

    // Scale decimals up to integers, take the LCM, scale back down
    let scale = 10f64.powi(decimals(x).max(decimals(y)) as i32);
    let (sx, sy) = (x * scale, y * scale);
    let in_range = |v: f64| v.is_finite() && v >= 1.0 && v < u64::MAX as f64;
    if !(in_range(sx) && in_range(sy)) {
        return product(a, x, y);
    }
    match lcm(sx.round() as u64, sy.round() as u64) {
        Some(m) => Number::from_f64(m as f64 / scale)
            .map(Value::Number)
            .unwrap_or(Value::Number(a.clone())),
        None => product(a, x, y),
    }
}

/// A common multiple when the least one is out of integer range
fn product(a: &Number, x: f64, y: f64) -> Value {
    log::warn!("allOf: multipleOf {} and {} overflow, using their product", x, y);
    Number::from_f64(x * y)
        .map(Value::Number)
        .unwrap_or(Value::Number(a.clone()))
}

fn decimals(value: f64) -> usize {
    let text = value.to_string();
    text.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
