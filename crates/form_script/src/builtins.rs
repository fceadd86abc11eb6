//! Built-in functions for form expressions
//!
//! All builtins are pure:
//! - Collections: len, includes, isEmpty
//! - Strings: startsWith, endsWith, lower, upper, trim
//! - Math: abs, min, max
//! - Conversion: str, num

use crate::interpreter::Interpreter;
use crate::value::Value;

/// Register all built-in functions with the interpreter
pub fn register_builtins(interpreter: &mut Interpreter) {
    // Collections
    register_len(interpreter);
    register_includes(interpreter);
    register_is_empty(interpreter);

    // Strings
    register_starts_with(interpreter);
    register_ends_with(interpreter);
    register_lower(interpreter);
    register_upper(interpreter);
    register_trim(interpreter);

    // Math
    register_abs(interpreter);
    register_min(interpreter);
    register_max(interpreter);

    // Conversion
    register_str(interpreter);
    register_num(interpreter);
}

/// len(value) - Length of a string, array or object
fn register_len(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("len", 1, |args| match &args[0] {
        Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Array(a) => Ok(Value::Int(a.len() as i64)),
        Value::Object(o) => Ok(Value::Int(o.len() as i64)),
        Value::Null => Ok(Value::Int(0)),
        other => Err(format!("len() cannot measure {}", other.type_name())),
    });
}

/// includes(haystack, needle) - Array membership or substring check
fn register_includes(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("includes", 2, |args| match (&args[0], &args[1]) {
        (Value::Array(items), needle) => Ok(Value::Bool(items.contains(needle))),
        (Value::String(s), Value::String(sub)) => Ok(Value::Bool(s.contains(sub.as_str()))),
        (Value::Null, _) => Ok(Value::Bool(false)),
        _ => Err("includes() expects an array or a string".to_string()),
    });
}

/// isEmpty(value) - True for null, "", [] and {}
fn register_is_empty(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("isEmpty", 1, |args| {
        Ok(Value::Bool(match &args[0] {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }))
    });
}

/// startsWith(string, prefix)
fn register_starts_with(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("startsWith", 2, |args| match (&args[0], &args[1]) {
        (Value::String(s), Value::String(p)) => Ok(Value::Bool(s.starts_with(p.as_str()))),
        _ => Err("startsWith() expects two strings".to_string()),
    });
}

/// endsWith(string, suffix)
fn register_ends_with(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("endsWith", 2, |args| match (&args[0], &args[1]) {
        (Value::String(s), Value::String(p)) => Ok(Value::Bool(s.ends_with(p.as_str()))),
        _ => Err("endsWith() expects two strings".to_string()),
    });
}

/// lower(string) - Convert string to lowercase
fn register_lower(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("lower", 1, |args| match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        _ => Err("lower() expects a string".to_string()),
    });
}

/// upper(string) - Convert string to uppercase
fn register_upper(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("upper", 1, |args| match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        _ => Err("upper() expects a string".to_string()),
    });
}

/// trim(string) - Remove whitespace from both ends
fn register_trim(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("trim", 1, |args| match &args[0] {
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        _ => Err("trim() expects a string".to_string()),
    });
}

fn register_abs(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("abs", 1, |args| match &args[0] {
        Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        _ => Err("abs() expects a number".to_string()),
    });
}

/// min(a, b, ...) - Smallest of the numeric arguments
fn register_min(interpreter: &mut Interpreter) {
    interpreter.register_native("min", |args| extreme(args, "min", |a, b| a < b));
}

/// max(a, b, ...) - Largest of the numeric arguments
fn register_max(interpreter: &mut Interpreter) {
    interpreter.register_native("max", |args| extreme(args, "max", |a, b| a > b));
}

fn extreme(args: Vec<Value>, name: &str, better: fn(f64, f64) -> bool) -> Result<Value, String> {
    let mut best: Option<(f64, Value)> = None;
    for arg in args {
        let n = match &arg {
            Value::Int(_) | Value::Float(_) => arg.to_float().unwrap_or(0.0),
            other => return Err(format!("{}() expects numbers, got {}", name, other.type_name())),
        };
        match &best {
            Some((current, _)) if !better(n, *current) => {}
            _ => best = Some((n, arg)),
        }
    }
    best.map(|(_, v)| v)
        .ok_or_else(|| format!("{}() expects at least one argument", name))
}

/// str(value) - Text form of any value
fn register_str(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("str", 1, |args| {
        Ok(Value::String(args[0].to_string_value()))
    });
}

/// num(value) - Parse a number; null when it does not parse
fn register_num(interpreter: &mut Interpreter) {
    interpreter.register_native_with_arity("num", 1, |args| {
        Ok(match &args[0] {
            Value::Int(_) | Value::Float(_) => args[0].clone(),
            Value::Bool(b) => Value::Int(*b as i64),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Value::Int)
                    .or_else(|_| s.parse::<f64>().map(Value::Float))
                    .unwrap_or(Value::Null)
            }
            _ => Value::Null,
        })
    });
}

#[cfg(test)]
mod tests {
    use crate::eval;
    use crate::value::Value;

    #[test]
    fn test_collections() {
        assert_eq!(eval("len([1, 2, 3])").unwrap(), Value::Int(3));
        assert_eq!(eval("len(null)").unwrap(), Value::Int(0));
        assert_eq!(eval("includes(['a', 'b'], 'b')").unwrap(), Value::Bool(true));
        assert_eq!(eval("includes('cluster-1', 'ster')").unwrap(), Value::Bool(true));
        assert_eq!(eval("isEmpty({})").unwrap(), Value::Bool(true));
        assert_eq!(eval("isEmpty(0)").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_strings() {
        assert_eq!(eval("startsWith('node-1', 'node')").unwrap(), Value::Bool(true));
        assert_eq!(eval("endsWith('node-1', '-2')").unwrap(), Value::Bool(false));
        assert_eq!(eval("upper(trim('  ab '))").unwrap(), Value::from("AB"));
        assert!(eval("lower(1)").is_err());
    }

    #[test]
    fn test_math() {
        assert_eq!(eval("abs(-4)").unwrap(), Value::Int(4));
        assert_eq!(eval("min(3, 1.5, 2)").unwrap(), Value::Float(1.5));
        assert_eq!(eval("max(3, 1.5, 2)").unwrap(), Value::Int(3));
        assert!(eval("max()").is_err());
    }

    #[test]
    fn test_conversion() {
        assert_eq!(eval("str(12) + 'px'").unwrap(), Value::from("12px"));
        assert_eq!(eval("num('42')").unwrap(), Value::Int(42));
        assert_eq!(eval("num('2.5')").unwrap(), Value::Float(2.5));
        assert_eq!(eval("num('abc')").unwrap(), Value::Null);
    }
}
