//! Dotted-path addressing into the root data object
//!
//! A path such as `"a.b.2.c"` names a location inside a nested JSON value.
//! The empty string is the root. Numeric segments index arrays, everything
//! else is an object key.

use serde_json::{Map, Value};

use crate::error::PathError;

/// Separator between path segments
pub const SEPARATOR: char = '.';

/// Path of the root data object
pub const ROOT: &str = "";

/// Join a parent path and a child property
pub fn cur_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}{SEPARATOR}{child}")
    }
}

/// Split a path into its segments (root has none)
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split(SEPARATOR).collect()
    }
}

/// Reject paths with empty segments
pub fn check(path: &str) -> Result<(), PathError> {
    if segments(path).iter().any(|s| s.is_empty()) {
        return Err(PathError::EmptySegment(path.to_string()));
    }
    Ok(())
}

/// Parent of `path`, the root being its own parent
pub fn parent_path(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(pos) => &path[..pos],
        None => ROOT,
    }
}

/// Last segment of `path`
pub fn path_last_prop(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Remainder of `path` below `prefix`, if `prefix` is `path` or one of its ancestors
pub fn sub_path<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(SEPARATOR)
    }
}

/// Whether `ancestor` is a strict ancestor of `path`
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    ancestor != path && sub_path(path, ancestor).is_some()
}

/// Read the value at `path`.
///
/// `left_deviation` trims that many trailing segments first, so `1` returns
/// the value of the parent container.
pub fn path_value<'a>(obj: &'a Value, path: &str, left_deviation: usize) -> Option<&'a Value> {
    let segs = segments(path);
    let keep = segs.len().saturating_sub(left_deviation);
    segs[..keep].iter().try_fold(obj, |current, seg| step(current, seg))
}

fn step<'a>(current: &'a Value, seg: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Return a copy of `obj` with `value` stored at `path`.
///
/// Missing intermediate containers are created as objects. The input is
/// never mutated.
pub fn set_path_value(obj: &Value, path: &str, value: Value) -> Value {
    let mut copy = obj.clone();
    set_in_place(&mut copy, &segments(path), value);
    copy
}

fn set_in_place(target: &mut Value, segs: &[&str], value: Value) {
    let Some((head, rest)) = segs.split_first() else {
        *target = value;
        return;
    };

    if let Value::Array(items) = target {
        if let Ok(index) = head.parse::<usize>() {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            set_in_place(&mut items[index], rest, value);
            return;
        }
    }

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        let slot = map.entry(head.to_string()).or_insert(Value::Null);
        set_in_place(slot, rest, value);
    }
}
