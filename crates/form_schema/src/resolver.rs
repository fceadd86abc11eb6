//! Schema node resolution
//!
//! A `SchemaResolver` owns the root schema of one form. Resolution is
//! shallow: only the node handed in is rewritten, descendants are resolved
//! when they are rendered.

use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaResult};
use crate::merge::merge_schema_all_of;

/// Resolves `$ref` and `allOf` against a root schema
#[derive(Debug, Clone, Default)]
pub struct SchemaResolver {
    root: Value,
}

impl SchemaResolver {
    /// Create a resolver for `root`
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// The root schema
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resolve the root schema itself
    pub fn resolve_root(&self) -> SchemaResult<Value> {
        self.resolve_schema(&self.root)
    }

    /// Resolve one node: follow `$ref`, then fold `allOf` into the node
    pub fn resolve_schema(&self, schema: &Value) -> SchemaResult<Value> {
        let mut seen = Vec::new();
        self.resolve_with(schema, &mut seen)
    }

    fn resolve_with(&self, schema: &Value, seen: &mut Vec<String>) -> SchemaResult<Value> {
        let Some(node) = schema.as_object() else {
            return Ok(schema.clone());
        };

        if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
            if seen.iter().any(|r| r == reference) {
                return Err(SchemaError::CircularRef(reference.to_string()));
            }
            let target = self.lookup_ref(reference)?;

            // Sibling keywords refine the referenced schema
            let mut combined = target.as_object().cloned().unwrap_or_default();
            for (key, value) in node.iter().filter(|(k, _)| k.as_str() != "$ref") {
                combined.insert(key.clone(), value.clone());
            }

            seen.push(reference.to_string());
            let resolved = self.resolve_with(&Value::Object(combined), seen);
            seen.pop();
            return resolved;
        }

        if let Some(all_of) = node.get("allOf").and_then(Value::as_array) {
            let base: Map<String, Value> = node
                .iter()
                .filter(|(k, _)| k.as_str() != "allOf")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            let mut parts = vec![Value::Object(base)];
            for part in all_of {
                parts.push(self.resolve_with(part, seen)?);
            }
            return merge_schema_all_of(parts.iter());
        }

        Ok(schema.clone())
    }

    /// Find the target of a local `#/...` reference
    pub fn lookup_ref(&self, reference: &str) -> SchemaResult<&Value> {
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| SchemaError::UnsupportedRef(reference.to_string()))?;
        if pointer.is_empty() {
            return Ok(&self.root);
        }
        self.root
            .pointer(pointer)
            .ok_or_else(|| SchemaError::RefNotFound(reference.to_string()))
    }
}

/// Resolve a standalone node with no enclosing root
pub fn resolve_schema(schema: &Value) -> SchemaResult<Value> {
    SchemaResolver::new(schema.clone()).resolve_schema(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_of_folds_into_node() {
        let schema = json!({
            "title": "Port",
            "allOf": [{"type": "integer", "maximum": 100}, {"maximum": 80, "minimum": 1}]
        });
        let resolved = resolve_schema(&schema).unwrap();
        assert_eq!(
            resolved,
            json!({"title": "Port", "type": "integer", "maximum": 80, "minimum": 1})
        );
    }

    #[test]
    fn test_local_ref() {
        let root = json!({
            "definitions": {"name": {"type": "string", "maxLength": 8}},
            "properties": {"first": {"$ref": "#/definitions/name", "title": "First"}}
        });
        let resolver = SchemaResolver::new(root.clone());
        let resolved = resolver.resolve_schema(&root["properties"]["first"]).unwrap();
        assert_eq!(resolved, json!({"type": "string", "maxLength": 8, "title": "First"}));
    }

    #[test]
    fn test_ref_inside_all_of() {
        let root = json!({
            "$defs": {"base": {"type": "string", "minLength": 2}},
            "properties": {"code": {"allOf": [{"$ref": "#/$defs/base"}, {"minLength": 4}]}}
        });
        let resolver = SchemaResolver::new(root.clone());
        let resolved = resolver.resolve_schema(&root["properties"]["code"]).unwrap();
        assert_eq!(resolved, json!({"type": "string", "minLength": 4}));
    }

    #[test]
    fn test_ref_errors() {
        let root = json!({"definitions": {"loop": {"$ref": "#/definitions/loop"}}});
        let resolver = SchemaResolver::new(root);

        assert!(matches!(
            resolver.resolve_schema(&json!({"$ref": "http://example.com/s.json"})),
            Err(SchemaError::UnsupportedRef(_))
        ));
        assert!(matches!(
            resolver.resolve_schema(&json!({"$ref": "#/definitions/missing"})),
            Err(SchemaError::RefNotFound(_))
        ));
        assert!(matches!(
            resolver.resolve_schema(&json!({"$ref": "#/definitions/loop"})),
            Err(SchemaError::CircularRef(_))
        ));
    }
}
