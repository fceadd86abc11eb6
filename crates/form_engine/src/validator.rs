//! Schema validation of single field values

use std::collections::HashMap;
use std::sync::Arc;

use jsonschema::{Draft, Validator};
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// Checks a value against a schema fragment
pub trait SchemaValidator: Send + Sync {
    /// `Ok` when valid, otherwise one message per violation.
    ///
    /// A fragment that cannot be compiled is reported as `Ok` after logging;
    /// a broken schema must not block the user.
    fn validate(&self, schema: &Value, value: &Value) -> Result<(), Vec<String>>;
}

/// Draft 7 validator with a cache of compiled fragments
#[derive(Default)]
pub struct JsonSchemaValidator {
    cache: Mutex<HashMap<String, Arc<Validator>>>,
}

impl JsonSchemaValidator {
    /// Create a validator with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiled fragments held
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    fn compiled(&self, schema: &Value) -> Option<Arc<Validator>> {
        let schema = strip_ui_keywords(schema);
        let key = schema.to_string();
        if let Some(validator) = self.cache.lock().get(&key) {
            return Some(Arc::clone(validator));
        }

        match jsonschema::options().with_draft(Draft::Draft7).build(&schema) {
            Ok(validator) => {
                let validator = Arc::new(validator);
                self.cache.lock().insert(key, Arc::clone(&validator));
                Some(validator)
            }
            Err(err) => {
                log::error!("Invalid schema fragment, skipping validation: {}", err);
                None
            }
        }
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, value: &Value) -> Result<(), Vec<String>> {
        let Some(validator) = self.compiled(schema) else {
            return Ok(());
        };
        let errors: Vec<String> = validator.iter_errors(value).map(|err| err.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Copy of `schema` without `ui:*` keys, at any depth
pub fn strip_ui_keywords(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !k.starts_with("ui:"))
                .map(|(k, v)| (k.clone(), strip_ui_keywords(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_ui_keywords).collect()),
        other => other.clone(),
    }
}
