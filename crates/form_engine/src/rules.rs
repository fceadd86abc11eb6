//! Custom validation rules
//!
//! A rule pairs a validator with the message shown when it fails. Validators
//! come in three shapes:
//! - `{{ expr }}` templates, truthy means valid
//! - any other string, a regular expression
//! - native closures registered by the host
//!
//! Patterns are matched unanchored against the text form of the value
//! (see [`pattern_text`]); write `^...$` to match the whole value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::RuleError;
use crate::instance::FieldInstance;

/// What a native validator gets to look at
pub struct RuleInput<'a> {
    pub field: &'a FieldInstance,
    pub value: &'a Value,
    pub root_data: &'a Value,
}

/// Native validator function
pub type NativeRuleFn = Arc<dyn Fn(&RuleInput<'_>) -> bool + Send + Sync>;

/// How a rule decides validity
#[derive(Clone)]
pub enum Validator {
    /// Expression text without the braces
    Expression(String),
    Pattern(Regex),
    Native(NativeRuleFn),
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(source) => f.debug_tuple("Expression").field(source).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// A validator and its failure message
#[derive(Debug, Clone)]
pub struct Rule {
    pub validator: Validator,
    pub message: String,
}

impl Rule {
    /// Parse `{validator, message}`. `name` is only used in errors.
    pub fn from_json(name: &str, value: &Value) -> Result<Self, RuleError> {
        let object = value
            .as_object()
            .ok_or_else(|| RuleError::NotAnObject(name.to_string()))?;
        let validator = match object.get("validator") {
            None | Some(Value::Null) => return Err(RuleError::MissingValidator(name.to_string())),
            Some(Value::String(source)) => parse_validator(name, source)?,
            Some(other) => {
                return Err(RuleError::InvalidValidator {
                    name: name.to_string(),
                    found: json_kind(other).to_string(),
                })
            }
        };
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self { validator, message })
    }

    /// Rule backed by a host closure
    pub fn native<F>(message: impl Into<String>, func: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            validator: Validator::Native(Arc::new(func)),
            message: message.into(),
        }
    }

    /// Rule backed by a regular expression
    pub fn pattern(
        name: &str,
        pattern: &str,
        message: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            validator: compile_pattern(name, pattern)?,
            message: message.into(),
        })
    }
}

fn parse_validator(name: &str, source: &str) -> Result<Validator, RuleError> {
    match form_script::template_body(source) {
        Some(body) => {
            form_script::compile(body).map_err(|e| RuleError::InvalidExpression {
                name: name.to_string(),
                message: e.to_string(),
            })?;
            Ok(Validator::Expression(body.to_string()))
        }
        None => compile_pattern(name, source),
    }
}

fn compile_pattern(name: &str, pattern: &str) -> Result<Validator, RuleError> {
    Regex::new(pattern)
        .map(Validator::Pattern)
        .map_err(|source| RuleError::InvalidPattern {
            name: name.to_string(),
            source,
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Text a pattern is matched against.
///
/// Strings as they are, `null` as the empty string, everything else as
/// compact JSON.
pub fn pattern_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Entry of a field's `ui:rules`
#[derive(Debug, Clone)]
pub enum RuleRef {
    /// Key into the global rule set
    Named(String),
    Inline(Rule),
}

/// Parse a field's `ui:rules` list
pub fn parse_rule_refs(path: &str, schema: &Value) -> Result<Vec<RuleRef>, RuleError> {
    let Some(list) = schema.get("ui:rules") else {
        return Ok(Vec::new());
    };
    let Some(list) = list.as_array() else {
        return Err(RuleError::NotAnObject(format!("{}/ui:rules", path)));
    };

    list.iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Value::String(name) => Ok(RuleRef::Named(name.clone())),
            other => {
                Rule::from_json(&format!("{}/ui:rules/{}", path, i), other).map(RuleRef::Inline)
            }
        })
        .collect()
}

/// Named rules shared by every field of a form
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, Rule>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from `{"name": {"validator": ..., "message": ...}}`.
    ///
    /// Every rule is checked before anything is returned; one bad rule fails
    /// the whole set.
    pub fn from_json(rules: &Value) -> Result<Self, RuleError> {
        let map = rules.as_object().ok_or(RuleError::NotARuleMap)?;
        let mut set = Self::new();
        for (name, rule) in map {
            set.insert(name.clone(), Rule::from_json(name, rule)?);
        }
        Ok(set)
    }

    /// Add or replace a rule
    pub fn insert(&mut self, name: impl Into<String>, rule: Rule) {
        self.rules.insert(name.into(), rule);
    }

    /// Get a rule by name
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `$rules` view for expressions: name to `{message}`
    pub fn to_context_value(&self) -> Value {
        let mut names: Vec<&String> = self.rules.keys().collect();
        names.sort();
        let mut out = Map::new();
        for name in names {
            let mut entry = Map::new();
            entry.insert("message".into(), Value::from(self.rules[name].message.as_str()));
            out.insert(name.clone(), Value::Object(entry));
        }
        Value::Object(out)
    }
}
