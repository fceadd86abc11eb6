//! `{{ expr }}` templates embedded in schema configuration
//!
//! A template is a JSON string whose trimmed text is wrapped in double braces.
//! Anything else in a configuration value is data and passes through as is.

use std::collections::HashSet;

use crate::convert::{json_to_script_value, script_to_json_value};
use crate::interpreter::{Interpreter, RuntimeError};
use crate::value::Value;
use crate::{compile, ScriptResult};

/// Check whether a string is a `{{ expr }}` template
pub fn is_template(source: &str) -> bool {
    let trimmed = source.trim();
    trimmed.len() >= 4 && trimmed.starts_with("{{") && trimmed.ends_with("}}")
}

/// Expression text inside the braces, or `None` for plain strings
pub fn template_body(source: &str) -> Option<&str> {
    if !is_template(source) {
        return None;
    }
    let trimmed = source.trim();
    Some(trimmed[2..trimmed.len() - 2].trim())
}

/// Evaluates templates against a fixed set of context variables
pub struct Evaluator {
    interpreter: Interpreter,
    auto_invoke: HashSet<String>,
}

impl Evaluator {
    /// Evaluator with only the builtins defined
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    /// Evaluator over an existing interpreter
    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            auto_invoke: HashSet::new(),
        }
    }

    /// Define a context variable
    pub fn define(&mut self, name: &str, value: Value) {
        self.interpreter.set_var(name, value);
    }

    /// Define a context variable from JSON data
    pub fn define_json(&mut self, name: &str, value: &serde_json::Value) {
        self.define(name, json_to_script_value(value));
    }

    /// Install a native function for this evaluator only
    pub fn register_native<F>(&mut self, name: &str, arity: i32, func: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.interpreter.register_local_native(name, arity, func);
    }

    /// Call `name` with no arguments when it is the entire expression
    pub fn add_auto_invoke(&mut self, name: impl Into<String>) {
        self.auto_invoke.insert(name.into());
    }

    /// Evaluate raw expression text (no braces)
    pub fn eval_source(&mut self, source: &str) -> ScriptResult<Value> {
        let source = source.trim();
        if self.auto_invoke.contains(source) {
            return self.invoke(source);
        }
        let expr = compile(source)?;
        Ok(self.interpreter.eval_expr(&expr)?)
    }

    /// Evaluate a configuration value.
    ///
    /// Template strings are evaluated, arrays and objects are evaluated
    /// element by element, everything else is returned unchanged.
    pub fn execute_expression(
        &mut self,
        value: &serde_json::Value,
    ) -> ScriptResult<serde_json::Value> {
        match value {
            serde_json::Value::String(s) => match template_body(s) {
                Some(body) => Ok(script_to_json_value(&self.eval_source(body)?)),
                None => Ok(value.clone()),
            },
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| self.execute_expression(item))
                .collect::<ScriptResult<Vec<_>>>()
                .map(serde_json::Value::Array),
            serde_json::Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.execute_expression(item)?);
                }
                Ok(serde_json::Value::Object(out))
            }
            _ => Ok(value.clone()),
        }
    }

    /// Evaluate a condition; the braces are optional
    pub fn eval_condition(&mut self, source: &str) -> ScriptResult<bool> {
        let body = template_body(source).unwrap_or(source);
        Ok(self.eval_source(body)?.is_truthy())
    }

    /// Get the interpreter
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    fn invoke(&mut self, name: &str) -> ScriptResult<Value> {
        match self.interpreter.get_var(name) {
            Some(Value::Native(native)) => native
                .call(Vec::new())
                .map_err(|e| RuntimeError::NativeError(format!("{}: {}", name, e)).into()),
            Some(other) => Ok(other),
            None => Err(RuntimeError::UndefinedVariable(name.to_string()).into()),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
