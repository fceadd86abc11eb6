//! Variable lookup for form expressions
//!
//! Globals hold the builtins and are shared between evaluations. Each
//! evaluation pushes a scope for the context variables of that call. Nothing
//! else is visible to an expression.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::value::Value;

/// Variable scope
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, Value>,
}

impl Scope {
    /// Create a new empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a variable in this scope
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get a variable from this scope
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Check if variable exists in this scope
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Get all variable names
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.variables.keys()
    }
}

/// Scope stack on top of a shared global scope
#[derive(Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
    globals: Arc<RwLock<Scope>>,
}

impl Environment {
    /// Create a new environment with an empty global scope
    pub fn new() -> Self {
        Self::with_globals(Arc::new(RwLock::new(Scope::new())))
    }

    /// Create an environment over an existing global scope
    pub fn with_globals(globals: Arc<RwLock<Scope>>) -> Self {
        Self {
            scopes: vec![Scope::new()],
            globals,
        }
    }

    /// Push a new scope
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the innermost scope; the outermost local scope is kept
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Get current scope depth
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Define a variable in the current scope
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.define(name, value);
        }
    }

    /// Define a global variable
    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.globals.write().define(name, value);
    }

    /// Look a variable up, innermost scope first, globals last
    pub fn get(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        self.globals.read().get(name).cloned()
    }

    /// Check if a variable exists
    pub fn contains(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.contains(name)) || self.globals.read().contains(name)
    }

    /// Get the global scope
    pub fn globals(&self) -> &Arc<RwLock<Scope>> {
        &self.globals
    }

    /// Fresh environment sharing these globals
    pub fn child(&self) -> Self {
        Self::with_globals(Arc::clone(&self.globals))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
