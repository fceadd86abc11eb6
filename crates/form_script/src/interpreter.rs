//! Interpreter for form expressions
//!
//! Walks an expression tree against an `Environment`. Evaluation has no side
//! effects of its own; the only way out of the sandbox is a native function
//! the host chose to install.

use std::collections::HashMap;

use thiserror::Error;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::builtins;
use crate::environment::Environment;
use crate::value::{NativeFunction, Value};

/// Runtime errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Not callable: {0}")]
    NotCallable(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Native function error: {0}")]
    NativeError(String),
}

/// Expression interpreter
#[derive(Clone)]
pub struct Interpreter {
    environment: Environment,
}

impl Interpreter {
    /// Create a new interpreter with the builtins installed
    pub fn new() -> Self {
        let mut interpreter = Self::bare();
        builtins::register_builtins(&mut interpreter);
        interpreter
    }

    /// Create an interpreter with nothing defined
    pub fn bare() -> Self {
        Self {
            environment: Environment::new(),
        }
    }

    /// Interpreter sharing this one's globals with a fresh local scope
    pub fn child(&self) -> Self {
        Self {
            environment: self.environment.child(),
        }
    }

    /// Evaluate an expression
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        self.evaluate(expr)
    }

    /// Get a variable value
    pub fn get_var(&self, name: &str) -> Option<Value> {
        self.environment.get(name)
    }

    /// Define a variable in the local scope
    pub fn set_var(&mut self, name: &str, value: Value) {
        self.environment.define(name, value);
    }

    /// Register a variadic native function as a global
    pub fn register_native<F>(&mut self, name: &str, func: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register_native_with_arity(name, -1, func);
    }

    /// Register a native function with known arity as a global
    pub fn register_native_with_arity<F>(&mut self, name: &str, arity: i32, func: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        let native = NativeFunction::new(name, arity, func);
        self.environment.define_global(name, Value::Native(native));
    }

    /// Register a native function visible only to this interpreter
    pub fn register_local_native<F>(&mut self, name: &str, arity: i32, func: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        let native = NativeFunction::new(name, arity, func);
        self.environment.define(name, Value::Native(native));
    }

    /// Get the environment
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    // === Expression evaluation ===

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Ident(name) => self
                .environment
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),

            // Logical operators short-circuit and yield the deciding operand
            Expr::Binary {
                left,
                op: BinaryOp::And,
                right,
            } => {
                let lhs = self.evaluate(left)?;
                if lhs.is_truthy() {
                    self.evaluate(right)
                } else {
                    Ok(lhs)
                }
            }

            Expr::Binary {
                left,
                op: BinaryOp::Or,
                right,
            } => {
                let lhs = self.evaluate(left)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Binary { left, op, right } => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                self.eval_binary(lhs, *op, rhs)
            }

            Expr::Unary { op, expr } => {
                let value = self.evaluate(expr)?;
                self.eval_unary(*op, value)
            }

            Expr::Call { callee, args } => {
                let func = self.evaluate(callee)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate(arg)?);
                }
                self.call_function(func, arg_values)
            }

            Expr::Index { object, index } => {
                let obj = self.evaluate(object)?;
                let idx = self.evaluate(index)?;
                self.eval_index(obj, idx)
            }

            Expr::Member { object, member } => {
                let obj = self.evaluate(object)?;
                self.eval_member(obj, member)
            }

            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for elem in elements {
                    values.push(self.evaluate(elem)?);
                }
                Ok(Value::Array(values))
            }

            Expr::Object(pairs) => {
                let mut map = HashMap::new();
                for (key, value_expr) in pairs {
                    let value = self.evaluate(value_expr)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_expr)
                } else {
                    self.evaluate(else_expr)
                }
            }
        }
    }

    fn eval_binary(&self, lhs: Value, op: BinaryOp, rhs: Value) -> Result<Value, RuntimeError> {
        match op {
            BinaryOp::Add => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
                (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b.to_string_value()))),
                (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a.to_string_value(), b))),
                (Value::Array(a), Value::Array(b)) => {
                    let mut result = a.clone();
                    result.extend(b.iter().cloned());
                    Ok(Value::Array(result))
                }
                _ => self.float_op(&lhs, &rhs, "add", |a, b| a + b),
            },

            BinaryOp::Sub => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
                _ => self.float_op(&lhs, &rhs, "subtract", |a, b| a - b),
            },

            BinaryOp::Mul => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
                _ => self.float_op(&lhs, &rhs, "multiply", |a, b| a * b),
            },

            BinaryOp::Div => match (&lhs, &rhs) {
                (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
                (Value::Int(a), Value::Int(b)) if a.checked_rem(*b) == Some(0) => {
                    Ok(Value::Int(a.wrapping_div(*b)))
                }
                _ => {
                    if rhs.is_number() && rhs.to_float() == Some(0.0) {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    self.float_op(&lhs, &rhs, "divide", |a, b| a / b)
                }
            },

            BinaryOp::Mod => match (&lhs, &rhs) {
                (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
                _ => {
                    if rhs.is_number() && rhs.to_float() == Some(0.0) {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    self.float_op(&lhs, &rhs, "modulo", |a, b| a % b)
                }
            },

            BinaryOp::Eq => Ok(Value::Bool(lhs.loose_eq(&rhs))),
            BinaryOp::Ne => Ok(Value::Bool(!lhs.loose_eq(&rhs))),
            BinaryOp::StrictEq => Ok(Value::Bool(lhs.strict_eq(&rhs))),
            BinaryOp::StrictNe => Ok(Value::Bool(!lhs.strict_eq(&rhs))),

            BinaryOp::Lt => self.compare(&lhs, &rhs, |o| o.is_lt()),
            BinaryOp::Le => self.compare(&lhs, &rhs, |o| o.is_le()),
            BinaryOp::Gt => self.compare(&lhs, &rhs, |o| o.is_gt()),
            BinaryOp::Ge => self.compare(&lhs, &rhs, |o| o.is_ge()),

            // Handled with short-circuiting in `evaluate`
            BinaryOp::And | BinaryOp::Or => Err(RuntimeError::TypeError(format!(
                "'{}' evaluated eagerly",
                op.symbol()
            ))),
        }
    }

    fn float_op<F>(&self, lhs: &Value, rhs: &Value, verb: &str, f: F) -> Result<Value, RuntimeError>
    where
        F: Fn(f64, f64) -> f64,
    {
        match (lhs, rhs) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let (a, b) = (lhs.to_float().unwrap_or(0.0), rhs.to_float().unwrap_or(0.0));
                Ok(Value::Float(f(a, b)))
            }
            _ => Err(RuntimeError::TypeError(format!(
                "Cannot {} {} and {}",
                verb,
                lhs.type_name(),
                rhs.type_name()
            ))),
        }
    }

    fn compare<F>(&self, lhs: &Value, rhs: &Value, test: F) -> Result<Value, RuntimeError>
    where
        F: Fn(std::cmp::Ordering) -> bool,
    {
        let ordering = match (lhs, rhs) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            _ if lhs.is_number() && rhs.is_number() => lhs
                .to_float()
                .zip(rhs.to_float())
                .and_then(|(a, b)| a.partial_cmp(&b)),
            _ => {
                return Err(RuntimeError::TypeError(format!(
                    "Cannot compare {} and {}",
                    lhs.type_name(),
                    rhs.type_name()
                )))
            }
        };
        // NaN compares false both ways
        Ok(Value::Bool(ordering.map(test).unwrap_or(false)))
    }

    fn eval_unary(&self, op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
        match op {
            UnaryOp::Neg => match value {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Float(f) => Ok(Value::Float(-f)),
                _ => Err(RuntimeError::TypeError(format!(
                    "Cannot negate {}",
                    value.type_name()
                ))),
            },
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        }
    }

    /// Indexing out of range or by a missing key yields null
    fn eval_index(&self, object: Value, index: Value) -> Result<Value, RuntimeError> {
        match (object, index) {
            (Value::Array(arr), Value::Int(i)) => {
                let idx = if i < 0 { arr.len() as i64 + i } else { i };
                Ok(usize::try_from(idx)
                    .ok()
                    .and_then(|i| arr.get(i).cloned())
                    .unwrap_or(Value::Null))
            }
            (Value::String(s), Value::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                let idx = if i < 0 { chars.len() as i64 + i } else { i };
                Ok(usize::try_from(idx)
                    .ok()
                    .and_then(|i| chars.get(i))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null))
            }
            (Value::Object(obj), Value::String(key)) => {
                Ok(obj.get(&key).cloned().unwrap_or(Value::Null))
            }
            (Value::Object(obj), key @ Value::Int(_)) => {
                Ok(obj.get(&key.to_string_value()).cloned().unwrap_or(Value::Null))
            }
            (Value::Null, _) => Ok(Value::Null),
            (object, index) => Err(RuntimeError::TypeError(format!(
                "Cannot index {} with {}",
                object.type_name(),
                index.type_name()
            ))),
        }
    }

    /// Member access on null, or of a missing key, yields null
    fn eval_member(&self, object: Value, member: &str) -> Result<Value, RuntimeError> {
        match object {
            Value::Object(mut obj) => Ok(obj.remove(member).unwrap_or(Value::Null)),

            Value::Array(arr) => match member {
                "length" | "len" => Ok(Value::Int(arr.len() as i64)),
                _ => Ok(Value::Null),
            },

            Value::String(s) => match member {
                "length" | "len" => Ok(Value::Int(s.chars().count() as i64)),
                _ => Ok(Value::Null),
            },

            Value::Null => Ok(Value::Null),

            other => Err(RuntimeError::TypeError(format!(
                "Cannot read '{}' of {}",
                member,
                other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, func: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match func {
            Value::Native(native) => native
                .call(args)
                .map_err(|e| RuntimeError::NativeError(format!("{}: {}", native.name, e))),
            other => Err(RuntimeError::NotCallable(other.type_name().to_string())),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn eval_with(interpreter: &mut Interpreter, source: &str) -> Result<Value, RuntimeError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let expr = Parser::new(tokens).parse().unwrap();
        interpreter.eval_expr(&expr)
    }

    fn eval(source: &str) -> Result<Value, RuntimeError> {
        eval_with(&mut Interpreter::new(), source)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("2 + 3").unwrap(), Value::Int(5));
        assert_eq!(eval("10 - 4").unwrap(), Value::Int(6));
        assert_eq!(eval("3 * 4").unwrap(), Value::Int(12));
        assert_eq!(eval("15 / 3").unwrap(), Value::Int(5));
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("17 % 5").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Int(14));
        assert_eq!(eval("(2 + 3) * 4").unwrap(), Value::Int(20));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("5 > 3").unwrap(), Value::Bool(true));
        assert_eq!(eval("5 < 3.5").unwrap(), Value::Bool(false));
        assert_eq!(eval("'a' < 'b'").unwrap(), Value::Bool(true));
        assert!(matches!(eval("'a' < 1"), Err(RuntimeError::TypeError(_))));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval("'1' == 1").unwrap(), Value::Bool(true));
        assert_eq!(eval("'1' === 1").unwrap(), Value::Bool(false));
        assert_eq!(eval("null !== 0").unwrap(), Value::Bool(true));
        assert_eq!(eval("[1, 2] == [1, 2]").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_logical_short_circuit() {
        // The right side would fail if evaluated
        assert_eq!(eval("false && missing").unwrap(), Value::Bool(false));
        assert_eq!(eval("true || missing").unwrap(), Value::Bool(true));
        assert_eq!(eval("'' || 'fallback'").unwrap(), Value::from("fallback"));
        assert!(matches!(eval("true && missing"), Err(RuntimeError::UndefinedVariable(_))));
    }

    #[test]
    fn test_ternary() {
        assert_eq!(eval("1 > 2 ? 'a' : 'b'").unwrap(), Value::from("b"));
        assert_eq!(eval("true ? false ? 1 : 2 : 3").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_lenient_access() {
        assert_eq!(eval("{ x: 10 }.x").unwrap(), Value::Int(10));
        assert_eq!(eval("{ x: 10 }.y").unwrap(), Value::Null);
        assert_eq!(eval("null.y.z").unwrap(), Value::Null);
        assert_eq!(eval("[1, 2, 3][-1]").unwrap(), Value::Int(3));
        assert_eq!(eval("[1, 2, 3][9]").unwrap(), Value::Null);
        assert_eq!(eval("'héllo'.length").unwrap(), Value::Int(5));
        assert!(matches!(eval("true.x"), Err(RuntimeError::TypeError(_))));
    }

    #[test]
    fn test_native_function() {
        let mut interpreter = Interpreter::new();
        interpreter.register_native("triple", |args| match args.first() {
            Some(Value::Int(n)) => Ok(Value::Int(n * 3)),
            _ => Err("Expected integer".to_string()),
        });
        assert_eq!(eval_with(&mut interpreter, "triple(7)").unwrap(), Value::Int(21));
        assert!(matches!(
            eval_with(&mut interpreter, "triple('x')"),
            Err(RuntimeError::NativeError(_))
        ));
        assert!(matches!(eval_with(&mut interpreter, "3(1)"), Err(RuntimeError::NotCallable(_))));
    }

    #[test]
    fn test_child_sees_globals_not_locals() {
        let mut parent = Interpreter::new();
        parent.set_var("local", Value::Int(1));
        let mut child = parent.child();
        assert_eq!(eval_with(&mut child, "len('abc')").unwrap(), Value::Int(3));
        assert!(matches!(
            eval_with(&mut child, "local"),
            Err(RuntimeError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(eval("10 / 0"), Err(RuntimeError::DivisionByZero)));
        assert!(matches!(eval("1.5 % 0"), Err(RuntimeError::DivisionByZero)));
    }

    #[test]
    fn test_undefined_variable() {
        assert!(matches!(eval("undefined_var"), Err(RuntimeError::UndefinedVariable(_))));
    }
}
