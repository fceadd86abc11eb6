//! # form_script
//!
//! A small expression language for `{{ expr }}` templates in form schemas:
//! - Literals, arrays and objects
//! - Member and index access (missing keys read as `null`)
//! - Arithmetic, comparison, loose and strict equality
//! - Short-circuit `&&` / `||` and the ternary operator
//! - Pure builtins plus whatever native functions the host installs
//!
//! Expressions cannot assign, loop, define functions or reach anything the
//! host did not put in scope.
//!
//! ## Syntax Overview
//!
//! ```text
//! $self.value > 3 && $rootData.mode === 'advanced'
//! includes($dep[0].value, 'beta') ? 'shown' : 'hidden'
//! { disabled: isEmpty($rootData.name) }
//! ```
//!
//! ## Example
//!
//! ```
//! use form_script::{Evaluator, Value};
//! use serde_json::json;
//!
//! let mut ev = Evaluator::new();
//! ev.define_json("$self", &json!({ "value": 4 }));
//! let out = ev.execute_expression(&json!("{{ $self.value * 2 }}")).unwrap();
//! assert_eq!(out, json!(8));
//! assert_eq!(ev.eval_source("len('abc')").unwrap(), Value::Int(3));
//! ```

pub mod ast;
pub mod builtins;
pub mod convert;
pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod template;
pub mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use convert::{json_to_script_value, script_to_json_value};
pub use environment::{Environment, Scope};
pub use interpreter::{Interpreter, RuntimeError};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser};
pub use template::{is_template, template_body, Evaluator};
pub use value::{NativeFunction, Value};

use thiserror::Error;

/// Expression errors
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Lexer error: {0}")]
    LexerError(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Runtime error: {0}")]
    RuntimeError(#[from] RuntimeError),
}

/// Expression result
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Parse expression text into a tree
pub fn compile(source: &str) -> ScriptResult<Expr> {
    let tokens = Lexer::new(source).tokenize()?;
    let expr = Parser::new(tokens).parse().map_err(|e| {
        log::debug!("Failed to parse expression '{}': {}", source, e);
        e
    })?;
    Ok(expr)
}

/// Evaluate expression text with only the builtins in scope
pub fn eval(source: &str) -> ScriptResult<Value> {
    eval_with(source, &mut Interpreter::new())
}

/// Evaluate expression text with the given interpreter
pub fn eval_with(source: &str, interpreter: &mut Interpreter) -> ScriptResult<Value> {
    let expr = compile(source)?;
    Ok(interpreter.eval_expr(&expr)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::Int(7));
    }

    #[test]
    fn test_strings() {
        let result = eval(r#""hello" + ' world'"#).unwrap();
        assert_eq!(result, Value::String("hello world".to_string()));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("5 > 3").unwrap(), Value::Bool(true));
        assert_eq!(eval("5 < 3").unwrap(), Value::Bool(false));
        assert_eq!(eval("5 == 5").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(eval("a = 1"), Err(ScriptError::LexerError(_))));
        assert!(matches!(eval("1 +"), Err(ScriptError::ParseError(_))));
        assert!(matches!(eval("nope"), Err(ScriptError::RuntimeError(_))));
    }

    #[test]
    fn test_native_function() {
        let mut interpreter = Interpreter::new();
        interpreter.register_native("double", |args| match args.first() {
            Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
            _ => Err("Expected integer".to_string()),
        });
        assert_eq!(eval_with("double(21)", &mut interpreter).unwrap(), Value::Int(42));
    }
}
