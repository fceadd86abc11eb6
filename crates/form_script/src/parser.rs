//! Parser for form expressions
//!
//! Converts a stream of tokens into a single expression tree.

use thiserror::Error;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

/// Parse errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Unexpected input after expression: {0}")]
    TrailingInput(String),

    #[error("Too many arguments (max 255)")]
    TooManyArguments,
}

/// Parser for form expressions
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Create a new parser
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parse the whole input as one expression
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.expression()?;
        if !self.is_at_end() {
            return Err(ParseError::TrailingInput(format!(
                "{:?}",
                self.peek().map(|t| &t.kind)
            )));
        }
        Ok(expr)
    }

    /// Parse one expression, leaving any following tokens
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.expression()
    }

    // === Expression parsing (Pratt parser) ===

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_precedence(1)?;

        if self.match_token(&[TokenKind::Question]) {
            let then_expr = self.expression()?;
            self.consume(&TokenKind::Colon, "':' in conditional expression")?;
            let else_expr = self.expression()?;
            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            });
        }

        Ok(condition)
    }

    fn parse_precedence(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;

        while let Some(op) = self.peek_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }

            self.advance();
            let right = self.parse_precedence(precedence + 1)?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&[TokenKind::Bang]) {
            let expr = self.unary()?;
            Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            })
        } else if self.match_token(&[TokenKind::Minus]) {
            let expr = self.unary()?;
            Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            })
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&[TokenKind::LParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&[TokenKind::Dot]) {
                let member = self.consume_ident("property name after '.'")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    member,
                };
            } else if self.match_token(&[TokenKind::LBracket]) {
                let index = self.expression()?;
                self.consume(&TokenKind::RBracket, "']' after index")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut args = Vec::new();

        if !self.check(&TokenKind::RParen) {
            loop {
                if args.len() >= 255 {
                    return Err(ParseError::TooManyArguments);
                }
                args.push(self.expression()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        self.consume(&TokenKind::RParen, "')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::UnexpectedEof);
        };

        match token.kind {
            TokenKind::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::String(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::Bool(b) => Ok(Expr::Literal(Value::Bool(b))),
            TokenKind::Null => Ok(Expr::Literal(Value::Null)),
            TokenKind::Ident(name) => Ok(Expr::Ident(name)),
            TokenKind::LParen => {
                let expr = self.expression()?;
                self.consume(&TokenKind::RParen, "')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.array_literal(),
            TokenKind::LBrace => self.object_literal(),
            other => Err(ParseError::UnexpectedToken(format!(
                "{:?} at {}:{}",
                other, token.line, token.column
            ))),
        }
    }

    fn array_literal(&mut self) -> Result<Expr, ParseError> {
        let mut elements = Vec::new();

        if !self.check(&TokenKind::RBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
                // Allow trailing comma
                if self.check(&TokenKind::RBracket) {
                    break;
                }
            }
        }

        self.consume(&TokenKind::RBracket, "']' after array elements")?;
        Ok(Expr::Array(elements))
    }

    fn object_literal(&mut self) -> Result<Expr, ParseError> {
        let mut pairs = Vec::new();

        if !self.check(&TokenKind::RBrace) {
            loop {
                let key = self.object_key()?;
                self.consume(&TokenKind::Colon, "':' after property name")?;
                let value = self.expression()?;
                pairs.push((key, value));

                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
                // Allow trailing comma
                if self.check(&TokenKind::RBrace) {
                    break;
                }
            }
        }

        self.consume(&TokenKind::RBrace, "'}' after object")?;
        Ok(Expr::Object(pairs))
    }

    fn object_key(&mut self) -> Result<String, ParseError> {
        if let Some(token) = self.advance_if(|k| matches!(k, TokenKind::String(_))) {
            if let TokenKind::String(key) = token.kind {
                return Ok(key);
            }
        }
        self.consume_ident("property name")
    }

    // === Helper methods ===

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        let token = self.peek()?;
        match &token.kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::BangEq => Some(BinaryOp::Ne),
            TokenKind::EqEqEq => Some(BinaryOp::StrictEq),
            TokenKind::BangEqEq => Some(BinaryOp::StrictNe),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::Ge),
            TokenKind::And => Some(BinaryOp::And),
            TokenKind::Or => Some(BinaryOp::Or),
            _ => None,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn is_at_end(&self) -> bool {
        self.peek()
            .map(|t| matches!(t.kind, TokenKind::Eof))
            .unwrap_or(true)
    }

    fn advance(&mut self) -> Option<Token> {
        if !self.is_at_end() {
            self.current += 1;
            self.tokens.get(self.current - 1).cloned()
        } else {
            None
        }
    }

    fn advance_if<F>(&mut self, predicate: F) -> Option<Token>
    where
        F: FnOnce(&TokenKind) -> bool,
    {
        if let Some(token) = self.peek() {
            if predicate(&token.kind) {
                return self.advance();
            }
        }
        None
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek()
            .map(|t| std::mem::discriminant(&t.kind) == std::mem::discriminant(kind))
            .unwrap_or(false)
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            self.advance().ok_or(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::Expected {
                expected: expected.to_string(),
                found: format!("{:?}", self.peek().map(|t| &t.kind)),
            })
        }
    }

    fn consume_ident(&mut self, expected: &str) -> Result<String, ParseError> {
        if let Some(token) = self.peek() {
            if let TokenKind::Ident(name) = &token.kind {
                let name = name.clone();
                self.advance();
                return Ok(name);
            }
        }
        Err(ParseError::Expected {
            expected: expected.to_string(),
            found: format!("{:?}", self.peek().map(|t| &t.kind)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Result<Expr, ParseError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_parse_literal() {
        assert!(matches!(parse("42").unwrap(), Expr::Literal(Value::Int(42))));
    }

    #[test]
    fn test_parse_binary() {
        // Add(1, Mul(2, 3))
        if let Expr::Binary { op, right, .. } = parse("1 + 2 * 3").unwrap() {
            assert_eq!(op, BinaryOp::Add);
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
        } else {
            panic!("Expected binary expression");
        }
    }

    #[test]
    fn test_parse_ternary_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        if let Expr::Ternary { else_expr, .. } = expr {
            assert!(matches!(*else_expr, Expr::Ternary { .. }));
        } else {
            panic!("Expected ternary");
        }
    }

    #[test]
    fn test_parse_ternary_binds_loosest() {
        let expr = parse("a || b ? 1 : 2").unwrap();
        if let Expr::Ternary { condition, .. } = expr {
            assert!(matches!(*condition, Expr::Binary { op: BinaryOp::Or, .. }));
        } else {
            panic!("Expected ternary");
        }
    }

    #[test]
    fn test_parse_object_keys() {
        if let Expr::Object(pairs) = parse(r#"{ x: 1, "y-z": 2, }"#).unwrap() {
            let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, vec!["x", "y-z"]);
        } else {
            panic!("Expected object");
        }
    }

    #[test]
    fn test_parse_member_chain() {
        let expr = parse("$self.schema.items[0].title").unwrap();
        if let Expr::Member { object, member } = expr {
            assert_eq!(member, "title");
            assert!(matches!(*object, Expr::Index { .. }));
        } else {
            panic!("Expected member access");
        }
    }

    #[test]
    fn test_parse_call() {
        if let Expr::Call { callee, args } = parse("$setState('visible', !x)").unwrap() {
            assert_eq!(callee.as_ident(), Some("$setState"));
            assert_eq!(args.len(), 2);
        } else {
            panic!("Expected call");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("1 2"), Err(ParseError::TrailingInput(_))));
        assert!(matches!(parse("(1 + 2"), Err(ParseError::Expected { .. })));
        assert!(matches!(parse(""), Err(ParseError::UnexpectedEof)));
        assert!(matches!(parse("a ? 1"), Err(ParseError::Expected { .. })));
    }
}
