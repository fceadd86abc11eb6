//! Lexer for form expressions
//!
//! Converts expression source into a stream of tokens.

use crate::ScriptError;

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,

    // Identifiers
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    EqEqEq,
    BangEq,
    BangEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Bang,
    Question,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,

    // Special
    Eof,
}

/// A token with position information
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

/// Lexer for form expressions
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(mut self) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ScriptError> {
        self.skip_whitespace();

        let (line, column) = (self.line, self.column);

        let Some((pos, c)) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, line, column));
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,

            '=' => {
                if !self.match_char('=') {
                    return Err(ScriptError::LexerError(format!(
                        "Assignment is not allowed at {}:{}",
                        line, column
                    )));
                }
                if self.match_char('=') {
                    TokenKind::EqEqEq
                } else {
                    TokenKind::EqEq
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.match_char('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::And
                } else {
                    return Err(ScriptError::LexerError(format!(
                        "Unexpected character '&' at {}:{}",
                        line, column
                    )));
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::Or
                } else {
                    return Err(ScriptError::LexerError(format!(
                        "Unexpected character '|' at {}:{}",
                        line, column
                    )));
                }
            }

            quote @ ('"' | '\'') => self.string(quote)?,

            c if c.is_ascii_digit() => self.number(pos)?,

            c if c.is_alphabetic() || c == '_' || c == '$' => self.identifier(pos),

            _ => {
                return Err(ScriptError::LexerError(format!(
                    "Unexpected character '{}' at {}:{}",
                    c, line, column
                )));
            }
        };

        Ok(Token::new(kind, line, column))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((_, c)) = result {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.peek() {
            self.advance();
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(pos, _)| *pos).unwrap_or(self.source.len())
    }

    /// String literal delimited by `quote`
    fn string(&mut self, quote: char) -> Result<TokenKind, ScriptError> {
        let mut value = String::new();
        let (start_line, start_column) = (self.line, self.column);
        let unterminated = || {
            ScriptError::LexerError(format!(
                "Unterminated string starting at {}:{}",
                start_line, start_column
            ))
        };

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, c @ ('\\' | '"' | '\''))) => value.push(c),
                    Some((_, c)) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => return Err(unterminated()),
                },
                Some((_, c)) => value.push(c),
                None => return Err(unterminated()),
            }
        }

        Ok(TokenKind::String(value))
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ScriptError> {
        self.digits();

        // A dot followed by a digit continues the number, anything else is member access
        if self.peek() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().map(|(_, c)| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
                self.digits();

                let end = self.offset();
                let text = &self.source[start..end];
                let value: f64 = text
                    .parse()
                    .map_err(|_| ScriptError::LexerError(format!("Invalid number: {}", text)))?;
                return Ok(TokenKind::Float(value));
            }
        }

        let end = self.offset();
        let text = &self.source[start..end];
        let value: i64 = text
            .parse()
            .map_err(|_| ScriptError::LexerError(format!("Invalid number: {}", text)))?;
        Ok(TokenKind::Int(value))
    }

    fn digits(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.advance();
        }
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.offset();
        match &self.source[start..end] {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "null" | "undefined" => TokenKind::Null,
            ident => TokenKind::Ident(ident.to_string()),
        }
    }
}
