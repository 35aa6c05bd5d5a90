//! Formula tokenizer
//!
//! Converts formula strings like "SUM([price]) * 1.1" into a sequence of
//! tokens. The token set is deliberately restricted: column references in
//! brackets, aggregate function names, numbers, `+ - * / ( )`. Anything
//! else is a tokenize error, which the evaluation layer reports as a
//! formula error (never arbitrary code execution).

use std::iter::Peekable;
use std::str::Chars;

/// A token in a chart formula
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal (e.g., 123, 45.67, 1.5e10)
    Number(f64),
    /// A bracketed column reference: `[price]` -> ColumnRef("price")
    ColumnRef(String),
    /// A bare identifier - an aggregate function name (SUM, AVG, MIN, MAX)
    Ident(String),
    /// Arithmetic operators: + - * /
    Operator(char),
    /// Opening parenthesis
    OpenParen,
    /// Closing parenthesis
    CloseParen,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tokenize error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Tokenizer for chart formulas
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(formula: &'a str) -> Self {
        Self {
            chars: formula.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire formula into a vector of tokens
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.skip_whitespace();

        match self.peek() {
            None => Ok(None),
            Some(c) => {
                let token = match c {
                    '[' => self.read_column_ref()?,

                    '(' => {
                        self.advance();
                        Token::OpenParen
                    }
                    ')' => {
                        self.advance();
                        Token::CloseParen
                    }

                    // Minus is always an operator; the parser handles
                    // unary minus.
                    '+' | '-' | '*' | '/' => {
                        self.advance();
                        Token::Operator(c)
                    }

                    c if c.is_ascii_digit() || c == '.' => self.read_number()?,

                    c if c.is_alphabetic() || c == '_' => self.read_ident(),

                    c => {
                        return Err(TokenizeError::new(
                            format!("Unexpected character: '{}'", c),
                            self.position,
                        ));
                    }
                };
                Ok(Some(token))
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a bracketed column reference: everything up to the closing `]`.
    /// Column keys may contain spaces; the name is trimmed.
    fn read_column_ref(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        self.advance(); // consume '['

        let mut name = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(TokenizeError::new(
                        "Unterminated column reference",
                        start_pos,
                    ));
                }
                Some(']') => break,
                Some(c) => name.push(c),
            }
        }

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(TokenizeError::new("Empty column reference", start_pos));
        }

        Ok(Token::ColumnRef(name))
    }

    /// Read a number (integer, decimal, or scientific notation)
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let mut num_str = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                num_str.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') {
            num_str.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    num_str.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Exponent part (e.g., 1.5e10, 2E-5)
        if matches!(self.peek(), Some('e') | Some('E')) {
            num_str.push('e');
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                num_str.push(self.advance().unwrap_or('+'));
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    num_str.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| TokenizeError::new(format!("Invalid number: {}", num_str), start_pos))
    }

    /// Read a bare identifier (aggregate function name)
    fn read_ident(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token::Ident(ident)
    }
}

/// Convenience function to tokenize a formula string
pub fn tokenize(formula: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(formula).tokenize()
}
