//! Formula parser
//!
//! Converts a token sequence into an AST using recursive descent with
//! operator precedence. The grammar is the restricted chart-formula
//! language: column references, SUM/AVG/MIN/MAX aggregate calls over a
//! single column, and `+ - * / ( )` arithmetic.

use super::tokenizer::Token;

/// Aggregate functions evaluated over the whole dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFn {
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    /// Map a function name to its aggregate, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SUM" => Some(AggregateFn::Sum),
            "AVG" => Some(AggregateFn::Avg),
            "MIN" => Some(AggregateFn::Min),
            "MAX" => Some(AggregateFn::Max),
            _ => None,
        }
    }
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Abstract Syntax Tree node for chart formulas
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal
    Number(f64),
    /// A column reference: `[price]`
    ColumnRef(String),
    /// An aggregate over the whole dataset: `SUM([price])`
    Aggregate { func: AggregateFn, column: String },
    /// Binary operation: left op right
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary negation: -expr
    Negate(Box<Expr>),
}

/// Error during parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at token {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Parser for formula tokens
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the tokens into an AST
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::new("Empty formula", 0));
        }
        let expr = self.expression()?;

        if !self.is_at_end() {
            return Err(ParseError::new(
                format!("Unexpected token after expression: {:?}", self.peek()),
                self.position,
            ));
        }

        Ok(expr)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&Token> {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.tokens.get(self.position - 1)
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if the current token is any of the given operators
    fn match_any_operator(&mut self, ops: &[(char, BinOp)]) -> Option<BinOp> {
        if let Some(Token::Operator(c)) = self.peek() {
            if let Some((_, op)) = ops.iter().find(|(ch, _)| ch == c) {
                let op = *op;
                self.advance();
                return Some(op);
            }
        }
        None
    }

    /// Expression: factor (( "+" | "-" ) factor)*
    fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.factor()?;

        while let Some(op) = self.match_any_operator(&[('+', BinOp::Add), ('-', BinOp::Sub)]) {
            let right = self.factor()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Factor: unary (( "*" | "/" ) unary)*
    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;

        while let Some(op) = self.match_any_operator(&[('*', BinOp::Mul), ('/', BinOp::Div)]) {
            let right = self.unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Unary: ( "-" ) unary | primary
    fn unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(Token::Operator('-')) = self.peek() {
            self.advance();
            let operand = self.unary()?;
            Ok(Expr::Negate(Box::new(operand)))
        } else {
            self.primary()
        }
    }

    /// Primary: NUMBER | COLUMN_REF | AGGREGATE "(" COLUMN_REF ")" | "(" expr ")"
    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().cloned();

        match token {
            Some(Token::Number(n)) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Some(Token::ColumnRef(name)) => {
                self.advance();
                Ok(Expr::ColumnRef(name))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                self.aggregate_call(&name)
            }
            Some(Token::OpenParen) => {
                self.advance();
                let expr = self.expression()?;
                if !self.match_token(&Token::CloseParen) {
                    return Err(ParseError::new(
                        "Expected ')' after expression",
                        self.position,
                    ));
                }
                Ok(expr)
            }
            Some(token) => Err(ParseError::new(
                format!("Unexpected token: {:?}", token),
                self.position,
            )),
            None => Err(ParseError::new("Unexpected end of formula", self.position)),
        }
    }

    /// Aggregate call: the identifier must be a known function and the
    /// argument must be a single column reference.
    fn aggregate_call(&mut self, name: &str) -> Result<Expr, ParseError> {
        let func = AggregateFn::from_name(name).ok_or_else(|| {
            ParseError::new(
                format!("Unknown function '{}' (expected SUM, AVG, MIN or MAX)", name),
                self.position,
            )
        })?;

        if !self.match_token(&Token::OpenParen) {
            return Err(ParseError::new(
                format!("Expected '(' after {}", name),
                self.position,
            ));
        }

        let column = match self.advance() {
            Some(Token::ColumnRef(column)) => column.clone(),
            other => {
                return Err(ParseError::new(
                    format!(
                        "Expected a column reference as {} argument, got {:?}",
                        name, other
                    ),
                    self.position,
                ));
            }
        };

        if !self.match_token(&Token::CloseParen) {
            return Err(ParseError::new(
                format!("Expected ')' after {} argument", name),
                self.position,
            ));
        }

        Ok(Expr::Aggregate { func, column })
    }
}

/// Convenience function to parse tokens into an AST
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}
