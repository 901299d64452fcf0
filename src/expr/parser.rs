//! Recursive-descent parser for the expression grammar.
//!
//! Precedence, loosest first: `||`, `&&`, comparisons, `!`, property
//! access / primary. No arithmetic, no function calls, no assignment.

use serde_json::{json, Value};

use super::ast::{BinaryOp, Expr, PathSegment};
use super::lexer::{tokenize, Token};
use super::ExprError;

pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExprError::ParseError("empty expression".into()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::ParseError(format!(
            "unexpected trailing input at token {}",
            parser.pos
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ExprError> {
        match self.advance() {
            Some(ref t) if t == expected => Ok(()),
            other => Err(ExprError::ParseError(format!(
                "expected {}, got {:?}",
                what, other
            ))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_comparison()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek().and_then(comparison_op) {
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(&Token::Bang) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Number(n)) => Ok(Expr::Literal(number_value(n))),
            Some(Token::Minus) => match self.advance() {
                Some(Token::Number(n)) => Ok(Expr::Literal(number_value(-n))),
                other => Err(ExprError::ParseError(format!(
                    "expected number after '-', got {:?}",
                    other
                ))),
            },
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(root)) => {
                let segments = self.parse_path_segments()?;
                Ok(Expr::Path { root, segments })
            }
            other => Err(ExprError::ParseError(format!(
                "unexpected token: {:?}",
                other
            ))),
        }
    }

    fn parse_path_segments(&mut self) -> Result<Vec<PathSegment>, ExprError> {
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    match self.advance() {
                        Some(Token::Ident(key)) => segments.push(PathSegment::Key(key)),
                        // allow keyword-looking property names after '.'
                        Some(Token::True) => segments.push(PathSegment::Key("true".into())),
                        Some(Token::False) => segments.push(PathSegment::Key("false".into())),
                        Some(Token::Null) => segments.push(PathSegment::Key("null".into())),
                        other => {
                            return Err(ExprError::ParseError(format!(
                                "expected property name after '.', got {:?}",
                                other
                            )));
                        }
                    }
                }
                Some(Token::LBracket) => {
                    self.advance();
                    match self.advance() {
                        Some(Token::Str(key)) => segments.push(PathSegment::Key(key)),
                        Some(Token::Number(n)) if n >= 0.0 && n.fract() == 0.0 => {
                            segments.push(PathSegment::Index(n as usize));
                        }
                        other => {
                            return Err(ExprError::ParseError(format!(
                                "expected string or integer index, got {:?}",
                                other
                            )));
                        }
                    }
                    self.expect(&Token::RBracket, "']'")?;
                }
                _ => break,
            }
        }
        Ok(segments)
    }
}

fn comparison_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::EqEq => Some(BinaryOp::Eq),
        Token::EqEqEq => Some(BinaryOp::StrictEq),
        Token::NotEq => Some(BinaryOp::NotEq),
        Token::NotEqEq => Some(BinaryOp::StrictNotEq),
        Token::Lt => Some(BinaryOp::LessThan),
        Token::Le => Some(BinaryOp::LessOrEqual),
        Token::Gt => Some(BinaryOp::GreaterThan),
        Token::Ge => Some(BinaryOp::GreaterOrEqual),
        _ => None,
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}
