// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recursive descent parser for conditions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or         := and ( "||" and )*
//! and        := equality ( "&&" equality )*
//! equality   := relational ( ( "==" | "!=" ) relational )*
//! relational := unary ( ( "<" | "<=" | ">" | ">=" ) unary )*
//! unary      := ( "!" | "-" | "+" ) unary | atom
//! atom       := number | string | "true" | "false" | "null" | "undefined"
//!             | attribute | "(" or ")"
//! ```
//!
//! Every unary operator, parenthesis and chained binary operator adds a level
//! of nesting to the resulting tree. Parsing fails with
//! [`SyntaxErrorKind::NestingTooDeep`] past [`MAX_NESTING`] levels, which
//! keeps both parsing and evaluation within a bounded stack.

use alloc::boxed::Box;

use crate::ast::{BinaryOp, Condition, Literal};
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{Span, Token, tokenize};

/// Maximum nesting depth of a parsed condition.
pub const MAX_NESTING: usize = 128;

/// Parses a condition string into a [`Condition`].
///
/// # Errors
///
/// Returns a [`SyntaxError`] describing the first problem found.
///
/// # Example
///
/// ```rust
/// use understory_expr::{BinaryOp, Condition, parse_condition};
///
/// let condition = parse_condition("${feature.property.height} > 10").unwrap();
/// assert!(matches!(condition, Condition::Binary { op: BinaryOp::Gt, .. }));
///
/// assert!(parse_condition("${feature.property.height} >").is_err());
/// ```
pub fn parse_condition(source: &str) -> Result<Condition, SyntaxError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(SyntaxError::new(SyntaxErrorKind::Empty, 0..source.len()));
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        source_len: source.len(),
    };
    let condition = parser.parse_or()?;
    if let Some((_, span)) = parser.tokens.get(parser.pos) {
        return Err(SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken,
            span.clone(),
        ));
    }
    Ok(condition)
}

struct Parser<'a> {
    tokens: &'a [(Token, Span)],
    pos: usize,
    depth: usize,
    source_len: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<&(Token, Span)> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eof_span(&self) -> Span {
        self.source_len..self.source_len
    }

    /// Consumes the current token as an operator one level deeper.
    fn descend(&mut self) -> Result<(), SyntaxError> {
        let span = self
            .tokens
            .get(self.pos)
            .map_or_else(|| self.eof_span(), |(_, span)| span.clone());
        self.pos += 1;
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::new(SyntaxErrorKind::NestingTooDeep, span));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Condition, SyntaxError> {
        let depth = self.depth;
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.descend()?;
            let rhs = self.parse_and()?;
            lhs = Condition::binary(BinaryOp::Or, lhs, rhs);
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Condition, SyntaxError> {
        let depth = self.depth;
        let mut lhs = self.parse_equality()?;
        while self.peek() == Some(&Token::And) {
            self.descend()?;
            let rhs = self.parse_equality()?;
            lhs = Condition::binary(BinaryOp::And, lhs, rhs);
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Condition, SyntaxError> {
        let depth = self.depth;
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => {
                    self.depth = depth;
                    return Ok(lhs);
                }
            };
            self.descend()?;
            let rhs = self.parse_relational()?;
            lhs = Condition::binary(op, lhs, rhs);
        }
    }

    fn parse_relational(&mut self) -> Result<Condition, SyntaxError> {
        let depth = self.depth;
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => {
                    self.depth = depth;
                    return Ok(lhs);
                }
            };
            self.descend()?;
            let rhs = self.parse_unary()?;
            lhs = Condition::binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Condition, SyntaxError> {
        let depth = self.depth;
        let condition = match self.peek() {
            Some(Token::Not) => {
                self.descend()?;
                Condition::Not(Box::new(self.parse_unary()?))
            }
            Some(Token::Minus) => {
                self.descend()?;
                // Fold `-<number>` so signed literals stay literals.
                match self.parse_unary()? {
                    Condition::Literal(Literal::Number(n)) => {
                        Condition::Literal(Literal::Number(-n))
                    }
                    operand => Condition::Negate(Box::new(operand)),
                }
            }
            Some(Token::Plus) => {
                self.descend()?;
                self.parse_unary()?
            }
            _ => self.parse_atom()?,
        };
        self.depth = depth;
        Ok(condition)
    }

    fn parse_atom(&mut self) -> Result<Condition, SyntaxError> {
        let eof = self.eof_span();
        let Some((token, span)) = self.advance().cloned() else {
            return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, eof));
        };
        let literal = match token {
            Token::Number(n) => Literal::Number(n),
            Token::String(s) => Literal::String(s),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Null => Literal::Null,
            Token::Undefined => Literal::Undefined,
            Token::Attribute(name) => return Ok(Condition::Attribute(name)),
            Token::LParen => {
                self.depth += 1;
                if self.depth > MAX_NESTING {
                    return Err(SyntaxError::new(SyntaxErrorKind::NestingTooDeep, span));
                }
                let inner = self.parse_or()?;
                self.depth -= 1;
                return match self.advance() {
                    Some((Token::RParen, _)) => Ok(inner),
                    _ => Err(SyntaxError::new(
                        SyntaxErrorKind::UnclosedParenthesis,
                        span,
                    )),
                };
            }
            _ => {
                return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedToken, span));
            }
        };
        Ok(Condition::Literal(literal))
    }
}
