// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed syntax tree for conditions.

use alloc::boxed::Box;
use alloc::string::String;

/// A constant operand.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// `null`.
    Null,
    /// `undefined`.
    Undefined,
    /// `true` or `false`.
    Bool(bool),
    /// A numeric literal.
    Number(f64),
    /// A quoted string literal, escapes already applied.
    String(String),
}

/// Binary operators, lowest precedence first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==` (also `===`)
    Eq,
    /// `!=` (also `!==`)
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl BinaryOp {
    /// Returns the operator as written in source.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A parsed condition.
///
/// Produced by [`parse_condition`](crate::parse_condition) and evaluated
/// with [`Condition::matches`].
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// A constant.
    Literal(Literal),
    /// A `${feature.property.<name>}` reference, holding `<name>`.
    Attribute(String),
    /// Logical negation, `!x`.
    Not(Box<Condition>),
    /// Numeric negation, `-x`.
    Negate(Box<Condition>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Condition>,
        /// Right operand.
        rhs: Box<Condition>,
    },
}

impl Condition {
    pub(crate) fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}
