// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Condition evaluation.
//!
//! Conditions evaluate over the primitive values plus an `undefined`
//! sentinel, produced by missing (or non-primitive) attributes. `undefined`
//! is absorbing for comparisons and negation, so a missing attribute can
//! never make a branch match by accident.
//!
//! Coercion rules for comparisons:
//!
//! | Operands                  | `==` / `!=`            | `<` `<=` `>` `>=`     |
//! |---------------------------|------------------------|-----------------------|
//! | either `undefined`        | `undefined`            | `undefined`           |
//! | number, number            | numeric                | numeric               |
//! | string, string            | exact                  | lexicographic (bytes) |
//! | bool, bool                | exact                  | as 0/1                |
//! | null, null                | equal                  | false                 |
//! | null, other               | not equal              | false                 |
//! | number/bool/numeric text  | numeric                | numeric               |
//! | otherwise                 | not equal              | false                 |

use core::cmp::Ordering;

use understory_value::{Feature, PropertyValue};

use crate::ast::{BinaryOp, Condition, Literal};
use crate::coerce::parse_number;

/// Runtime value of a condition operand.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Operand<'a> {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(&'a str),
}

impl Operand<'_> {
    fn truthy(self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => b,
            Self::Number(n) => n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
        }
    }

    fn to_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Self::Str(s) => parse_number(s),
            Self::Undefined | Self::Null => None,
        }
    }
}

fn attribute<'a>(feature: &'a Feature, name: &str) -> Operand<'a> {
    match feature.attribute(name) {
        Some(PropertyValue::Null) => Operand::Null,
        Some(PropertyValue::Bool(b)) => Operand::Bool(*b),
        Some(PropertyValue::Number(n)) => Operand::Number(*n),
        Some(PropertyValue::String(s)) => Operand::Str(s),
        Some(
            PropertyValue::Object(_) | PropertyValue::Array(_) | PropertyValue::ExpressionRef(_),
        )
        | None => Operand::Undefined,
    }
}

fn loose_eq(lhs: Operand<'_>, rhs: Operand<'_>) -> bool {
    match (lhs, rhs) {
        (Operand::Null, Operand::Null) => true,
        (Operand::Null, _) | (_, Operand::Null) => false,
        (Operand::Str(a), Operand::Str(b)) => a == b,
        (Operand::Bool(a), Operand::Bool(b)) => a == b,
        (a, b) => match (a.to_number(), b.to_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn ordering(lhs: Operand<'_>, rhs: Operand<'_>) -> Option<Ordering> {
    match (lhs, rhs) {
        (Operand::Null, _) | (_, Operand::Null) => None,
        (Operand::Str(a), Operand::Str(b)) => Some(a.cmp(b)),
        (a, b) => a.to_number()?.partial_cmp(&b.to_number()?),
    }
}

fn compare<'a>(op: BinaryOp, lhs: Operand<'a>, rhs: Operand<'a>) -> Operand<'a> {
    if lhs == Operand::Undefined || rhs == Operand::Undefined {
        return Operand::Undefined;
    }
    let result = match op {
        BinaryOp::Eq => loose_eq(lhs, rhs),
        BinaryOp::Ne => !loose_eq(lhs, rhs),
        BinaryOp::Lt => ordering(lhs, rhs) == Some(Ordering::Less),
        BinaryOp::Le => matches!(ordering(lhs, rhs), Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => ordering(lhs, rhs) == Some(Ordering::Greater),
        BinaryOp::Ge => matches!(
            ordering(lhs, rhs),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        BinaryOp::Or | BinaryOp::And => unreachable!("logical operators short-circuit"),
    };
    Operand::Bool(result)
}

fn eval<'a>(condition: &'a Condition, feature: &'a Feature) -> Operand<'a> {
    match condition {
        Condition::Literal(literal) => match literal {
            Literal::Null => Operand::Null,
            Literal::Undefined => Operand::Undefined,
            Literal::Bool(b) => Operand::Bool(*b),
            Literal::Number(n) => Operand::Number(*n),
            Literal::String(s) => Operand::Str(s),
        },
        Condition::Attribute(name) => attribute(feature, name),
        Condition::Not(inner) => match eval(inner, feature) {
            Operand::Undefined => Operand::Undefined,
            value => Operand::Bool(!value.truthy()),
        },
        Condition::Negate(inner) => eval(inner, feature)
            .to_number()
            .map_or(Operand::Undefined, |n| Operand::Number(-n)),
        Condition::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => {
            let lhs = eval(lhs, feature);
            if lhs == Operand::Undefined {
                return Operand::Undefined;
            }
            if !lhs.truthy() {
                return Operand::Bool(false);
            }
            match eval(rhs, feature) {
                Operand::Undefined => Operand::Undefined,
                rhs => Operand::Bool(rhs.truthy()),
            }
        }
        Condition::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => {
            let lhs = eval(lhs, feature);
            if lhs.truthy() {
                return Operand::Bool(true);
            }
            let rhs = eval(rhs, feature);
            if rhs.truthy() {
                Operand::Bool(true)
            } else if lhs == Operand::Undefined || rhs == Operand::Undefined {
                Operand::Undefined
            } else {
                Operand::Bool(false)
            }
        }
        Condition::Binary { op, lhs, rhs } => {
            compare(*op, eval(lhs, feature), eval(rhs, feature))
        }
    }
}

impl Condition {
    /// Returns `true` if this condition holds for `feature`.
    ///
    /// Reads nothing but the feature's attributes.
    ///
    /// ```rust
    /// use understory_expr::parse_condition;
    /// use understory_value::Feature;
    ///
    /// let condition = parse_condition("${feature.property.height} > 10").unwrap();
    /// assert!(condition.matches(&Feature::new("a").with_attribute("height", 20.0)));
    /// assert!(!condition.matches(&Feature::new("b").with_attribute("height", 5.0)));
    /// assert!(!condition.matches(&Feature::new("c")));
    /// ```
    #[must_use]
    pub fn matches(&self, feature: &Feature) -> bool {
        eval(self, feature).truthy()
    }
}
