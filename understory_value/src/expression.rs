// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative style expressions.
//!
//! This module only describes expressions. Parsing and evaluation of
//! condition strings live in `understory_expr`.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::value::PropertyValue;

/// A value that may depend on a feature's attributes.
#[derive(Clone, Debug, PartialEq, Hash)]
pub enum Expression {
    /// A constant. Evaluates to itself without consulting the feature.
    Literal(Box<PropertyValue>),
    /// An ordered list of condition branches; the first match wins.
    Conditions(ConditionsExpression),
}

impl Expression {
    /// Creates a literal expression.
    #[must_use]
    pub fn literal(value: impl Into<PropertyValue>) -> Self {
        Self::Literal(Box::new(value.into()))
    }

    /// Creates a conditions expression from `(condition, result)` pairs.
    ///
    /// ```rust
    /// use understory_value::Expression;
    ///
    /// let expr = Expression::conditions([
    ///     ("${feature.property.height} > 10", "tall"),
    ///     ("true", "default"),
    /// ]);
    /// assert!(matches!(expr, Expression::Conditions(ref c) if c.len() == 2));
    /// ```
    #[must_use]
    pub fn conditions<C, R>(branches: impl IntoIterator<Item = (C, R)>) -> Self
    where
        C: Into<String>,
        R: Into<String>,
    {
        Self::Conditions(branches.into_iter().collect())
    }
}

/// One `(condition, result)` pair of a [`ConditionsExpression`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConditionBranch {
    /// Boolean condition source, e.g. `${feature.property.height} > 10`.
    pub condition: String,
    /// Result template returned when the condition holds.
    pub result: String,
}

impl ConditionBranch {
    /// Creates a branch.
    #[must_use]
    pub fn new(condition: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            result: result.into(),
        }
    }
}

/// An ordered sequence of condition branches.
///
/// Order is significant. There is no implicit fallback: a trailing `"true"`
/// condition has to be declared explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConditionsExpression {
    branches: Vec<ConditionBranch>,
}

impl ConditionsExpression {
    /// Creates an empty expression. It never matches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a branch and returns `self`.
    #[must_use]
    pub fn with(mut self, condition: impl Into<String>, result: impl Into<String>) -> Self {
        self.push(condition, result);
        self
    }

    /// Appends a branch.
    pub fn push(&mut self, condition: impl Into<String>, result: impl Into<String>) {
        self.branches.push(ConditionBranch::new(condition, result));
    }

    /// Returns the branches in declared order.
    #[must_use]
    #[inline]
    pub fn branches(&self) -> &[ConditionBranch] {
        &self.branches
    }

    /// Returns the number of branches.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Returns `true` if there are no branches.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl<C: Into<String>, R: Into<String>> FromIterator<(C, R)> for ConditionsExpression {
    fn from_iter<I: IntoIterator<Item = (C, R)>>(iter: I) -> Self {
        Self {
            branches: iter
                .into_iter()
                .map(|(condition, result)| ConditionBranch::new(condition, result))
                .collect(),
        }
    }
}
