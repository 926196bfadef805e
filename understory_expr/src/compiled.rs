// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compiled conditions expressions and evaluation entry points.

use alloc::vec::Vec;

use smallvec::SmallVec;
use understory_value::{ConditionsExpression, Expression, Feature, PropertyValue};

use crate::ast::Condition;
use crate::error::SyntaxError;
use crate::parser::parse_condition;
use crate::template::ResultTemplate;

/// Outcome of evaluating an expression against a feature.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluated {
    /// The value produced by the first matching branch, or a literal.
    Value(PropertyValue),
    /// No branch matched; the property stays unset.
    NoMatch,
}

impl Evaluated {
    /// Returns `true` if no branch matched.
    #[must_use]
    #[inline]
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch)
    }

    /// Returns the produced value, if any.
    #[must_use]
    #[inline]
    pub fn value(&self) -> Option<&PropertyValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::NoMatch => None,
        }
    }

    /// Converts into an `Option`, mapping [`Evaluated::NoMatch`] to `None`.
    #[must_use]
    #[inline]
    pub fn into_option(self) -> Option<PropertyValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::NoMatch => None,
        }
    }
}

#[derive(Clone, Debug)]
struct CompiledBranch {
    condition: Result<Condition, SyntaxError>,
    result: ResultTemplate,
}

/// A conditions expression with every branch parsed once.
///
/// Branches whose condition fails to parse are kept in place so branch
/// indices stay aligned with the source expression; they never match.
///
/// # Example
///
/// ```rust
/// use understory_expr::{CompiledConditions, Evaluated};
/// use understory_value::{ConditionsExpression, Feature, PropertyValue};
///
/// let conditions = ConditionsExpression::new()
///     .with("${feature.property.height} > 10", "tall")
///     .with("true", "default");
/// let compiled = CompiledConditions::compile(&conditions);
///
/// let tall = Feature::new("a").with_attribute("height", 20.0);
/// assert_eq!(compiled.evaluate(&tall), Evaluated::Value(PropertyValue::from("tall")));
/// assert_eq!(compiled.matching_branch(&tall), Some(0));
/// ```
#[derive(Clone, Debug)]
pub struct CompiledConditions {
    branches: SmallVec<[CompiledBranch; 4]>,
}

impl CompiledConditions {
    /// Parses every branch of `conditions`.
    #[must_use]
    pub fn compile(conditions: &ConditionsExpression) -> Self {
        let branches = conditions
            .branches()
            .iter()
            .enumerate()
            .map(|(_index, branch)| {
                let condition = parse_condition(&branch.condition);
                #[cfg(feature = "logging")]
                if let Err(error) = &condition {
                    log::debug!(
                        "branch {_index} condition {:?} skipped: {error}",
                        branch.condition
                    );
                }
                CompiledBranch {
                    condition,
                    result: ResultTemplate::parse(&branch.result),
                }
            })
            .collect();
        Self { branches }
    }

    /// Returns the number of branches, including broken ones.
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

    /// Returns the index of the first branch whose condition holds.
    #[must_use]
    pub fn matching_branch(&self, feature: &Feature) -> Option<usize> {
        self.branches.iter().position(|branch| {
            branch
                .condition
                .as_ref()
                .is_ok_and(|condition| condition.matches(feature))
        })
    }

    /// Evaluates the branches in order and renders the first match.
    #[must_use]
    pub fn evaluate(&self, feature: &Feature) -> Evaluated {
        match self.matching_branch(feature) {
            Some(index) => Evaluated::Value(self.branches[index].result.render(feature)),
            None => Evaluated::NoMatch,
        }
    }

    /// Iterates over the syntax errors of broken branches with their indices.
    pub fn errors(&self) -> impl Iterator<Item = (usize, &SyntaxError)> + '_ {
        self.branches
            .iter()
            .enumerate()
            .filter_map(|(index, branch)| branch.condition.as_ref().err().map(|e| (index, e)))
    }
}

/// Compiles a conditions expression. Same as [`CompiledConditions::compile`].
#[must_use]
pub fn compile(conditions: &ConditionsExpression) -> CompiledConditions {
    CompiledConditions::compile(conditions)
}

/// Evaluates `expression` against `feature`.
///
/// Literal expressions yield their value unchanged. Conditions expressions
/// are compiled on the fly; callers evaluating the same expression for many
/// features should keep a [`CompiledConditions`] instead.
///
/// ```rust
/// use understory_expr::{Evaluated, evaluate};
/// use understory_value::{Expression, Feature, PropertyValue};
///
/// let feature = Feature::new("a");
/// assert_eq!(
///     evaluate(&Expression::literal(3.0), &feature),
///     Evaluated::Value(PropertyValue::from(3.0))
/// );
/// assert_eq!(
///     evaluate(&Expression::conditions([("${feature.property.x} > 0", "yes")]), &feature),
///     Evaluated::NoMatch
/// );
/// ```
#[must_use]
pub fn evaluate(expression: &Expression, feature: &Feature) -> Evaluated {
    match expression {
        Expression::Literal(value) => Evaluated::Value((**value).clone()),
        Expression::Conditions(conditions) => {
            CompiledConditions::compile(conditions).evaluate(feature)
        }
    }
}

/// A syntax error attached to the branch it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchError {
    /// Index of the branch within its expression.
    pub branch: usize,
    /// The parse failure.
    pub error: SyntaxError,
}

/// Evaluation outcome together with diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// The evaluation result.
    pub outcome: Evaluated,
    /// Index of the branch that produced the value, if any.
    pub matched: Option<usize>,
    /// Branches skipped because their condition did not parse.
    pub errors: Vec<BranchError>,
}

/// Like [`evaluate`], but also reports the matching branch and any broken
/// branches.
#[must_use]
pub fn evaluate_with_report(expression: &Expression, feature: &Feature) -> Report {
    match expression {
        Expression::Literal(value) => Report {
            outcome: Evaluated::Value((**value).clone()),
            matched: None,
            errors: Vec::new(),
        },
        Expression::Conditions(conditions) => {
            let compiled = CompiledConditions::compile(conditions);
            let matched = compiled.matching_branch(feature);
            let outcome = match matched {
                Some(index) => Evaluated::Value(compiled.branches[index].result.render(feature)),
                None => Evaluated::NoMatch,
            };
            let errors = compiled
                .errors()
                .map(|(branch, error)| BranchError {
                    branch,
                    error: error.clone(),
                })
                .collect();
            Report {
                outcome,
                matched,
                errors,
            }
        }
    }
}
