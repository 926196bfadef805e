// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Expr: conditional style expressions.
//!
//! A conditions expression is an ordered list of `(condition, result)`
//! branches. Evaluating it against a [`Feature`](understory_value::Feature)
//! returns the result of the first branch whose condition holds, or
//! [`Evaluated::NoMatch`] when none does.
//!
//! Conditions are small boolean expressions over literals and attribute
//! references written as `${feature.property.<name>}`:
//!
//! ```text
//! ${feature.property.height} > 10 && ${feature.property.usage} == 'office'
//! ```
//!
//! Results are text. Placeholders inside a result are substituted with the
//! feature's attribute values and the text is then coerced: numeric text
//! becomes a number, `true`/`false` become booleans, and anything else stays
//! a string.
//!
//! ## Example
//!
//! ```rust
//! use understory_expr::{Evaluated, evaluate};
//! use understory_value::{Expression, Feature, PropertyValue};
//!
//! let color = Expression::conditions([
//!     ("${feature.property.height} > 10", "#ff0000"),
//!     ("true", "#cccccc"),
//! ]);
//!
//! let tall = Feature::new("a").with_attribute("height", 20.0);
//! let short = Feature::new("b").with_attribute("height", 5.0);
//! assert_eq!(evaluate(&color, &tall), Evaluated::Value(PropertyValue::from("#ff0000")));
//! assert_eq!(evaluate(&color, &short), Evaluated::Value(PropertyValue::from("#cccccc")));
//! ```
//!
//! ## Missing attributes
//!
//! A condition that reads a missing attribute does not hold, whatever the
//! operator. Without a trailing `"true"` branch such a feature gets
//! [`Evaluated::NoMatch`] and the property stays unset.
//!
//! ## Syntax errors
//!
//! A branch whose condition fails to parse is skipped.
//! [`evaluate_with_report`] returns the skipped branches with their
//! [`SyntaxError`]s. With the `logging` feature each failure is also logged
//! at debug level when compiled.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod ast;
mod coerce;
mod compiled;
mod error;
mod eval;
mod lexer;
mod parser;
mod template;

pub use ast::{BinaryOp, Condition, Literal};
pub use coerce::{coerce_text, parse_number};
pub use compiled::{
    BranchError, CompiledConditions, Evaluated, Report, compile, evaluate, evaluate_with_report,
};
pub use error::{SyntaxError, SyntaxErrorKind};
pub use parser::{MAX_NESTING, parse_condition};
pub use template::ResultTemplate;
