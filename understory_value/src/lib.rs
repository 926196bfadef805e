// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Value: property values, property trees and deep merge.
//!
//! This crate holds the data model shared by feature styling: a tagged
//! [`PropertyValue`], the [`PropertyTree`] a layer declares, the [`Feature`]
//! records a data source produces, and the [`Expression`]s that make a
//! property depend on a feature. Evaluation of expressions lives in
//! `understory_expr`; per-feature resolution lives in `understory_resolve`.
//!
//! ## Merging
//!
//! [`merge`] combines a base tree with an override tree into an effective
//! tree. Objects merge recursively, arrays merge index by index and
//! mismatched shapes are replaced by the override:
//!
//! ```rust
//! use understory_value::{merge, Object, PropertyTree, PropertyValue};
//!
//! fn point(lat: Option<f64>, lng: Option<f64>) -> PropertyValue {
//!     let mut o = Object::new();
//!     if let Some(lat) = lat {
//!         o.insert("lat".into(), lat.into());
//!     }
//!     if let Some(lng) = lng {
//!         o.insert("lng".into(), lng.into());
//!     }
//!     PropertyValue::Object(o)
//! }
//!
//! let mut base = PropertyTree::new();
//! base.insert("position", point(Some(0.0), Some(1.0)));
//! base.insert("label", "default");
//!
//! let mut layer = PropertyTree::new();
//! layer.insert("position", point(Some(1.0), None));
//!
//! let effective = merge(&base, &layer);
//! assert_eq!(effective.get("position"), Some(&point(Some(1.0), Some(1.0))));
//! assert_eq!(effective.get("label"), Some(&PropertyValue::from("default")));
//! ```
//!
//! ## Features
//!
//! - `json`: import and export of authoring JSON (`serde_json`).
//! - `logging`: diagnostic messages through the `log` facade.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod expression;
mod feature;
#[cfg(feature = "json")]
mod json;
mod merge;
mod tree;
mod value;

pub use expression::{ConditionBranch, ConditionsExpression, Expression};
pub use feature::{Feature, FeatureId};
#[cfg(feature = "json")]
pub use json::JsonError;
pub use merge::{merge, merge_all, merge_values};
pub use tree::PropertyTree;
pub use value::{Object, PropertyValue, TIME_DEPENDENT_KEY, ValueKind};
