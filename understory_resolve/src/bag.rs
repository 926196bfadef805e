// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolution output.

use std::collections::BTreeMap;
use std::fmt;

use understory_binding::DynamicBinding;
use understory_expr::SyntaxError;
use understory_value::{FeatureId, Object, PropertyValue};

/// Why a feature was resolved in degraded mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DegradeReason {
    /// The effective tree is nested deeper than
    /// [`PipelineConfig::max_depth`](crate::PipelineConfig::max_depth).
    DepthExceeded {
        /// Depth of the effective tree.
        depth: usize,
        /// Configured limit.
        max_depth: usize,
    },
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthExceeded { depth, max_depth } => {
                write!(f, "property tree depth {depth} exceeds limit {max_depth}")
            }
        }
    }
}

/// A non-fatal problem met while resolving one feature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveWarning {
    /// A condition branch failed to parse and was skipped.
    SyntaxError {
        /// Top-level field containing the expression.
        field: String,
        /// Index of the branch within its expression.
        branch: usize,
        /// The parse failure.
        error: SyntaxError,
    },
    /// The feature was resolved from the layer tree alone, without
    /// expressions.
    Degraded {
        /// What triggered degradation.
        reason: DegradeReason,
    },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyntaxError {
                field,
                branch,
                error,
            } => write!(f, "field `{field}` branch {branch}: {error}"),
            Self::Degraded { reason } => write!(f, "degraded: {reason}"),
        }
    }
}

/// Fully resolved properties of one feature.
///
/// Static fields hold plain values with no expressions left. Time-dependent
/// top-level fields are not in [`fields`](Self::fields); they appear as
/// [`DynamicBinding`]s in [`dynamic`](Self::dynamic).
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPropertyBag {
    pub(crate) feature_id: FeatureId,
    pub(crate) fields: Object,
    pub(crate) dynamic: BTreeMap<String, DynamicBinding>,
    pub(crate) warnings: Vec<ResolveWarning>,
}

impl ResolvedPropertyBag {
    pub(crate) fn new(feature_id: FeatureId) -> Self {
        Self {
            feature_id,
            fields: Object::new(),
            dynamic: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns the feature this bag belongs to.
    #[must_use]
    #[inline]
    pub fn feature_id(&self) -> &FeatureId {
        &self.feature_id
    }

    /// Returns the static fields.
    #[must_use]
    #[inline]
    pub fn fields(&self) -> &Object {
        &self.fields
    }

    /// Returns a static field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&PropertyValue> {
        self.fields.get(field)
    }

    /// Returns the dynamic bindings by field name.
    #[must_use]
    #[inline]
    pub fn dynamic(&self) -> &BTreeMap<String, DynamicBinding> {
        &self.dynamic
    }

    /// Returns the binding of a time-dependent field.
    #[must_use]
    pub fn binding(&self, field: &str) -> Option<&DynamicBinding> {
        self.dynamic.get(field)
    }

    /// Returns the warnings collected for this feature.
    #[must_use]
    #[inline]
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    /// Returns `true` if the feature was resolved in degraded mode.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, ResolveWarning::Degraded { .. }))
    }
}
