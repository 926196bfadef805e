// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Resolve: per-feature property resolution.
//!
//! [`ResolutionPipeline`] combines the other Understory styling crates. For
//! each feature it
//!
//! 1. merges the layer's property tree with an optional override tree
//!    (`understory_value::merge`),
//! 2. evaluates every expression in the merged tree against the feature
//!    (`understory_expr`),
//! 3. registers a dynamic binding for every time-dependent top-level field
//!    (`understory_binding`), and
//! 4. emits a [`ResolvedPropertyBag`] holding the static fields and the
//!    bindings.
//!
//! Per-feature problems never abort a pass. Broken condition branches are
//! skipped and reported as [`ResolveWarning::SyntaxError`]. Trees nested
//! deeper than [`PipelineConfig::max_depth`] degrade to the layer tree alone
//! and are flagged with [`ResolveWarning::Degraded`].
//!
//! ## Caching
//!
//! Resolved bags are cached per feature, keyed by the hash of the effective
//! tree. A cached bag is reused only if the effective tree and the feature
//! are exactly equal to the ones it was resolved from, so resolving the same
//! inputs twice yields equal bags whether or not the cache is enabled.
//!
//! ## Time-dependent fields
//!
//! A value is time-dependent when it is an object carrying
//! `"timeDependent": true` (see [`understory_value::TIME_DEPENDENT_KEY`]).
//! Such a field is not stored as a static value. Instead the pipeline binds a
//! sampler that forwards to the pipeline's [`SampleSource`] and puts the
//! resulting [`DynamicBinding`](understory_binding::DynamicBinding) in the
//! bag.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use understory_binding::DynamicPropertyBinder;
//! use understory_resolve::{ResolutionPipeline, StaticSampleSource};
//! use understory_value::{Feature, Object, PropertyTree, PropertyValue, TIME_DEPENDENT_KEY};
//!
//! let mut position = Object::new();
//! position.insert(TIME_DEPENDENT_KEY.into(), PropertyValue::from(true));
//! position.insert("x".into(), PropertyValue::from(4.0));
//!
//! let mut layer = PropertyTree::new();
//! layer.insert("position", PropertyValue::Object(position));
//!
//! let binder = Arc::new(DynamicPropertyBinder::new());
//! let mut pipeline = ResolutionPipeline::new(binder.clone(), Arc::new(StaticSampleSource));
//! let bag = pipeline.resolve_feature(&layer, None, &Feature::new("bus"));
//!
//! let binding = bag.binding("position").unwrap();
//! let mut expected = Object::new();
//! expected.insert("x".into(), PropertyValue::from(4.0));
//! assert_eq!(binder.sample(binding.key()), Some(PropertyValue::Object(expected)));
//!
//! // Removing the feature from display releases its bindings.
//! assert_eq!(pipeline.release_feature(bag.feature_id()), 1);
//! assert!(binder.is_empty());
//! ```
//!
//! ## Features
//!
//! - `logging`: logs degraded features and cache activity through the `log`
//!   facade, and enables logging in the underlying crates.

mod bag;
mod cache;
mod config;
mod pipeline;
mod sample;

pub use bag::{DegradeReason, ResolveWarning, ResolvedPropertyBag};
pub use config::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_DEPTH, PipelineConfig, PipelineConfigBuilder};
pub use pipeline::ResolutionPipeline;
pub use sample::{SampleSource, StaticSampleSource};
