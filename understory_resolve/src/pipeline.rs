// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The resolution pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use understory_binding::{DynamicBinding, DynamicPropertyBinder, Sampler};
use understory_expr::{CompiledConditions, Evaluated};
use understory_value::{
    ConditionsExpression, Expression, Feature, FeatureId, PropertyTree, PropertyValue, merge,
};

use crate::bag::{DegradeReason, ResolveWarning, ResolvedPropertyBag};
use crate::cache::BagCache;
use crate::config::PipelineConfig;
use crate::sample::SampleSource;

/// Turns layer property trees into per-feature [`ResolvedPropertyBag`]s.
///
/// For every feature the pipeline merges the layer tree with the optional
/// override tree, evaluates each expression against the feature, and splits
/// the result into static fields and dynamic bindings for time-dependent
/// top-level fields.
///
/// The pipeline remembers which bindings it created per feature. A field that
/// stays time-dependent keeps its key across passes; a field that turns
/// static or disappears is unbound. Bindings of features that are no longer
/// displayed must be released with [`release_feature`](Self::release_feature)
/// or [`release_all`](Self::release_all).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use understory_binding::DynamicPropertyBinder;
/// use understory_resolve::{ResolutionPipeline, StaticSampleSource};
/// use understory_value::{Expression, Feature, PropertyTree, PropertyValue};
///
/// let mut layer = PropertyTree::new();
/// layer.insert("size", 2.0);
/// layer.insert(
///     "color",
///     Expression::conditions([
///         ("${feature.property.height} > 10", "#ff0000"),
///         ("true", "#cccccc"),
///     ]),
/// );
///
/// let mut pipeline = ResolutionPipeline::new(
///     Arc::new(DynamicPropertyBinder::new()),
///     Arc::new(StaticSampleSource),
/// );
/// let bags = pipeline.resolve(
///     &layer,
///     None,
///     &[
///         Feature::new("a").with_attribute("height", 20.0),
///         Feature::new("b").with_attribute("height", 5.0),
///     ],
/// );
///
/// assert_eq!(bags[0].get("color"), Some(&PropertyValue::from("#ff0000")));
/// assert_eq!(bags[1].get("color"), Some(&PropertyValue::from("#cccccc")));
/// assert_eq!(bags[1].get("size"), Some(&PropertyValue::from(2.0)));
/// ```
pub struct ResolutionPipeline {
    config: PipelineConfig,
    binder: Arc<DynamicPropertyBinder>,
    source: Arc<dyn SampleSource>,
    compiled: HashMap<ConditionsExpression, CompiledConditions>,
    cache: BagCache,
    live: HashMap<FeatureId, BTreeMap<String, DynamicBinding>>,
}

impl fmt::Debug for ResolutionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionPipeline")
            .field("config", &self.config)
            .field("binder", &self.binder)
            .field("compiled", &self.compiled.len())
            .field("cache", &self.cache.len())
            .field("live", &self.live.len())
            .finish_non_exhaustive()
    }
}

impl ResolutionPipeline {
    /// Creates a pipeline with the default [`PipelineConfig`].
    pub fn new(binder: Arc<DynamicPropertyBinder>, source: Arc<dyn SampleSource>) -> Self {
        Self::with_config(PipelineConfig::default(), binder, source)
    }

    /// Creates a pipeline with an explicit configuration.
    pub fn with_config(
        config: PipelineConfig,
        binder: Arc<DynamicPropertyBinder>,
        source: Arc<dyn SampleSource>,
    ) -> Self {
        Self {
            config,
            binder,
            source,
            compiled: HashMap::new(),
            cache: BagCache::new(config.cache_capacity()),
            live: HashMap::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the binder dynamic fields are registered with.
    #[must_use]
    #[inline]
    pub fn binder(&self) -> &Arc<DynamicPropertyBinder> {
        &self.binder
    }

    /// Returns the number of cached bags.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Resolves every feature against `layer` merged with `override_`.
    ///
    /// Bags are returned in feature order. Each feature is resolved
    /// independently of the others.
    ///
    /// Feature ids must be unique within `features`: bindings are tracked
    /// per id, so a repeated id would take over the bindings issued to the
    /// earlier bag.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if two features share an id.
    pub fn resolve(
        &mut self,
        layer: &PropertyTree,
        override_: Option<&PropertyTree>,
        features: &[Feature],
    ) -> Vec<ResolvedPropertyBag> {
        debug_assert!(
            {
                let mut seen = HashSet::with_capacity(features.len());
                features.iter().all(|feature| seen.insert(feature.id()))
            },
            "feature ids must be unique within a resolution pass"
        );
        let effective = effective_tree(layer, override_);
        let tree_hash = self.cache.tree_hash(&effective);
        features
            .iter()
            .map(|feature| self.resolve_effective(layer, &effective, tree_hash, feature))
            .collect()
    }

    /// Resolves a single feature.
    pub fn resolve_feature(
        &mut self,
        layer: &PropertyTree,
        override_: Option<&PropertyTree>,
        feature: &Feature,
    ) -> ResolvedPropertyBag {
        let effective = effective_tree(layer, override_);
        let tree_hash = self.cache.tree_hash(&effective);
        self.resolve_effective(layer, &effective, tree_hash, feature)
    }

    fn resolve_effective(
        &mut self,
        layer: &PropertyTree,
        effective: &PropertyTree,
        tree_hash: u64,
        feature: &Feature,
    ) -> ResolvedPropertyBag {
        if self.config.caching()
            && let Some(bag) = self.cache.get(tree_hash, effective, feature)
            && bag.dynamic.values().all(|b| self.binder.contains(b.key()))
        {
            #[cfg(feature = "logging")]
            log::trace!("cache hit for feature {}", feature.id());
            return bag.clone();
        }

        let mut bag = ResolvedPropertyBag::new(feature.id().clone());
        let depth = effective.depth();
        let resolved = if depth > self.config.max_depth() {
            let reason = DegradeReason::DepthExceeded {
                depth,
                max_depth: self.config.max_depth(),
            };
            #[cfg(feature = "logging")]
            log::warn!("feature {} degraded: {reason}", feature.id());
            bag.warnings.push(ResolveWarning::Degraded { reason });
            degrade(layer, self.config.max_depth())
        } else {
            let mut walk = Walk {
                feature,
                compiled: &mut self.compiled,
                warnings: &mut bag.warnings,
                field: "",
            };
            effective
                .iter()
                .filter_map(|(field, value)| {
                    walk.field = field;
                    Some((field.to_owned(), walk.value(value)?))
                })
                .collect()
        };

        let mut dynamic = Vec::new();
        for (field, value) in resolved {
            if value.is_time_dependent() {
                dynamic.push((field, value));
            } else {
                bag.fields.insert(field, value);
            }
        }
        bag.dynamic = self.sync_bindings(feature.id(), dynamic);

        if self.config.caching() {
            self.cache
                .insert(tree_hash, effective.clone(), feature.clone(), bag.clone());
        }
        bag
    }

    /// Creates, refreshes and drops the bindings of one feature so that they
    /// match `fields` exactly.
    fn sync_bindings(
        &mut self,
        feature_id: &FeatureId,
        fields: Vec<(String, PropertyValue)>,
    ) -> BTreeMap<String, DynamicBinding> {
        let mut previous = self.live.remove(feature_id).unwrap_or_default();
        let mut current = BTreeMap::new();
        for (field, value) in fields {
            let sampler = self.sampler(feature_id, &field, value);
            let refreshed = previous.remove(&field).and_then(|existing| {
                self.binder
                    .rebind(existing.key(), Arc::clone(&sampler))
                    .then(|| self.binder.get(existing.key()))
                    .flatten()
            });
            let binding = refreshed.unwrap_or_else(|| {
                self.binder
                    .bind_shared(feature_id.clone(), field.clone(), sampler)
            });
            current.insert(field, binding);
        }
        for stale in previous.values() {
            self.binder.unbind(stale.key());
        }
        if !current.is_empty() {
            self.live.insert(feature_id.clone(), current.clone());
        }
        current
    }

    fn sampler(&self, feature_id: &FeatureId, field: &str, value: PropertyValue) -> Sampler {
        let source = Arc::clone(&self.source);
        let feature_id = feature_id.clone();
        let field = field.to_owned();
        Arc::new(move || source.sample(&feature_id, &field, &value))
    }

    /// Returns the bindings currently held for `feature_id`.
    #[must_use]
    pub fn bindings_for(&self, feature_id: &FeatureId) -> Option<&BTreeMap<String, DynamicBinding>> {
        self.live.get(feature_id)
    }

    /// Drops the cached bag of `feature_id`, forcing the next pass to
    /// resolve it again. Returns `true` if a bag was cached.
    pub fn invalidate_feature(&mut self, feature_id: &FeatureId) -> bool {
        self.cache.invalidate(feature_id)
    }

    /// Drops every cached bag and compiled expression.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.compiled.clear();
    }

    /// Unbinds every binding of `feature_id` and forgets its cached bag.
    ///
    /// Call this when the feature is removed from display. Returns the number
    /// of bindings released.
    pub fn release_feature(&mut self, feature_id: &FeatureId) -> usize {
        self.cache.invalidate(feature_id);
        let Some(bindings) = self.live.remove(feature_id) else {
            return 0;
        };
        for binding in bindings.values() {
            self.binder.unbind(binding.key());
        }
        bindings.len()
    }

    /// Releases every feature, as when the layer is deleted. Returns the
    /// number of bindings released.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for (_, bindings) in self.live.drain() {
            for binding in bindings.values() {
                self.binder.unbind(binding.key());
            }
            released += bindings.len();
        }
        self.clear_cache();
        released
    }
}

fn effective_tree(layer: &PropertyTree, override_: Option<&PropertyTree>) -> PropertyTree {
    match override_ {
        Some(override_) => merge(layer, override_),
        None => layer.clone(),
    }
}

/// Fields of a degraded feature: the layer tree without expressions, or only
/// its primitive top-level fields if the layer tree is itself too deep.
fn degrade(layer: &PropertyTree, max_depth: usize) -> Vec<(String, PropertyValue)> {
    if layer.depth() > max_depth {
        return layer
            .iter()
            .filter(|(_, value)| value.is_primitive())
            .map(|(field, value)| (field.to_owned(), value.clone()))
            .collect();
    }
    layer
        .iter()
        .filter_map(|(field, value)| Some((field.to_owned(), without_expressions(value)?)))
        .collect()
}

fn without_expressions(value: &PropertyValue) -> Option<PropertyValue> {
    match value {
        PropertyValue::ExpressionRef(_) => None,
        PropertyValue::Object(o) => Some(PropertyValue::Object(
            o.iter()
                .filter_map(|(k, v)| Some((k.clone(), without_expressions(v)?)))
                .collect(),
        )),
        PropertyValue::Array(items) => Some(PropertyValue::Array(
            items
                .iter()
                .map(|v| without_expressions(v).unwrap_or_default())
                .collect(),
        )),
        other => Some(other.clone()),
    }
}

/// Recursive evaluation of one feature's effective tree.
struct Walk<'a> {
    feature: &'a Feature,
    compiled: &'a mut HashMap<ConditionsExpression, CompiledConditions>,
    warnings: &'a mut Vec<ResolveWarning>,
    field: &'a str,
}

impl Walk<'_> {
    /// Resolves `value`. `None` means an expression did not match and the
    /// slot stays unset.
    fn value(&mut self, value: &PropertyValue) -> Option<PropertyValue> {
        match value {
            PropertyValue::ExpressionRef(expression) => {
                let produced = self.expression(expression)?;
                // Literal payloads may nest further expressions.
                self.value(&produced)
            }
            PropertyValue::Object(o) => Some(PropertyValue::Object(
                o.iter()
                    .filter_map(|(k, v)| Some((k.clone(), self.value(v)?)))
                    .collect(),
            )),
            PropertyValue::Array(items) => Some(PropertyValue::Array(
                items
                    .iter()
                    .map(|v| self.value(v).unwrap_or_default())
                    .collect(),
            )),
            other => Some(other.clone()),
        }
    }

    fn expression(&mut self, expression: &Expression) -> Option<PropertyValue> {
        let conditions = match expression {
            Expression::Literal(value) => return Some((**value).clone()),
            Expression::Conditions(conditions) => conditions,
        };
        if !self.compiled.contains_key(conditions) {
            self.compiled
                .insert(conditions.clone(), CompiledConditions::compile(conditions));
        }
        let compiled = &self.compiled[conditions];
        for (branch, error) in compiled.errors() {
            self.warnings.push(ResolveWarning::SyntaxError {
                field: self.field.to_owned(),
                branch,
                error: error.clone(),
            });
        }
        match compiled.evaluate(self.feature) {
            Evaluated::Value(value) => Some(value),
            Evaluated::NoMatch => None,
        }
    }
}
