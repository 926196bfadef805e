// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The binding registry.

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;
use understory_value::{FeatureId, PropertyValue};

use crate::key::{BindingKey, KeyConfig, KeySource, OsKeySource};

/// Shared sampler closure producing the current value of a dynamic field.
pub type Sampler = Arc<dyn Fn() -> PropertyValue + Send + Sync>;

/// Handle to one registered dynamic field.
///
/// Cloning is cheap. Two handles are equal when their keys are equal.
#[derive(Clone)]
pub struct DynamicBinding {
    key: BindingKey,
    feature_id: FeatureId,
    field: String,
    sampler: Sampler,
}

impl DynamicBinding {
    /// Returns the binding key.
    #[must_use]
    #[inline]
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    /// Returns the feature this binding belongs to.
    #[must_use]
    #[inline]
    pub fn feature_id(&self) -> &FeatureId {
        &self.feature_id
    }

    /// Returns the top-level field name.
    #[must_use]
    #[inline]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Invokes the sampler this handle was created with.
    ///
    /// The handle does not follow later [`DynamicPropertyBinder::rebind`]
    /// calls; use [`DynamicPropertyBinder::sample`] to read through the
    /// registry.
    #[must_use]
    pub fn sample(&self) -> PropertyValue {
        (self.sampler)()
    }
}

impl fmt::Debug for DynamicBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBinding")
            .field("key", &self.key)
            .field("feature_id", &self.feature_id)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DynamicBinding {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DynamicBinding {}

impl core::hash::Hash for DynamicBinding {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

struct State {
    source: Box<dyn KeySource>,
    bindings: HashMap<BindingKey, DynamicBinding>,
    by_feature: HashMap<FeatureId, Vec<BindingKey>>,
    collisions: u64,
}

impl State {
    fn fresh_key(&mut self, config: &KeyConfig) -> BindingKey {
        loop {
            let key = self.source.next_key(config);
            if !self.bindings.contains_key(&key) {
                return key;
            }
            self.collisions += 1;
            #[cfg(feature = "logging")]
            log::warn!("binding key collision on {key}, regenerating");
        }
    }

    fn remove(&mut self, key: &BindingKey) -> Option<DynamicBinding> {
        let binding = self.bindings.remove(key)?;
        if let Some(keys) = self.by_feature.get_mut(&binding.feature_id) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.by_feature.remove(&binding.feature_id);
            }
        }
        Some(binding)
    }
}

/// Registry of dynamic property bindings.
///
/// Each binding ties a `(feature, field)` pair to a sampler under a random
/// [`BindingKey`]. Consumers hold on to keys and read current values with
/// [`sample`](Self::sample).
///
/// All state sits behind one mutex, so the registry can be shared across
/// threads with an `Arc`. Samplers are always invoked with the lock
/// released and may call back into the registry.
///
/// # Example
///
/// ```rust
/// use understory_binding::DynamicPropertyBinder;
/// use understory_value::{FeatureId, PropertyValue};
///
/// let binder = DynamicPropertyBinder::new();
/// let binding = binder.bind(FeatureId::new("bus-7"), "position", || PropertyValue::from(3.5));
///
/// assert_eq!(binder.sample(binding.key()), Some(PropertyValue::from(3.5)));
/// assert!(binder.unbind(binding.key()));
/// assert!(!binder.unbind(binding.key()));
/// assert_eq!(binder.sample(binding.key()), None);
/// ```
pub struct DynamicPropertyBinder {
    config: KeyConfig,
    state: Mutex<State>,
}

impl fmt::Debug for DynamicPropertyBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("DynamicPropertyBinder")
            .field("config", &self.config)
            .field("bindings", &state.bindings.len())
            .field("features", &state.by_feature.len())
            .field("collisions", &state.collisions)
            .finish_non_exhaustive()
    }
}

impl Default for DynamicPropertyBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicPropertyBinder {
    /// Creates a registry with the default [`KeyConfig`] and an
    /// [`OsKeySource`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(KeyConfig::default(), OsKeySource::new())
    }

    /// Creates a registry drawing keys of shape `config` from `source`.
    #[must_use]
    pub fn with_source(config: KeyConfig, source: impl KeySource + 'static) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                source: Box::new(source),
                bindings: HashMap::new(),
                by_feature: HashMap::new(),
                collisions: 0,
            }),
        }
    }

    // No operation leaves `State` half-updated across a panic, so a
    // poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the key configuration.
    #[must_use]
    #[inline]
    pub fn config(&self) -> &KeyConfig {
        &self.config
    }

    /// Registers `sampler` for `field` of `feature_id` under a fresh key.
    ///
    /// The key is unique among live bindings; colliding candidates are
    /// discarded and counted in [`collisions`](Self::collisions).
    pub fn bind<F>(
        &self,
        feature_id: FeatureId,
        field: impl Into<String>,
        sampler: F,
    ) -> DynamicBinding
    where
        F: Fn() -> PropertyValue + Send + Sync + 'static,
    {
        self.bind_shared(feature_id, field, Arc::new(sampler))
    }

    /// Like [`bind`](Self::bind), for an already shared sampler.
    pub fn bind_shared(
        &self,
        feature_id: FeatureId,
        field: impl Into<String>,
        sampler: Sampler,
    ) -> DynamicBinding {
        let mut state = self.lock();
        let key = state.fresh_key(&self.config);
        let binding = DynamicBinding {
            key: key.clone(),
            feature_id: feature_id.clone(),
            field: field.into(),
            sampler,
        };
        state.bindings.insert(key.clone(), binding.clone());
        state.by_feature.entry(feature_id).or_default().push(key);
        binding
    }

    /// Replaces the sampler behind `key`, keeping the key.
    ///
    /// Returns `false` if `key` is not bound.
    pub fn rebind(&self, key: &BindingKey, sampler: Sampler) -> bool {
        let mut state = self.lock();
        match state.bindings.get_mut(key) {
            Some(binding) => {
                binding.sampler = sampler;
                true
            }
            None => false,
        }
    }

    /// Removes the binding for `key`.
    ///
    /// Returns `true` if a binding was removed. Unbinding an unknown or
    /// already removed key is a no-op.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `key` could not have been issued by this
    /// registry's [`KeyConfig`].
    pub fn unbind(&self, key: &BindingKey) -> bool {
        debug_assert!(
            self.config.is_well_formed(key),
            "key {key} was not issued by this registry"
        );
        self.lock().remove(key).is_some()
    }

    /// Removes every binding of `feature_id` and returns how many there were.
    pub fn unbind_feature(&self, feature_id: &FeatureId) -> usize {
        let mut state = self.lock();
        let Some(keys) = state.by_feature.remove(feature_id) else {
            return 0;
        };
        for key in &keys {
            state.bindings.remove(key);
        }
        keys.len()
    }

    /// Returns the current value of the binding for `key`.
    ///
    /// The sampler runs after the registry lock is released.
    #[must_use]
    pub fn sample(&self, key: &BindingKey) -> Option<PropertyValue> {
        let sampler = self.lock().bindings.get(key).map(|b| b.sampler.clone())?;
        Some(sampler())
    }

    /// Returns a handle to the binding for `key`.
    #[must_use]
    pub fn get(&self, key: &BindingKey) -> Option<DynamicBinding> {
        self.lock().bindings.get(key).cloned()
    }

    /// Returns `true` if `key` is bound.
    #[must_use]
    pub fn contains(&self, key: &BindingKey) -> bool {
        self.lock().bindings.contains_key(key)
    }

    /// Returns the keys bound for `feature_id`, in binding order.
    #[must_use]
    pub fn keys_for_feature(&self, feature_id: &FeatureId) -> Vec<BindingKey> {
        self.lock()
            .by_feature
            .get(feature_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().bindings.len()
    }

    /// Returns `true` if there are no live bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().bindings.is_empty()
    }

    /// Returns how many generated keys were discarded because they collided
    /// with a live binding.
    #[must_use]
    pub fn collisions(&self) -> u64 {
        self.lock().collisions
    }
}
