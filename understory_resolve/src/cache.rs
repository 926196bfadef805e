// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache of resolved bags keyed by feature and effective-tree hash.

use core::fmt;
use core::hash::BuildHasher;
use std::collections::VecDeque;

use hashbrown::{DefaultHashBuilder, HashMap};
use understory_value::{Feature, FeatureId, PropertyTree};

use crate::bag::ResolvedPropertyBag;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    feature: FeatureId,
    tree_hash: u64,
}

#[derive(Debug)]
struct Entry {
    tree: PropertyTree,
    feature: Feature,
    bag: ResolvedPropertyBag,
}

/// Bounded FIFO cache. One entry per feature at most.
pub(crate) struct BagCache {
    capacity: usize,
    hasher: DefaultHashBuilder,
    entries: HashMap<CacheKey, Entry>,
    // Current key of each cached feature.
    latest: HashMap<FeatureId, u64>,
    order: VecDeque<CacheKey>,
}

impl fmt::Debug for BagCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BagCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.entries.len())
            .field("order", &self.order.len())
            .finish_non_exhaustive()
    }
}

impl BagCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            hasher: DefaultHashBuilder::default(),
            entries: HashMap::new(),
            latest: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub(crate) fn tree_hash(&self, tree: &PropertyTree) -> u64 {
        self.hasher.hash_one(tree)
    }

    /// Returns the cached bag if both the effective tree and the feature are
    /// exactly the ones it was resolved from.
    pub(crate) fn get(
        &self,
        tree_hash: u64,
        tree: &PropertyTree,
        feature: &Feature,
    ) -> Option<&ResolvedPropertyBag> {
        let key = CacheKey {
            feature: feature.id().clone(),
            tree_hash,
        };
        let entry = self.entries.get(&key)?;
        (entry.tree == *tree && entry.feature == *feature).then_some(&entry.bag)
    }

    pub(crate) fn insert(
        &mut self,
        tree_hash: u64,
        tree: PropertyTree,
        feature: Feature,
        bag: ResolvedPropertyBag,
    ) {
        if self.capacity == 0 {
            return;
        }
        let id = feature.id().clone();
        self.invalidate(&id);
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.entries.remove(&oldest).is_some() {
                self.latest.remove(&oldest.feature);
                #[cfg(feature = "logging")]
                log::trace!("evicted cached bag of feature {}", oldest.feature);
            }
        }
        let key = CacheKey {
            feature: id.clone(),
            tree_hash,
        };
        self.latest.insert(id, tree_hash);
        self.order.push_back(key.clone());
        self.entries.insert(key, Entry { tree, feature, bag });
        // Invalidation leaves stale keys in `order`; drop them once they
        // dominate.
        if self.order.len() > self.capacity.saturating_mul(2) {
            let entries = &self.entries;
            self.order.retain(|k| entries.contains_key(k));
        }
    }

    /// Drops the entry of `feature`. Returns `true` if there was one.
    pub(crate) fn invalidate(&mut self, feature: &FeatureId) -> bool {
        let Some(tree_hash) = self.latest.remove(feature) else {
            return false;
        };
        let key = CacheKey {
            feature: feature.clone(),
            tree_hash,
        };
        self.entries.remove(&key).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.latest.clear();
        self.order.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cache: &mut BagCache, id: &str, width: f64) -> (u64, PropertyTree, Feature) {
        let tree: PropertyTree = [("width", width)].into_iter().collect();
        let feature = Feature::new(id);
        let hash = cache.tree_hash(&tree);
        let mut bag = ResolvedPropertyBag::new(feature.id().clone());
        bag.fields = tree.as_object().clone();
        cache.insert(hash, tree.clone(), feature.clone(), bag);
        (hash, tree, feature)
    }

    #[test]
    fn hit_requires_exact_inputs() {
        let mut cache = BagCache::new(8);
        let (hash, tree, feature) = entry(&mut cache, "a", 1.0);
        assert!(cache.get(hash, &tree, &feature).is_some());

        let changed = feature.clone().with_attribute("k", 1.0);
        assert!(cache.get(hash, &tree, &changed).is_none());

        let other: PropertyTree = [("width", 2.0)].into_iter().collect();
        assert!(cache.get(hash, &other, &feature).is_none());
    }

    #[test]
    fn one_entry_per_feature() {
        let mut cache = BagCache::new(8);
        entry(&mut cache, "a", 1.0);
        let (hash, tree, feature) = entry(&mut cache, "a", 2.0);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(hash, &tree, &feature).is_some());
    }

    #[test]
    fn fifo_eviction() {
        let mut cache = BagCache::new(2);
        let (ha, ta, fa) = entry(&mut cache, "a", 1.0);
        entry(&mut cache, "b", 1.0);
        entry(&mut cache, "c", 1.0);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(ha, &ta, &fa).is_none());
        assert!(!cache.invalidate(&FeatureId::new("a")));
        assert!(cache.invalidate(&FeatureId::new("b")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = BagCache::new(0);
        let (hash, tree, feature) = entry(&mut cache, "a", 1.0);
        assert!(cache.get(hash, &tree, &feature).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn stale_order_keys_are_compacted() {
        let mut cache = BagCache::new(2);
        for i in 0..20 {
            entry(&mut cache, "a", f64::from(i));
        }
        assert_eq!(cache.len(), 1);
        assert!(cache.order.len() <= 4);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
