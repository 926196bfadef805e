// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline configuration.

/// Default for [`PipelineConfig::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default for [`PipelineConfig::cache_capacity`].
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Tuning knobs of a [`ResolutionPipeline`](crate::ResolutionPipeline).
///
/// ```rust
/// use understory_resolve::PipelineConfig;
///
/// let config = PipelineConfig::builder().max_depth(16).cache_capacity(0).build();
/// assert_eq!(config.max_depth(), 16);
/// assert!(!config.caching());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    max_depth: usize,
    cache_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Deepest effective tree resolved normally; the root counts as one.
    ///
    /// Deeper trees degrade to the layer tree alone.
    #[must_use]
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Maximum number of cached bags.
    #[must_use]
    #[inline]
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Returns `true` if resolved bags are cached.
    #[must_use]
    #[inline]
    pub fn caching(&self) -> bool {
        self.cache_capacity > 0
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Clone, Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Sets [`PipelineConfig::max_depth`]. Values below one are raised to one.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth.max(1);
        self
    }

    /// Sets [`PipelineConfig::cache_capacity`]; `0` disables caching.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
