// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sampling of time-dependent values.

use understory_value::{FeatureId, PropertyValue};

/// Produces the current value of a time-dependent field.
///
/// The pipeline wraps every time-dependent top-level field in a sampler that
/// calls [`sample`](Self::sample) with the field's resolved (marked) value.
/// Implementations typically interpolate the value against a clock owned by
/// the host.
pub trait SampleSource: Send + Sync {
    /// Returns the value of `field` of `feature` right now.
    fn sample(&self, feature: &FeatureId, field: &str, value: &PropertyValue) -> PropertyValue;
}

/// A [`SampleSource`] that ignores time and returns the value without its
/// time-dependence marker.
#[derive(Copy, Clone, Debug, Default)]
pub struct StaticSampleSource;

impl SampleSource for StaticSampleSource {
    fn sample(&self, _feature: &FeatureId, _field: &str, value: &PropertyValue) -> PropertyValue {
        value.strip_time_marker()
    }
}

impl<F> SampleSource for F
where
    F: Fn(&FeatureId, &str, &PropertyValue) -> PropertyValue + Send + Sync,
{
    fn sample(&self, feature: &FeatureId, field: &str, value: &PropertyValue) -> PropertyValue {
        self(feature, field, value)
    }
}
