// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feature records produced by data-source loaders.

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;

use crate::value::PropertyValue;

/// A stable feature identifier.
///
/// Identifiers come from the data source and are opaque to this crate.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(String);

impl FeatureId {
    /// Creates an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One record from a data source.
///
/// Attribute values are expected to be primitives; conditions treat nested
/// objects and arrays as undefined.
///
/// # Example
///
/// ```rust
/// use understory_value::{Feature, PropertyValue};
///
/// let feature = Feature::new("building-1")
///     .with_attribute("height", 20.0)
///     .with_attribute("usage", "office");
///
/// assert_eq!(feature.id().as_str(), "building-1");
/// assert_eq!(feature.attribute("height"), Some(&PropertyValue::from(20.0)));
/// assert_eq!(feature.attribute("floors"), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    id: FeatureId,
    attributes: BTreeMap<String, PropertyValue>,
}

impl Feature {
    /// Creates a feature without attributes.
    #[must_use]
    pub fn new(id: impl Into<FeatureId>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute and returns `self`.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Returns the feature identifier.
    #[must_use]
    #[inline]
    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&PropertyValue> {
        self.attributes.get(name)
    }

    /// Returns all attributes in name order.
    #[must_use]
    #[inline]
    pub fn attributes(&self) -> &BTreeMap<String, PropertyValue> {
        &self.attributes
    }
}
