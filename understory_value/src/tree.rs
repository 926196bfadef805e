// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property trees.
//!
//! A [`PropertyTree`] is the root mapping of a layer's (or a feature's)
//! declared properties. It is a thin wrapper over [`Object`] so that the
//! root can never be anything other than a mapping.

use alloc::string::String;

use crate::value::{Object, PropertyValue};

/// A named mapping from field name to [`PropertyValue`].
///
/// # Example
///
/// ```rust
/// use understory_value::{PropertyTree, PropertyValue};
///
/// let mut tree = PropertyTree::new();
/// tree.insert("color", "#ffffff");
/// tree.insert("size", 4.0);
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree.get("size"), Some(&PropertyValue::from(4.0)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Hash)]
pub struct PropertyTree {
    fields: Object,
}

impl PropertyTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing mapping.
    #[must_use]
    pub fn from_object(fields: Object) -> Self {
        Self { fields }
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&PropertyValue> {
        self.fields.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<PropertyValue> {
        self.fields.remove(field)
    }

    /// Returns `true` if the field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns the number of top-level fields.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the tree has no fields.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the underlying mapping.
    #[must_use]
    #[inline]
    pub fn as_object(&self) -> &Object {
        &self.fields
    }

    /// Converts the tree into a [`PropertyValue::Object`].
    #[must_use]
    pub fn into_value(self) -> PropertyValue {
        PropertyValue::Object(self.fields)
    }

    /// Returns the nesting depth of the tree, counting the root as 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.fields.values().map(PropertyValue::depth).max().unwrap_or(0)
    }

    /// Returns `true` if any field still holds an expression.
    #[must_use]
    pub fn contains_expression(&self) -> bool {
        self.fields.values().any(PropertyValue::contains_expression)
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<Object> for PropertyTree {
    fn from(fields: Object) -> Self {
        Self { fields }
    }
}
