// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tagged property values.
//!
//! This module provides [`PropertyValue`], the tagged union shared by the
//! merger, the expression evaluator and the resolution pipeline. All logic
//! downstream dispatches on the tag returned by [`PropertyValue::kind`].

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::expression::Expression;

/// An ordered mapping from field name to value.
///
/// Keys are kept sorted so iteration, hashing and output are deterministic.
pub type Object = BTreeMap<String, PropertyValue>;

/// Reserved object key flagging a value as time-dependent.
///
/// An [`Object`] value carrying this key set to `true` is re-sampled on every
/// render tick instead of being resolved once. See
/// [`PropertyValue::is_time_dependent`].
pub const TIME_DEPENDENT_KEY: &str = "timeDependent";

/// The tag of a [`PropertyValue`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    /// [`PropertyValue::Null`].
    Null,
    /// [`PropertyValue::Bool`].
    Bool,
    /// [`PropertyValue::Number`].
    Number,
    /// [`PropertyValue::String`].
    String,
    /// [`PropertyValue::Object`].
    Object,
    /// [`PropertyValue::Array`].
    Array,
    /// [`PropertyValue::ExpressionRef`].
    ExpressionRef,
}

impl ValueKind {
    /// Returns a lowercase name for the tag, suitable for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
            Self::ExpressionRef => "expression",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A property value.
///
/// A value's tag never changes after construction. Merging replaces a value
/// wholesale when tags differ rather than converting it.
///
/// # Example
///
/// ```rust
/// use understory_value::{PropertyValue, ValueKind};
///
/// let height = PropertyValue::from(12.5);
/// assert_eq!(height.kind(), ValueKind::Number);
/// assert_eq!(height.as_f64(), Some(12.5));
///
/// let label = PropertyValue::from("tower");
/// assert_eq!(label.to_string(), "tower");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PropertyValue {
    /// An explicit null.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. All numbers are stored as `f64`.
    Number(f64),
    /// A string.
    String(String),
    /// A nested mapping.
    Object(Object),
    /// An ordered sequence.
    Array(Vec<PropertyValue>),
    /// A value that depends on a feature and is resolved at evaluation time.
    ExpressionRef(Expression),
}

impl PropertyValue {
    /// Returns the tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Object(_) => ValueKind::Object,
            Self::Array(_) => ValueKind::Array,
            Self::ExpressionRef(_) => ValueKind::ExpressionRef,
        }
    }

    /// Returns `true` if this is [`PropertyValue::Null`].
    #[must_use]
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for null, bool, number and string values.
    #[must_use]
    #[inline]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_)
        )
    }

    /// Returns the boolean, if this is a bool.
    #[must_use]
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number, if this is a number.
    #[must_use]
    #[inline]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the mapping, if this is an object.
    #[must_use]
    #[inline]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    #[must_use]
    #[inline]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the expression, if this is an expression reference.
    #[must_use]
    #[inline]
    pub const fn as_expression(&self) -> Option<&Expression> {
        match self {
            Self::ExpressionRef(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if a [`PropertyValue::ExpressionRef`] appears anywhere
    /// in this value, including nested objects and arrays.
    #[must_use]
    pub fn contains_expression(&self) -> bool {
        match self {
            Self::ExpressionRef(_) => true,
            Self::Object(o) => o.values().any(Self::contains_expression),
            Self::Array(a) => a.iter().any(Self::contains_expression),
            _ => false,
        }
    }

    /// Returns the nesting depth of this value.
    ///
    /// Primitives and expression references have depth 0; an object or array
    /// is one deeper than its deepest child.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Object(o) => 1 + o.values().map(Self::depth).max().unwrap_or(0),
            Self::Array(a) => 1 + a.iter().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Returns `true` if this value carries the [`TIME_DEPENDENT_KEY`] marker.
    ///
    /// ```rust
    /// use understory_value::{Object, PropertyValue, TIME_DEPENDENT_KEY};
    ///
    /// let mut color = Object::new();
    /// color.insert(TIME_DEPENDENT_KEY.into(), true.into());
    /// color.insert("start".into(), "#ff0000".into());
    ///
    /// let value = PropertyValue::Object(color);
    /// assert!(value.is_time_dependent());
    /// assert!(!value.strip_time_marker().is_time_dependent());
    /// ```
    #[must_use]
    pub fn is_time_dependent(&self) -> bool {
        self.as_object()
            .and_then(|o| o.get(TIME_DEPENDENT_KEY))
            .is_some_and(|marker| matches!(marker, Self::Bool(true)))
    }

    /// Returns a copy of this value without the time-dependence marker.
    ///
    /// Values without the marker are returned unchanged.
    #[must_use]
    pub fn strip_time_marker(&self) -> Self {
        match self {
            Self::Object(o) if o.contains_key(TIME_DEPENDENT_KEY) => Self::Object(
                o.iter()
                    .filter(|(key, _)| key.as_str() != TIME_DEPENDENT_KEY)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Canonical bit pattern for hashing numbers.
///
/// `0.0` and `-0.0` compare equal and must hash equal. All NaNs share one
/// pattern.
fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Number(n) => number_bits(*n).hash(state),
            Self::String(s) => s.hash(state),
            Self::Object(o) => {
                o.len().hash(state);
                for (key, value) in o {
                    key.hash(state);
                    value.hash(state);
                }
            }
            Self::Array(a) => a.hash(state),
            Self::ExpressionRef(e) => e.hash(state),
        }
    }
}

/// Writes a number the way a condition result would spell it.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else {
        // `f64` Display never uses exponents and drops a zero fraction.
        write!(f, "{n}")
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn write_nested(f: &mut fmt::Formatter<'_>, value: &PropertyValue) -> fmt::Result {
    match value {
        PropertyValue::String(s) => write_quoted(f, s),
        other => fmt::Display::fmt(other, f),
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(f, *n),
            Self::String(s) => f.write_str(s),
            Self::Object(o) => {
                f.write_str("{")?;
                for (i, (key, value)) in o.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_quoted(f, key)?;
                    f.write_str(":")?;
                    write_nested(f, value)?;
                }
                f.write_str("}")
            }
            Self::Array(a) => {
                f.write_str("[")?;
                for (i, value) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_nested(f, value)?;
                }
                f.write_str("]")
            }
            Self::ExpressionRef(_) => f.write_str("<expression>"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Object> for PropertyValue {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Self>> for PropertyValue {
    fn from(value: Vec<Self>) -> Self {
        Self::Array(value)
    }
}

impl From<Expression> for PropertyValue {
    fn from(value: Expression) -> Self {
        Self::ExpressionRef(value)
    }
}

impl<T: Into<Self>> FromIterator<T> for PropertyValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::Array(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ConditionsExpression;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::BuildHasher;

    fn hash_of(value: &PropertyValue) -> u64 {
        // Fixed-key hasher so the test is reproducible.
        struct Fnv(u64);
        impl Hasher for Fnv {
            fn finish(&self) -> u64 {
                self.0
            }
            fn write(&mut self, bytes: &[u8]) {
                for b in bytes {
                    self.0 ^= u64::from(*b);
                    self.0 = self.0.wrapping_mul(0x100_0000_01b3);
                }
            }
        }
        struct BuildFnv;
        impl BuildHasher for BuildFnv {
            type Hasher = Fnv;
            fn build_hasher(&self) -> Fnv {
                Fnv(0xcbf2_9ce4_8422_2325)
            }
        }
        BuildFnv.hash_one(value)
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(PropertyValue::Null.kind(), ValueKind::Null);
        assert_eq!(PropertyValue::from(true).kind(), ValueKind::Bool);
        assert_eq!(PropertyValue::from(1.0).kind(), ValueKind::Number);
        assert_eq!(PropertyValue::from("x").kind(), ValueKind::String);
        assert_eq!(PropertyValue::from(Object::new()).kind(), ValueKind::Object);
        assert_eq!(PropertyValue::Array(vec![]).kind(), ValueKind::Array);
        let expr = Expression::Conditions(ConditionsExpression::new());
        assert_eq!(PropertyValue::from(expr).kind(), ValueKind::ExpressionRef);
    }

    #[test]
    fn accessors_reject_other_tags() {
        let value = PropertyValue::from("10");
        assert_eq!(value.as_str(), Some("10"));
        assert_eq!(value.as_f64(), None);
        assert_eq!(value.as_bool(), None);
        assert!(value.as_object().is_none());
        assert!(value.is_primitive());
    }

    #[test]
    fn display_numbers() {
        assert_eq!(PropertyValue::from(20.0).to_string(), "20");
        assert_eq!(PropertyValue::from(-0.0).to_string(), "0");
        assert_eq!(PropertyValue::from(1.5).to_string(), "1.5");
        assert_eq!(PropertyValue::from(f64::NAN).to_string(), "NaN");
        assert_eq!(PropertyValue::from(f64::INFINITY).to_string(), "Infinity");
    }

    #[test]
    fn display_nested() {
        let mut o = Object::new();
        o.insert(
            "b".into(),
            PropertyValue::Array(vec![PropertyValue::from("x"), PropertyValue::from(1)]),
        );
        o.insert("a".into(), PropertyValue::Null);
        assert_eq!(
            PropertyValue::Object(o).to_string(),
            r#"{"a":null,"b":["x",1]}"#
        );
    }

    #[test]
    fn hash_treats_signed_zero_as_equal() {
        assert_eq!(
            hash_of(&PropertyValue::from(0.0)),
            hash_of(&PropertyValue::from(-0.0))
        );
        assert_ne!(
            hash_of(&PropertyValue::from(1.0)),
            hash_of(&PropertyValue::from("1"))
        );
    }

    #[test]
    fn contains_expression_walks_nested_values() {
        let expr = Expression::literal(1.0);
        let mut inner = Object::new();
        inner.insert("x".into(), PropertyValue::Array(vec![expr.into()]));
        let value = PropertyValue::Object(inner);
        assert!(value.contains_expression());
        assert!(!PropertyValue::Array(vec![PropertyValue::from(1)]).contains_expression());
    }

    #[test]
    fn depth_counts_containers() {
        assert_eq!(PropertyValue::from(1.0).depth(), 0);
        assert_eq!(PropertyValue::Array(vec![]).depth(), 1);
        let nested = PropertyValue::Array(vec![PropertyValue::Array(vec![PropertyValue::from(1)])]);
        assert_eq!(nested.depth(), 2);
    }

    #[test]
    fn time_marker_requires_true() {
        let mut o = Object::new();
        o.insert(TIME_DEPENDENT_KEY.into(), false.into());
        assert!(!PropertyValue::Object(o.clone()).is_time_dependent());

        o.insert(TIME_DEPENDENT_KEY.into(), true.into());
        o.insert("value".into(), 3.into());
        let value = PropertyValue::Object(o);
        assert!(value.is_time_dependent());

        let stripped = value.strip_time_marker();
        assert_eq!(stripped.as_object().unwrap().len(), 1);
        assert_eq!(stripped.as_object().unwrap()["value"], PropertyValue::from(3));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ValueKind::ExpressionRef.to_string(), "expression");
    }
}
