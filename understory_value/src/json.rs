// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Authoring JSON import and export.
//!
//! Property trees are authored as plain JSON. Scalars, objects and arrays map
//! one-to-one onto [`PropertyValue`]. An object whose only key is
//! `"expression"` becomes a [`PropertyValue::ExpressionRef`]:
//!
//! ```json
//! { "expression": "red" }
//! { "expression": { "conditions": [["${feature.property.height} > 10", "tall"], ["true", "short"]] } }
//! ```
//!
//! A scalar payload is a literal expression. A `conditions` payload is a list
//! of `[condition, result]` string pairs; malformed pairs are skipped.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_json::{Map, Number, Value};

use crate::expression::{ConditionsExpression, Expression};
use crate::tree::PropertyTree;
use crate::value::{Object, PropertyValue};

const EXPRESSION_KEY: &str = "expression";
const CONDITIONS_KEY: &str = "conditions";

/// Error returned when authoring JSON cannot form a [`PropertyTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JsonError {
    /// The top-level JSON value is not an object.
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { found } => {
                write!(f, "property tree must be a JSON object, found {found}")
            }
        }
    }
}

impl core::error::Error for JsonError {}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl PropertyValue {
    /// Converts authoring JSON into a property value.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use understory_value::{Expression, PropertyValue};
    ///
    /// let value = PropertyValue::from_json(&json!({
    ///     "expression": { "conditions": [["true", "red"]] }
    /// }));
    /// assert_eq!(value, PropertyValue::from(Expression::conditions([("true", "red")])));
    /// ```
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                if map.len() == 1
                    && let Some(payload) = map.get(EXPRESSION_KEY)
                    && let Some(expression) = expression_from_json(payload)
                {
                    return Self::ExpressionRef(expression);
                }
                Self::Object(object_from_json(map))
            }
        }
    }

    /// Converts this value back into authoring JSON.
    ///
    /// Non-finite numbers have no JSON spelling and become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Object(o) => Value::Object(object_to_json(o)),
            Self::Array(a) => Value::Array(a.iter().map(Self::to_json).collect()),
            Self::ExpressionRef(e) => {
                let mut map = Map::new();
                map.insert(EXPRESSION_KEY.into(), expression_to_json(e));
                Value::Object(map)
            }
        }
    }
}

impl PropertyTree {
    /// Converts an authoring JSON object into a property tree.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::NotAnObject`] if `value` is not a JSON object.
    pub fn from_json(value: &Value) -> Result<Self, JsonError> {
        match value {
            Value::Object(map) => Ok(Self::from_object(object_from_json(map))),
            other => Err(JsonError::NotAnObject {
                found: json_type(other),
            }),
        }
    }

    /// Converts this tree back into an authoring JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(object_to_json(self.as_object()))
    }
}

fn object_from_json(map: &Map<String, Value>) -> Object {
    map.iter()
        .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
        .collect()
}

fn object_to_json(object: &Object) -> Map<String, Value> {
    object.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

fn expression_from_json(payload: &Value) -> Option<Expression> {
    match payload {
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Some(Expression::literal(PropertyValue::from_json(payload)))
        }
        Value::Object(map) => {
            let branches = map.get(CONDITIONS_KEY)?.as_array()?;
            Some(Expression::Conditions(conditions_from_json(branches)))
        }
        Value::Null | Value::Array(_) => None,
    }
}

fn conditions_from_json(branches: &[Value]) -> ConditionsExpression {
    let mut conditions = ConditionsExpression::new();
    for (index, branch) in branches.iter().enumerate() {
        let pair = branch.as_array().filter(|pair| pair.len() == 2);
        let Some([condition, result]) = pair.map(Vec::as_slice) else {
            skipped_branch(index, branch);
            continue;
        };
        match (condition.as_str(), json_result_text(result)) {
            (Some(condition), Some(result)) => conditions.push(condition, result),
            _ => skipped_branch(index, branch),
        }
    }
    conditions
}

/// Results are strings, but authoring tools sometimes emit bare numbers and
/// booleans. Those are kept as their JSON text so coercion restores them.
fn json_result_text(result: &Value) -> Option<String> {
    match result {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(alloc::format!("{n}")),
        Value::Bool(b) => Some(alloc::format!("{b}")),
        _ => None,
    }
}

#[cfg(feature = "logging")]
fn skipped_branch(index: usize, branch: &Value) {
    log::debug!("skipping malformed condition branch {index}: {branch}");
}

#[cfg(not(feature = "logging"))]
#[inline(always)]
fn skipped_branch(_index: usize, _branch: &Value) {}

fn expression_to_json(expression: &Expression) -> Value {
    match expression {
        Expression::Literal(value) => value.to_json(),
        Expression::Conditions(conditions) => {
            let branches = conditions
                .branches()
                .iter()
                .map(|b| {
                    Value::Array(alloc::vec![
                        Value::String(b.condition.clone()),
                        Value::String(b.result.clone()),
                    ])
                })
                .collect();
            let mut map = Map::new();
            map.insert(CONDITIONS_KEY.into(), Value::Array(branches));
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_and_containers() {
        let value = PropertyValue::from_json(&json!({
            "a": null, "b": true, "c": 1.5, "d": "x", "e": [1, 2]
        }));
        let object = value.as_object().unwrap();
        assert_eq!(object["a"], PropertyValue::Null);
        assert_eq!(object["b"], PropertyValue::from(true));
        assert_eq!(object["c"], PropertyValue::from(1.5));
        assert_eq!(object["d"], PropertyValue::from("x"));
        assert_eq!(
            object["e"],
            PropertyValue::Array(alloc::vec![PropertyValue::from(1), PropertyValue::from(2)])
        );
    }

    #[test]
    fn literal_expression() {
        let value = PropertyValue::from_json(&json!({ "expression": "red" }));
        assert_eq!(value, PropertyValue::from(Expression::literal("red")));
    }

    #[test]
    fn conditions_expression_skips_malformed_pairs() {
        let value = PropertyValue::from_json(&json!({
            "expression": { "conditions": [
                ["${feature.property.height} > 10", "tall"],
                ["only one"],
                [1, "bad condition"],
                ["true", 3]
            ]}
        }));
        let expected = Expression::conditions([
            ("${feature.property.height} > 10", "tall"),
            ("true", "3"),
        ]);
        assert_eq!(value, PropertyValue::from(expected));
    }

    #[test]
    fn expression_key_with_siblings_is_plain_object() {
        let value = PropertyValue::from_json(&json!({ "expression": "red", "other": 1 }));
        assert_eq!(value.as_object().map(Object::len), Some(2));
    }

    #[test]
    fn unrecognized_expression_payload_is_plain_object() {
        let value = PropertyValue::from_json(&json!({ "expression": [1] }));
        assert!(value.as_object().is_some());
    }

    #[test]
    fn tree_requires_object() {
        assert_eq!(
            PropertyTree::from_json(&json!([1])),
            Err(JsonError::NotAnObject { found: "array" })
        );
    }

    #[test]
    fn export_round_trips_authoring_shape() {
        let source = json!({
            "color": { "expression": { "conditions": [["true", "red"]] } },
            "size": 4.0,
            "label": { "expression": "x" }
        });
        let tree = PropertyTree::from_json(&source).unwrap();
        assert_eq!(tree.to_json(), source);
    }

    #[test]
    fn non_finite_numbers_export_as_null() {
        assert_eq!(PropertyValue::from(f64::NAN).to_json(), Value::Null);
    }

    #[test]
    fn error_display() {
        let err = JsonError::NotAnObject { found: "string" };
        assert_eq!(
            alloc::format!("{err}"),
            "property tree must be a JSON object, found string"
        );
    }
}
