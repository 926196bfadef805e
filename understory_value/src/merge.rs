// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deep merge of property trees.
//!
//! Rules, in precedence order:
//!
//! 1. A field only present in the override is copied verbatim.
//! 2. Two objects merge recursively; the override wins on conflicting leaves.
//! 3. Two arrays merge index by index. Elements at shared indices are merged
//!    with the same rules, trailing base elements are kept and trailing
//!    override elements are appended.
//! 4. Values with different tags are replaced wholesale by the override.
//! 5. A field only present in the base is carried through unchanged.
//! 6. The result is freshly allocated and shares nothing with its inputs.
//!
//! Expression references are opaque: they never merge with anything.

use alloc::vec::Vec;
use core::fmt;

use crate::tree::PropertyTree;
use crate::value::{Object, PropertyValue};

/// Location of a value inside a tree, used for diagnostics.
#[derive(Copy, Clone)]
enum Path<'a> {
    Root,
    Field(&'a Path<'a>, &'a str),
    Index(&'a Path<'a>, usize),
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("$"),
            Self::Field(parent, name) => write!(f, "{parent}.{name}"),
            Self::Index(parent, index) => write!(f, "{parent}[{index}]"),
        }
    }
}

#[cfg(feature = "logging")]
fn shape_mismatch(path: &Path<'_>, base: &PropertyValue, override_: &PropertyValue) {
    log::trace!(
        "merge shape mismatch at {path}: {} replaced by {}",
        base.kind(),
        override_.kind()
    );
}

#[cfg(not(feature = "logging"))]
#[inline(always)]
fn shape_mismatch(_path: &Path<'_>, _base: &PropertyValue, _override: &PropertyValue) {}

/// Merges `override_` on top of `base`.
///
/// Neither input is modified. Merging is total: there is no error case.
///
/// # Example
///
/// ```rust
/// use understory_value::{merge, PropertyTree, PropertyValue};
///
/// let base: PropertyTree = [("size", 4.0), ("opacity", 1.0)].into_iter().collect();
/// let layer: PropertyTree = [("size", 8.0)].into_iter().collect();
///
/// let effective = merge(&base, &layer);
/// assert_eq!(effective.get("size"), Some(&PropertyValue::from(8.0)));
/// assert_eq!(effective.get("opacity"), Some(&PropertyValue::from(1.0)));
/// ```
#[must_use]
pub fn merge(base: &PropertyTree, override_: &PropertyTree) -> PropertyTree {
    PropertyTree::from_object(merge_objects(
        base.as_object(),
        override_.as_object(),
        &Path::Root,
    ))
}

/// Merges two values with the same rules as [`merge`].
#[must_use]
pub fn merge_values(base: &PropertyValue, override_: &PropertyValue) -> PropertyValue {
    merge_at(base, override_, &Path::Root)
}

/// Folds `trees` left to right, so later trees override earlier ones.
///
/// An empty slice yields an empty tree.
#[must_use]
pub fn merge_all(trees: &[PropertyTree]) -> PropertyTree {
    match trees.split_first() {
        None => PropertyTree::new(),
        Some((first, rest)) => rest
            .iter()
            .fold(first.clone(), |acc, next| merge(&acc, next)),
    }
}

fn merge_at(base: &PropertyValue, override_: &PropertyValue, path: &Path<'_>) -> PropertyValue {
    match (base, override_) {
        (PropertyValue::Object(b), PropertyValue::Object(o)) => {
            PropertyValue::Object(merge_objects(b, o, path))
        }
        (PropertyValue::Array(b), PropertyValue::Array(o)) => {
            PropertyValue::Array(merge_arrays(b, o, path))
        }
        _ => {
            if base.kind() != override_.kind() {
                shape_mismatch(path, base, override_);
            }
            override_.clone()
        }
    }
}

fn merge_objects(base: &Object, override_: &Object, path: &Path<'_>) -> Object {
    let mut merged = Object::new();
    for (key, b) in base {
        let value = match override_.get(key) {
            Some(o) => merge_at(b, o, &Path::Field(path, key)),
            None => b.clone(),
        };
        merged.insert(key.clone(), value);
    }
    for (key, o) in override_ {
        if !base.contains_key(key) {
            merged.insert(key.clone(), o.clone());
        }
    }
    merged
}

fn merge_arrays(
    base: &[PropertyValue],
    override_: &[PropertyValue],
    path: &Path<'_>,
) -> Vec<PropertyValue> {
    let shared = base.len().min(override_.len());
    let mut merged = Vec::with_capacity(base.len().max(override_.len()));
    merged.extend(
        base.iter()
            .zip(override_)
            .enumerate()
            .map(|(i, (b, o))| merge_at(b, o, &Path::Index(path, i))),
    );
    merged.extend(base[shared..].iter().cloned());
    merged.extend(override_[shared..].iter().cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Expression;
    use alloc::format;
    use alloc::string::ToString;
    use alloc::vec;

    fn obj<const N: usize>(fields: [(&str, PropertyValue); N]) -> PropertyValue {
        PropertyValue::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn tree<const N: usize>(fields: [(&str, PropertyValue); N]) -> PropertyTree {
        fields.into_iter().collect()
    }

    fn num(n: f64) -> PropertyValue {
        PropertyValue::from(n)
    }

    #[test]
    fn disjoint_fields_union() {
        let a = tree([("x", num(1.0)), ("y", "a".into())]);
        let b = tree([("z", true.into())]);
        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("x"), Some(&num(1.0)));
        assert_eq!(merged.get("y"), Some(&PropertyValue::from("a")));
        assert_eq!(merged.get("z"), Some(&PropertyValue::from(true)));
    }

    #[test]
    fn inputs_are_not_modified() {
        let a = tree([("x", obj([("y", num(1.0))]))]);
        let b = tree([("x", obj([("z", num(2.0))]))]);
        let (a_before, b_before) = (a.clone(), b.clone());
        let _ = merge(&a, &b);
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn objects_merge_recursively() {
        let a = tree([("a", obj([("b", obj([("lat", num(0.0)), ("lng", num(1.0))]))]))]);
        let b = tree([("a", obj([("b", obj([("lat", num(1.0))]))]))]);
        let merged = merge(&a, &b);
        assert_eq!(
            merged.get("a"),
            Some(&obj([("b", obj([("lat", num(1.0)), ("lng", num(1.0))]))]))
        );
    }

    #[test]
    fn array_index_aligned() {
        let a = tree([(
            "c",
            PropertyValue::Array(vec![obj([("d", num(1.0))]), obj([("d", num(2.0))])]),
        )]);
        let b = tree([("c", PropertyValue::Array(vec![obj([("d", num(3.0))])]))]);
        assert_eq!(
            merge(&a, &b).get("c"),
            Some(&PropertyValue::Array(vec![
                obj([("d", num(3.0))]),
                obj([("d", num(2.0))])
            ]))
        );
    }

    #[test]
    fn array_elements_merge_field_by_field() {
        let a = PropertyValue::Array(vec![obj([("d", num(1.0)), ("e", num(5.0))])]);
        let b = PropertyValue::Array(vec![obj([("d", num(3.0))])]);
        assert_eq!(
            merge_values(&a, &b),
            PropertyValue::Array(vec![obj([("d", num(3.0)), ("e", num(5.0))])])
        );
    }

    #[test]
    fn longer_override_array_appends() {
        let a = PropertyValue::Array(vec![num(1.0)]);
        let b = PropertyValue::Array(vec![num(7.0), num(8.0), num(9.0)]);
        assert_eq!(
            merge_values(&a, &b),
            PropertyValue::Array(vec![num(7.0), num(8.0), num(9.0)])
        );
    }

    #[test]
    fn array_length_is_max_of_inputs() {
        // Exhaustive over small lengths: scalars at shared indices come from
        // the override, the tail comes from whichever side is longer.
        for base_len in 0..5_u32 {
            for override_len in 0..5_u32 {
                let base: Vec<_> = (0..base_len).map(|i| num(f64::from(i))).collect();
                let over: Vec<_> = (0..override_len)
                    .map(|i| num(100.0 + f64::from(i)))
                    .collect();
                let merged = merge_values(
                    &PropertyValue::Array(base.clone()),
                    &PropertyValue::Array(over.clone()),
                );
                let merged = merged.as_array().unwrap();
                assert_eq!(merged.len(), base_len.max(override_len) as usize);
                for (i, value) in merged.iter().enumerate() {
                    let expected = over.get(i).or_else(|| base.get(i)).unwrap();
                    assert_eq!(value, expected, "index {i} of {base_len}/{override_len}");
                }
            }
        }
    }

    #[test]
    fn scalar_replaces_object() {
        let a = tree([("a", obj([("b", num(1.0))]))]);
        let b = tree([("a", "x".into())]);
        assert_eq!(merge(&a, &b), tree([("a", "x".into())]));
    }

    #[test]
    fn object_replaces_array() {
        let a = tree([("a", PropertyValue::Array(vec![num(1.0)]))]);
        let b = tree([("a", obj([("k", num(2.0))]))]);
        assert_eq!(merge(&a, &b).get("a"), Some(&obj([("k", num(2.0))])));
    }

    #[test]
    fn null_override_replaces() {
        let a = tree([("a", num(1.0))]);
        let b = tree([("a", PropertyValue::Null)]);
        assert_eq!(merge(&a, &b).get("a"), Some(&PropertyValue::Null));
    }

    #[test]
    fn expressions_are_opaque() {
        let expr = PropertyValue::from(Expression::literal("red"));
        let a = tree([("color", obj([("r", num(1.0))]))]);
        let b = tree([("color", expr.clone())]);
        assert_eq!(merge(&a, &b).get("color"), Some(&expr));
        assert_eq!(merge(&b, &a).get("color"), Some(&obj([("r", num(1.0))])));
    }

    #[test]
    fn authoring_scenario() {
        let base = tree([
            ("a", obj([("b", obj([("lat", num(0.0)), ("lng", num(1.0))]))])),
            (
                "c",
                PropertyValue::Array(vec![obj([("d", num(1.0))]), obj([("d", num(2.0))])]),
            ),
            ("d", num(1.0)),
        ]);
        let over = tree([
            ("a", obj([("b", obj([("lat", num(1.0))]))])),
            ("c", PropertyValue::Array(vec![obj([("d", num(3.0))])])),
        ]);
        let expected = tree([
            ("a", obj([("b", obj([("lat", num(1.0)), ("lng", num(1.0))]))])),
            (
                "c",
                PropertyValue::Array(vec![obj([("d", num(3.0))]), obj([("d", num(2.0))])]),
            ),
            ("d", num(1.0)),
        ]);
        let merged = merge(&base, &over);
        assert_eq!(merged, expected);
        assert!(!core::ptr::eq(&merged, &base));
        assert!(!core::ptr::eq(&merged, &over));
    }

    #[test]
    fn merge_all_folds_in_order() {
        let trees = [
            tree([("a", num(1.0)), ("b", num(1.0))]),
            tree([("a", num(2.0))]),
            tree([("a", num(3.0)), ("c", num(3.0))]),
        ];
        assert_eq!(
            merge_all(&trees),
            tree([("a", num(3.0)), ("b", num(1.0)), ("c", num(3.0))])
        );
        assert!(merge_all(&[]).is_empty());
    }

    #[test]
    fn path_display() {
        let root = Path::Root;
        let field = Path::Field(&root, "c");
        let index = Path::Index(&field, 1);
        assert_eq!(format!("{}", Path::Field(&index, "d")), "$.c[1].d");
    }
}
