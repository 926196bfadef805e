// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Result templates.
//!
//! A branch result is text with optional `${feature.property.<name>}`
//! placeholders. Placeholders are located once at compile time; rendering
//! only looks attributes up and concatenates.

use alloc::string::String;
use core::fmt::Write as _;

use smallvec::SmallVec;
use understory_value::{Feature, PropertyValue};

use crate::coerce::coerce_text;
use crate::lexer::attribute_name;

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Text(String),
    Attribute(String),
}

/// A branch result with its placeholders resolved to attribute names.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultTemplate {
    segments: SmallVec<[Segment; 2]>,
}

impl ResultTemplate {
    /// Splits `source` into literal text and attribute placeholders.
    ///
    /// Placeholders that are not attribute references (wrong prefix, empty
    /// name, or no closing brace) are kept as literal text.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut segments = SmallVec::new();
        let mut text = String::new();
        let mut rest = source;
        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                break;
            };
            match attribute_name(&after[..end]) {
                Some(name) => {
                    text.push_str(&rest[..start]);
                    if !text.is_empty() {
                        segments.push(Segment::Text(core::mem::take(&mut text)));
                    }
                    segments.push(Segment::Attribute(name.into()));
                }
                None => text.push_str(&rest[..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Self { segments }
    }

    /// Returns `true` if the template contains at least one placeholder.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Attribute(_)))
    }

    /// Substitutes attributes from `feature` and coerces the result.
    ///
    /// A template that is exactly one placeholder yields the attribute's
    /// value; string attributes are still coerced. Missing attributes render
    /// as the empty string, and so do objects, arrays and expressions, which
    /// are not valid attribute values.
    #[must_use]
    pub fn render(&self, feature: &Feature) -> PropertyValue {
        if let [Segment::Attribute(name)] = self.segments.as_slice() {
            return match primitive(feature, name) {
                Some(PropertyValue::String(s)) => coerce_text(s),
                Some(value) => value.clone(),
                None => coerce_text(""),
            };
        }
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Attribute(name) => {
                    if let Some(value) = primitive(feature, name) {
                        // Writing to a `String` cannot fail.
                        let _ = write!(out, "{value}");
                    }
                }
            }
        }
        coerce_text(&out)
    }
}

fn primitive<'a>(feature: &'a Feature, name: &str) -> Option<&'a PropertyValue> {
    feature.attribute(name).filter(|value| value.is_primitive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature() -> Feature {
        Feature::new("f")
            .with_attribute("color", "#ff0000")
            .with_attribute("height", 12.5)
            .with_attribute("count", "7")
            .with_attribute("open", true)
    }

    #[test]
    fn plain_text_is_coerced() {
        let f = feature();
        assert_eq!(ResultTemplate::parse("tall").render(&f), PropertyValue::from("tall"));
        assert_eq!(ResultTemplate::parse("10").render(&f), PropertyValue::from(10.0));
        assert_eq!(ResultTemplate::parse("true").render(&f), PropertyValue::from(true));
        assert!(!ResultTemplate::parse("tall").has_placeholders());
    }

    #[test]
    fn whole_placeholder_keeps_type() {
        let f = feature();
        let render = |s: &str| ResultTemplate::parse(s).render(&f);
        assert_eq!(render("${feature.property.height}"), PropertyValue::from(12.5));
        assert_eq!(render("${feature.property.open}"), PropertyValue::from(true));
        assert_eq!(render("${feature.property.count}"), PropertyValue::from(7.0));
        assert_eq!(render("${feature.property.color}"), PropertyValue::from("#ff0000"));
        assert_eq!(render("${feature.property.missing}"), PropertyValue::from(""));
    }

    #[test]
    fn mixed_text_substitutes() {
        let f = feature();
        let render = |s: &str| ResultTemplate::parse(s).render(&f);
        assert_eq!(
            render("h=${feature.property.height}m"),
            PropertyValue::from("h=12.5m")
        );
        assert_eq!(
            render("${feature.property.count}${feature.property.count}"),
            PropertyValue::from(77.0)
        );
        assert_eq!(
            render("[${feature.property.missing}]"),
            PropertyValue::from("[]")
        );
    }

    #[test]
    fn unrecognized_placeholders_stay_literal() {
        let f = feature();
        let render = |s: &str| ResultTemplate::parse(s).render(&f);
        assert_eq!(render("${height}"), PropertyValue::from("${height}"));
        assert_eq!(render("a ${feature.property.x"), PropertyValue::from("a ${feature.property.x"));
        assert_eq!(
            render("${x}-${feature.property.color}"),
            PropertyValue::from("${x}-#ff0000")
        );
    }

    #[test]
    fn non_primitive_attributes_render_as_missing() {
        use understory_value::{Expression, Object};

        let looping = Expression::conditions([("true", "${feature.property.x}")]);
        let f = Feature::new("f")
            .with_attribute("x", looping)
            .with_attribute("list", PropertyValue::Array(alloc::vec![PropertyValue::from(1.0)]))
            .with_attribute("obj", PropertyValue::Object(Object::new()));
        let render = |s: &str| ResultTemplate::parse(s).render(&f);
        assert_eq!(render("${feature.property.x}"), PropertyValue::from(""));
        assert_eq!(render("${feature.property.list}"), PropertyValue::from(""));
        assert_eq!(render("<${feature.property.obj}>"), PropertyValue::from("<>"));
    }
}
