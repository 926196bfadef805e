// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text coercion shared by comparisons and result templates.

use understory_value::PropertyValue;

/// Parses `text` as a number if it looks like one.
///
/// Accepted: optional sign, digits with an optional decimal point, and an
/// optional exponent. Surrounding whitespace is ignored. Spellings such as
/// `inf`, `NaN` or the empty string are rejected.
///
/// ```rust
/// use understory_expr::parse_number;
///
/// assert_eq!(parse_number("-12.5"), Some(-12.5));
/// assert_eq!(parse_number(" 10 "), Some(10.0));
/// assert_eq!(parse_number("10px"), None);
/// assert_eq!(parse_number("NaN"), None);
/// ```
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if !looks_numeric(trimmed) {
        return None;
    }
    trimmed.parse().ok()
}

fn looks_numeric(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Coerces substituted result text into a typed value.
///
/// Numeric-looking text becomes a number, `true`/`false` become booleans and
/// everything else stays a string.
///
/// ```rust
/// use understory_expr::coerce_text;
/// use understory_value::PropertyValue;
///
/// assert_eq!(coerce_text("42"), PropertyValue::from(42.0));
/// assert_eq!(coerce_text("false"), PropertyValue::from(false));
/// assert_eq!(coerce_text("#ff0000"), PropertyValue::from("#ff0000"));
/// ```
#[must_use]
pub fn coerce_text(text: &str) -> PropertyValue {
    if let Some(n) = parse_number(text) {
        return PropertyValue::Number(n);
    }
    match text.trim() {
        "true" => PropertyValue::Bool(true),
        "false" => PropertyValue::Bool(false),
        _ => PropertyValue::String(text.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_forms() {
        for (text, expected) in [
            ("0", 0.0),
            ("+3", 3.0),
            ("-0.25", -0.25),
            ("10.", 10.0),
            (".5", 0.5),
            ("1e3", 1000.0),
            ("2.5E-1", 0.25),
        ] {
            assert_eq!(parse_number(text), Some(expected), "{text}");
        }
    }

    #[test]
    fn non_numeric_forms() {
        for text in ["", " ", "-", ".", "1e", "1.2.3", "0x10", "inf", "Infinity", "1 2"] {
            assert_eq!(parse_number(text), None, "{text:?}");
        }
    }

    #[test]
    fn coerce_keeps_unrecognized_text_verbatim() {
        assert_eq!(coerce_text(" tall "), PropertyValue::from(" tall "));
        assert_eq!(coerce_text("True"), PropertyValue::from("True"));
        assert_eq!(coerce_text(""), PropertyValue::from(""));
    }
}
