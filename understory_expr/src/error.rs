// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Condition syntax errors.

use core::fmt;
use core::ops::Range;

/// What went wrong while parsing a condition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// The condition contains no tokens.
    Empty,
    /// A character sequence that is not part of the condition grammar.
    InvalidToken,
    /// A `${...}` placeholder without the `feature.property.` prefix or name.
    InvalidAttributeReference,
    /// A token that cannot appear at this position.
    UnexpectedToken,
    /// The condition ended where an operand was required.
    UnexpectedEnd,
    /// An opening parenthesis without a matching closing one.
    UnclosedParenthesis,
    /// Operators or parentheses nested deeper than
    /// [`MAX_NESTING`](crate::MAX_NESTING).
    NestingTooDeep,
}

impl SyntaxErrorKind {
    const fn description(self) -> &'static str {
        match self {
            Self::Empty => "empty condition",
            Self::InvalidToken => "invalid token",
            Self::InvalidAttributeReference => "invalid attribute reference",
            Self::UnexpectedToken => "unexpected token",
            Self::UnexpectedEnd => "unexpected end of condition",
            Self::UnclosedParenthesis => "unclosed parenthesis",
            Self::NestingTooDeep => "condition nested too deeply",
        }
    }
}

/// Error returned when a condition string cannot be parsed.
///
/// A branch whose condition fails to parse never matches; evaluation moves on
/// to the next branch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SyntaxError {
    kind: SyntaxErrorKind,
    span: Range<usize>,
}

impl SyntaxError {
    pub(crate) fn new(kind: SyntaxErrorKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    /// Returns the kind of error.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> SyntaxErrorKind {
        self.kind
    }

    /// Returns the byte range of the offending input.
    #[must_use]
    #[inline]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}..{}",
            self.kind.description(),
            self.span.start,
            self.span.end
        )
    }
}

impl core::error::Error for SyntaxError {}
