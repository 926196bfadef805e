// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Condition tokenizer.
//!
//! Attribute references are recognized as single tokens, so substitution of
//! feature values happens on the typed syntax tree and never by splicing text.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use logos::{Lexer, Logos};

use crate::error::{SyntaxError, SyntaxErrorKind};

/// Byte range of a token in the condition source.
pub(crate) type Span = Range<usize>;

/// Prefix every attribute reference must carry inside `${...}`.
pub(crate) const ATTRIBUTE_PREFIX: &str = "feature.property.";

#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub(crate) enum Token {
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", lex_number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", lex_number)]
    Number(f64),

    #[regex(r#""([^"\\]|\\.)*""#, lex_string)]
    #[regex(r"'([^'\\]|\\.)*'", lex_string)]
    String(String),

    #[regex(r"\$\{[^}]*\}", lex_attribute)]
    Attribute(String),

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,

    #[token("==")]
    #[token("===")]
    EqEq,
    #[token("!=")]
    #[token("!==")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

fn lex_number(lex: &mut Lexer<'_, Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn lex_string(lex: &mut Lexer<'_, Token>) -> Option<String> {
    let slice = lex.slice();
    Some(unescape(&slice[1..slice.len() - 1]))
}

fn lex_attribute(lex: &mut Lexer<'_, Token>) -> Option<String> {
    let slice = lex.slice();
    attribute_name(&slice[2..slice.len() - 1]).map(String::from)
}

/// Extracts the attribute name from the inside of a `${...}` placeholder.
///
/// Returns `None` unless the reference has the `feature.property.` prefix
/// followed by a non-empty name.
pub(crate) fn attribute_name(inner: &str) -> Option<&str> {
    inner
        .trim()
        .strip_prefix(ATTRIBUTE_PREFIX)
        .filter(|name| !name.is_empty())
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Tokenizes a condition.
pub(crate) fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(token) = lexer.next() {
        let span = lexer.span();
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let kind = if lexer.slice().starts_with("${") {
                    SyntaxErrorKind::InvalidAttributeReference
                } else {
                    SyntaxErrorKind::InvalidToken
                };
                return Err(SyntaxError::new(kind, span));
            }
        }
    }
    Ok(tokens)
}
