//! Lexical helpers shared by the evaluator, the label parser and the code generator.
//!
//! All scanning works on bytes: the delimiters it looks for (`(`, `)`, `"`, `,`)
//! are ASCII and never occur inside a multi-byte UTF-8 sequence, so every index
//! returned here is a valid char boundary.

use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

static INT_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());
static FLOAT_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").unwrap());
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Recognises an integer literal, then a decimal literal (which needs a decimal point).
pub fn parse_numeric_literal(text: &str) -> Option<Value> {
    if INT_LITERAL.is_match(text) {
        // Integers too large for i64 still read as numbers.
        return Some(
            text.parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Float(text.parse::<f64>().unwrap_or(f64::INFINITY))),
        );
    }
    if FLOAT_LITERAL.is_match(text) {
        return text.parse::<f64>().ok().map(Value::Float);
    }
    None
}

pub fn is_int_literal(text: &str) -> bool {
    INT_LITERAL.is_match(text)
}

/// Returns the contents of a double-quoted literal, without the quotes.
pub fn parse_string_literal(text: &str) -> Option<&str> {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// Index of the parenthesis closing the one at `open`, skipping quoted text.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// True when the whole text is enclosed by a single matching pair of parentheses.
pub fn is_wrapped_in_parens(text: &str) -> bool {
    text.starts_with('(') && find_matching_paren(text, 0) == Some(text.len() - 1)
}

/// Splits on `separator` wherever it appears outside parentheses and quotes.
pub fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth = depth.saturating_sub(1),
            _ if b == separator && depth == 0 && !in_string => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// A `name(arg, ...)` pattern covering the whole text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPattern<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

/// Recognises `name(args...)` where the closing parenthesis is the last character.
/// `f(1) + g(2)` is therefore not a call pattern.
pub fn parse_call(text: &str) -> Option<CallPattern<'_>> {
    let open = text.find('(')?;
    let name = text[..open].trim_end();
    if !is_identifier(name) || find_matching_paren(text, open)? != text.len() - 1 {
        return None;
    }
    let inner = text[open + 1..text.len() - 1].trim();
    let args = if inner.is_empty() {
        Vec::new()
    } else {
        split_top_level(inner, b',')
            .into_iter()
            .map(str::trim)
            .collect()
    };
    Some(CallPattern { name, args })
}
