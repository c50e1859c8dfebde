//! Boolean condition evaluation.
//!
//! The scan is linear and not precedence-aware: an AND connective is always split
//! before an OR connective, wherever they appear. `a OR b AND c` therefore reads
//! as `(a OR b) AND c`. Flowcharts are written against this behavior.

use super::ExpressionEvaluator;
use super::literal::is_wrapped_in_parens;
use crate::error::EvaluationError;
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

static COMPARISON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*(<=|>=|==|!=|<|>|=)\s*(.+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

impl Connective {
    fn symbols(self) -> (&'static str, u8, &'static str) {
        match self {
            Connective::And => ("&&", b'&', "AND"),
            Connective::Or => ("||", b'|', "OR"),
        }
    }
}

impl ExpressionEvaluator<'_> {
    pub fn evaluate_condition(&mut self, text: &str) -> Result<bool, EvaluationError> {
        let text = text.trim();
        let text = text.strip_suffix('?').unwrap_or(text).trim();

        for connective in [Connective::And, Connective::Or] {
            if let Some((start, end)) = find_connective(text, connective) {
                let (left, right) = (&text[..start], &text[end..]);
                trace!(?connective, left, right, "splitting condition");
                return Ok(match connective {
                    Connective::And => {
                        self.evaluate_condition(left)? && self.evaluate_condition(right)?
                    }
                    Connective::Or => {
                        self.evaluate_condition(left)? || self.evaluate_condition(right)?
                    }
                });
            }
        }

        if let Some(rest) = strip_negation(text) {
            return Ok(!self.evaluate_condition(rest)?);
        }

        if is_wrapped_in_parens(text) {
            return self.evaluate_condition(&text[1..text.len() - 1]);
        }

        if let Some(caps) = COMPARISON.captures(text) {
            let left = self.evaluate(&caps[1])?;
            let right = self.evaluate(&caps[3])?;
            return Ok(compare(&left, &caps[2], &right));
        }

        Ok(self.evaluate(text)?.is_truthy())
    }
}

/// Numbers compare numerically; anything else compares by its text and only
/// supports equality.
fn compare(left: &Value, op: &str, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return match op {
            "<" => l < r,
            ">" => l > r,
            "<=" => l <= r,
            ">=" => l >= r,
            "==" | "=" => l == r,
            "!=" => l != r,
            _ => false,
        };
    }
    let (l, r) = (left.to_string(), right.to_string());
    match op {
        "==" | "=" => l == r,
        "!=" => l != r,
        _ => false,
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte range of the first connective of the given kind outside parentheses and quotes.
fn find_connective(text: &str, connective: Connective) -> Option<(usize, usize)> {
    let (double, single, word) = connective.symbols();
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth = depth.saturating_sub(1),
            _ if depth > 0 || in_string => {}
            _ if bytes[i..].starts_with(double.as_bytes()) => return Some((i, i + double.len())),
            _ if b == single => return Some((i, i + 1)),
            _ if bytes[i..].starts_with(word.as_bytes()) => {
                let before = i == 0 || !is_word_byte(bytes[i - 1]);
                let after = bytes.get(i + word.len()).is_none_or(|&n| !is_word_byte(n));
                if before && after {
                    return Some((i, i + word.len()));
                }
            }
            _ => {}
        }
    }
    None
}

/// The operand of a leading `NOT` / `!`, if present. `!=` is not a negation.
fn strip_negation(text: &str) -> Option<&str> {
    if let Some(rest) = text.strip_prefix("NOT") {
        if rest.bytes().next().is_some_and(|b| !is_word_byte(b)) {
            return Some(rest.trim_start());
        }
    }
    if text.starts_with('!') && !text.starts_with("!=") {
        return Some(text[1..].trim_start());
    }
    None
}
