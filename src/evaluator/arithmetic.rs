//! Textual arithmetic folding.
//!
//! This is a deliberately simple rewriter, not a precedence-climbing parser:
//!
//! 1. every identifier bound to a number is replaced by its literal value,
//! 2. whitespace is removed and doubled signs are collapsed,
//! 3. the first `number (*|/) number` pair is replaced by its result, repeatedly,
//! 4. then the first `number (+|-) number` pair, repeatedly.
//!
//! Parentheses are not supported. If an identifier survives substitution (an
//! undefined or non-numeric variable), the substituted text is returned as a
//! string instead of a number.

use super::Environment;
use crate::value::{Value, format_float};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap());
static MUL_DIV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+(?:\.\d+)?)([*/])(-?\d+(?:\.\d+)?)").unwrap());
static ADD_SUB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+(?:\.\d+)?)([+\-])(-?\d+(?:\.\d+)?)").unwrap());

/// True if the text contains a binary arithmetic operator outside a string literal,
/// or starts with a sign applied to a name (`-x`). A sign on a number literal does
/// not count.
pub(crate) fn has_arithmetic_operator(text: &str) -> bool {
    if let Some(rest) = text.strip_prefix(['+', '-']) {
        if rest
            .trim_start()
            .starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        {
            return true;
        }
    }
    let mut in_string = false;
    text.bytes().enumerate().any(|(i, b)| match b {
        b'"' => {
            in_string = !in_string;
            false
        }
        b'+' | b'-' | b'*' | b'/' => i > 0 && !in_string,
        _ => false,
    })
}

pub(crate) fn fold(text: &str, env: &dyn Environment) -> Value {
    let substituted = WORD.replace_all(text, |caps: &Captures| {
        let name = &caps[0];
        match env.lookup(name) {
            Some(Value::Int(i)) => i.to_string(),
            Some(Value::Float(f)) => format_float(f),
            _ => name.to_string(),
        }
    });
    let mut expr: String = substituted.chars().filter(|c| !c.is_whitespace()).collect();

    if expr.bytes().any(|b| b.is_ascii_alphabetic() || b == b'_' || b == b'"') {
        trace!(expression = %expr, "unresolved operand, returning text");
        return Value::Str(expr);
    }

    collapse_signs(&mut expr);
    reduce(&mut expr, &MUL_DIV);
    reduce(&mut expr, &ADD_SUB);

    super::literal::parse_numeric_literal(&expr)
        .or_else(|| expr.parse::<f64>().ok().map(Value::Float))
        .unwrap_or(Value::Str(expr))
}

/// Merges the sign runs left by substituting negative values: `10--3` becomes
/// `10+3`, `--3` becomes `3`.
fn collapse_signs(expr: &mut String) {
    const PAIRS: [(&str, &str); 6] = [
        ("--", "+"),
        ("+-", "-"),
        ("-+", "-"),
        ("++", "+"),
        ("*+", "*"),
        ("/+", "/"),
    ];
    while let Some(&(pair, single)) = PAIRS.iter().find(|(pair, _)| expr.contains(pair)) {
        *expr = expr.replace(pair, single);
    }
    if expr.starts_with('+') {
        expr.remove(0);
    }
}

/// Replaces the first match of `pattern` with its computed value until none is left.
fn reduce(expr: &mut String, pattern: &Regex) {
    while let Some(caps) = pattern.captures(expr.as_str()) {
        let (Some(whole), Some(left), Some(op), Some(right)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            break;
        };

        let mut start = whole.start();
        let mut left_text = left.as_str();
        // In `8-2*-3` the match is `-2*-3`; that leading '-' is the binary minus.
        if left_text.starts_with('-') && start > 0 {
            let prev = expr.as_bytes()[start - 1];
            if prev.is_ascii_digit() || prev == b'.' {
                start += 1;
                left_text = &left_text[1..];
            }
        }

        let result = apply(left_text, op.as_str(), right.as_str());
        let end = whole.end();
        expr.replace_range(start..end, &result);
    }
}

fn apply(left: &str, op: &str, right: &str) -> String {
    use super::literal::is_int_literal;

    if is_int_literal(left) && is_int_literal(right) && op != "/" {
        if let (Ok(l), Ok(r)) = (left.parse::<i64>(), right.parse::<i64>()) {
            let exact = match op {
                "*" => l.checked_mul(r),
                "+" => l.checked_add(r),
                _ => l.checked_sub(r),
            };
            if let Some(v) = exact {
                return v.to_string();
            }
        }
    }

    let l: f64 = left.parse().unwrap_or(f64::NAN);
    let r: f64 = right.parse().unwrap_or(f64::NAN);
    let v = match op {
        "*" => l * r,
        "/" => l / r,
        "+" => l + r,
        _ => l - r,
    };
    format_float(v)
}
