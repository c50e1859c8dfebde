//! Turns the raw text of a block into a structured [`Instruction`].
//!
//! Both the interpreter and the code generator consume instructions, so a label
//! means the same thing whether it is run or translated.

use crate::error::EvaluationError;
use crate::evaluator::literal::{is_identifier, is_wrapped_in_parens, parse_call, split_top_level};
use crate::graph::{Block, BlockKind};
use once_cell::sync::Lazy;
use regex::Regex;

static INPUT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:input\b\s*:?|i\s*:)\s*").unwrap());
static OUTPUT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:output\b\s*:?|o\s*:)\s*").unwrap());
static FOR_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^for\b\s*").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction<'a> {
    Start,
    End,
    Merge,
    /// `target = expression`, or a bare expression evaluated for its effects.
    Assign {
        target: Option<&'a str>,
        expression: &'a str,
    },
    Input {
        variables: Vec<&'a str>,
    },
    Output {
        expression: &'a str,
    },
    If {
        condition: &'a str,
    },
    While {
        condition: &'a str,
    },
    For {
        init: &'a str,
        condition: &'a str,
        increment: &'a str,
    },
    DoWhile {
        condition: &'a str,
    },
    Call {
        target: Option<&'a str>,
        name: &'a str,
        args: Vec<&'a str>,
    },
}

impl<'a> Instruction<'a> {
    pub fn parse(block: &'a Block) -> Result<Self, EvaluationError> {
        let text = block.label.trim();
        let invalid = |message: &str| EvaluationError::InvalidLabel {
            kind: block.kind,
            label: block.label.clone(),
            message: message.to_string(),
        };

        match block.kind {
            BlockKind::Start => Ok(Instruction::Start),
            BlockKind::End => Ok(Instruction::End),
            BlockKind::Merge => Ok(Instruction::Merge),
            BlockKind::Assignment => {
                let statement = strip_terminator(text);
                if statement.is_empty() {
                    return Err(invalid("empty statement"));
                }
                Ok(match split_assignment(statement) {
                    Some((target, expression)) => Instruction::Assign {
                        target: Some(target),
                        expression,
                    },
                    None => Instruction::Assign {
                        target: None,
                        expression: statement,
                    },
                })
            }
            BlockKind::Input => {
                let rest = strip_prefix(&INPUT_PREFIX, text);
                let variables: Vec<&str> = rest
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .collect();
                if variables.is_empty() {
                    return Err(invalid("no variable to read"));
                }
                Ok(Instruction::Input { variables })
            }
            BlockKind::Output => {
                let expression = strip_terminator(strip_prefix(&OUTPUT_PREFIX, text));
                if expression.is_empty() {
                    return Err(invalid("nothing to output"));
                }
                Ok(Instruction::Output { expression })
            }
            BlockKind::Conditional | BlockKind::Loop | BlockKind::DoWhile => {
                if text.is_empty() {
                    return Err(invalid("missing condition"));
                }
                Ok(match block.kind {
                    BlockKind::Conditional => Instruction::If { condition: text },
                    BlockKind::Loop => Instruction::While { condition: text },
                    _ => Instruction::DoWhile { condition: text },
                })
            }
            BlockKind::ForLoop => {
                let mut header = FOR_PREFIX
                    .find(text)
                    .map_or(text, |m| &text[m.end()..])
                    .trim();
                if is_wrapped_in_parens(header) {
                    header = header[1..header.len() - 1].trim();
                }
                match split_top_level(header, b';').as_slice() {
                    [init, condition, increment] => Ok(Instruction::For {
                        init: init.trim(),
                        condition: condition.trim(),
                        increment: increment.trim(),
                    }),
                    _ => Err(invalid("expected 'init; condition; increment'")),
                }
            }
            BlockKind::FunctionCall => {
                let statement = strip_terminator(text);
                let (target, call_text) = match split_assignment(statement) {
                    Some((target, rhs)) => (Some(target), rhs),
                    None => (None, statement),
                };
                let call = parse_call(call_text).ok_or_else(|| invalid("expected 'name(args)'"))?;
                Ok(Instruction::Call {
                    target,
                    name: call.name,
                    args: call.args,
                })
            }
        }
    }
}

fn strip_terminator(text: &str) -> &str {
    text.trim().trim_end_matches(';').trim_end()
}

fn strip_prefix<'t>(prefix: &Regex, text: &'t str) -> &'t str {
    prefix.find(text).map_or(text, |m| &text[m.end()..]).trim()
}

/// Splits `name = expression` on the first lone `=` (not part of `==`, `<=`, `>=`, `!=`).
/// Returns `None` when there is no such `=` or the left side is not an identifier.
pub fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let position = bytes.iter().enumerate().position(|(i, &b)| {
        b == b'='
            && bytes.get(i + 1) != Some(&b'=')
            && (i == 0 || !matches!(bytes[i - 1], b'=' | b'<' | b'>' | b'!'))
    })?;
    let target = text[..position].trim();
    let expression = text[position + 1..].trim();
    if is_identifier(target) && !expression.is_empty() {
        Some((target, expression))
    } else {
        None
    }
}
