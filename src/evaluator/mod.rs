use crate::error::EvaluationError;
use crate::scope::Scope;
use crate::value::Value;
use tracing::trace;

mod arithmetic;
mod condition;
pub mod literal;

use literal::{is_identifier, parse_call, parse_numeric_literal, parse_string_literal};

/// What an expression can see while it is evaluated: variables, and a way to
/// invoke user functions.
///
/// The interpreter implements this on its per-call machine so that `f(x)` inside an
/// expression runs the callee's body. A bare [`Scope`] also implements it, with no
/// callable functions.
pub trait Environment {
    fn lookup(&self, name: &str) -> Option<Value>;

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvaluationError>;
}

impl Environment for Scope {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn call(&mut self, name: &str, _args: Vec<Value>) -> Result<Value, EvaluationError> {
        Err(EvaluationError::UnknownFunction(name.to_string()))
    }
}

/// Evaluates assignment right-hand sides, output expressions and conditions
/// against an [`Environment`].
pub struct ExpressionEvaluator<'e> {
    env: &'e mut dyn Environment,
}

impl<'e> ExpressionEvaluator<'e> {
    pub fn new(env: &'e mut dyn Environment) -> Self {
        Self { env }
    }

    /// Resolves `text` to a value. The first matching rule wins:
    ///
    /// 1. integer literal, 2. decimal literal, 3. quoted string literal,
    /// 4. `name(args...)` call, 5. arithmetic folding of `+ - * /` expressions,
    /// 6. bare variable lookup.
    ///
    /// Anything else is reported as an undefined variable.
    pub fn evaluate(&mut self, text: &str) -> Result<Value, EvaluationError> {
        let text = text.trim();

        if let Some(number) = parse_numeric_literal(text) {
            return Ok(number);
        }
        if let Some(contents) = parse_string_literal(text) {
            return Ok(Value::Str(contents.to_string()));
        }
        if let Some(call) = parse_call(text) {
            let args = call
                .args
                .iter()
                .map(|arg| self.evaluate(arg))
                .collect::<Result<Vec<_>, _>>()?;
            trace!(function = call.name, argc = args.len(), "dispatching call");
            return self.env.call(call.name, args);
        }
        if arithmetic::has_arithmetic_operator(text) {
            return Ok(arithmetic::fold(text, &*self.env));
        }
        if is_identifier(text) {
            return self
                .env
                .lookup(text)
                .ok_or_else(|| EvaluationError::UndefinedVariable(text.to_string()));
        }
        Err(EvaluationError::UndefinedVariable(text.to_string()))
    }
}

/// Evaluates an expression against `env`.
pub fn evaluate(text: &str, env: &mut dyn Environment) -> Result<Value, EvaluationError> {
    ExpressionEvaluator::new(env).evaluate(text)
}

/// Evaluates a condition against `env`.
pub fn evaluate_condition(text: &str, env: &mut dyn Environment) -> Result<bool, EvaluationError> {
    ExpressionEvaluator::new(env).evaluate_condition(text)
}
