use crate::graph::Block;
use crate::scope::ScopeSnapshot;

/// Receives execution events from an [`Interpreter`](super::Interpreter).
///
/// All methods default to doing nothing, so a listener only implements what it
/// needs. Callbacks run synchronously on the thread that drives the interpreter.
pub trait ExecutionListener {
    /// A block finished executing. `output` is the accumulated program output.
    fn on_step(&mut self, _block: &Block, _variables: &ScopeSnapshot, _output: &str) {}

    /// The run ended, either by reaching End or by being stopped.
    fn on_complete(&mut self) {}

    /// The run failed. Always followed by [`on_complete`](Self::on_complete).
    fn on_error(&mut self, _message: &str) {}

    /// An Input block needs a value for `variable`. Answer with
    /// [`Interpreter::provide_input`](super::Interpreter::provide_input).
    fn on_input_required(&mut self, _variable: &str) {}
}

/// A listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ExecutionListener for NoopListener {}
