//! Step-wise execution of a [`Program`].
//!
//! The interpreter is a small state machine. A run starts in continuous mode
//! ([`Interpreter::start`]) or stepping mode ([`Interpreter::step`]), pauses at
//! every Input block until the host calls [`Interpreter::provide_input`], and
//! ends by reaching End, by running out of edges, by an error, or by
//! [`Interpreter::stop`].

use crate::error::{EvaluationError, ExecutionError};
use crate::graph::{Block, BlockId, BlockKind, Program};
use crate::scope::{Scope, ScopeSnapshot};
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod handle;
mod listener;
mod machine;

pub use handle::{InterruptHandle, SharedInterpreter};
pub use listener::{ExecutionListener, NoopListener};

use handle::InterruptFlags;
use machine::{Flow, Machine};

/// Nested call limit used when the builder does not set one.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Not running. The next `start` or `step` begins from Start.
    Idle,
    /// Executing continuously.
    Running,
    /// Executing one block per `step` call.
    Stepping,
    /// Waiting for `provide_input`.
    Paused,
}

pub struct Interpreter {
    program: Arc<Program>,
    listener: Box<dyn ExecutionListener + Send>,
    presets: Vec<(String, Value)>,
    max_call_depth: usize,

    scope: Scope,
    output: String,
    loops: Vec<BlockId>,
    current: Option<BlockId>,
    state: ExecutionState,
    /// Variables of the Input block being answered, next one first.
    pending_inputs: VecDeque<String>,
    input_block: Option<BlockId>,
    /// Whether to resume continuous execution once the pending input is answered.
    resume_running: bool,
    interrupt: Arc<InterruptFlags>,
}

pub struct InterpreterBuilder {
    program: Arc<Program>,
    listener: Box<dyn ExecutionListener + Send>,
    presets: Vec<(String, Value)>,
    max_call_depth: usize,
}

impl InterpreterBuilder {
    pub fn new(program: impl Into<Arc<Program>>) -> Self {
        Self {
            program: program.into(),
            listener: Box::new(NoopListener),
            presets: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_listener(mut self, listener: impl ExecutionListener + Send + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Seeds a global variable at the beginning of every run.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.presets.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> Interpreter {
        Interpreter {
            program: self.program,
            listener: self.listener,
            presets: self.presets,
            max_call_depth: self.max_call_depth,
            scope: Scope::new(),
            output: String::new(),
            loops: Vec::new(),
            current: None,
            state: ExecutionState::Idle,
            pending_inputs: VecDeque::new(),
            input_block: None,
            resume_running: false,
            interrupt: Arc::new(InterruptFlags::default()),
        }
    }
}

impl Interpreter {
    pub fn new(program: impl Into<Arc<Program>>) -> Self {
        InterpreterBuilder::new(program).build()
    }

    pub fn builder(program: impl Into<Arc<Program>>) -> InterpreterBuilder {
        InterpreterBuilder::new(program)
    }

    /// Resets and runs continuously until End, an Input block, an error or a stop.
    pub fn start(&mut self) -> Result<(), ExecutionError> {
        self.begin()?;
        self.state = ExecutionState::Running;
        info!(blocks = self.program.main.blocks.len(), "run started");
        self.run_loop();
        Ok(())
    }

    /// Executes exactly one block. From idle this first resets and enters
    /// stepping mode. Ignored while waiting for input.
    pub fn step(&mut self) -> Result<(), ExecutionError> {
        match self.state {
            ExecutionState::Paused => {
                debug!("awaiting input, step ignored");
                return Ok(());
            }
            ExecutionState::Idle => {
                self.begin()?;
                info!("stepping started");
            }
            ExecutionState::Running | ExecutionState::Stepping => {}
        }
        self.state = ExecutionState::Stepping;
        self.execute_step();
        Ok(())
    }

    /// Continues a stepped run continuously, or starts a fresh run from idle.
    pub fn run(&mut self) -> Result<(), ExecutionError> {
        match self.state {
            ExecutionState::Idle => self.start(),
            ExecutionState::Paused => {
                // Resume in continuous mode once the input arrives.
                self.resume_running = true;
                Ok(())
            }
            ExecutionState::Running | ExecutionState::Stepping => {
                self.state = ExecutionState::Running;
                self.run_loop();
                Ok(())
            }
        }
    }

    /// Answers the pending Input block, one variable per call.
    ///
    /// The text is stored as an integer, a decimal number or a string, whichever
    /// parses first.
    pub fn provide_input(&mut self, text: &str) -> Result<(), ExecutionError> {
        if self.state != ExecutionState::Paused {
            warn!(input = text, "input provided while not awaiting input");
            return Err(ExecutionError::NotAwaitingInput);
        }
        let variable = self
            .pending_inputs
            .pop_front()
            .ok_or(ExecutionError::NotAwaitingInput)?;
        let value = Value::parse_input(text);
        debug!(variable = %variable, %value, "input received");
        self.scope.set(variable, value);

        if let Some(next) = self.pending_inputs.front() {
            self.listener.on_input_required(next);
            return Ok(());
        }

        let resume = std::mem::take(&mut self.resume_running);
        let program = Arc::clone(&self.program);
        if let Some(block) = self.input_block.take().and_then(|id| program.main.block(id)) {
            self.current = program.main.successor(block.id);
            self.notify_step(block);
        }
        if self.at_end() {
            self.finish();
        } else if resume {
            self.state = ExecutionState::Running;
            self.run_loop();
        } else {
            self.state = ExecutionState::Stepping;
        }
        Ok(())
    }

    /// Cancels the run immediately and reports completion.
    pub fn stop(&mut self) {
        self.interrupt.clear();
        if self.state == ExecutionState::Idle {
            return;
        }
        info!("run stopped");
        self.state = ExecutionState::Idle;
        self.pending_inputs.clear();
        self.input_block = None;
        self.listener.on_complete();
    }

    /// Clears variables, output and position without notifying the listener.
    pub fn reset(&mut self) {
        self.scope.clear();
        for (name, value) in &self.presets {
            self.scope.set(name.clone(), value.clone());
        }
        self.output.clear();
        self.loops.clear();
        self.current = self.program.main.start();
        self.state = ExecutionState::Idle;
        self.pending_inputs.clear();
        self.input_block = None;
        self.resume_running = false;
        self.interrupt.clear();
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle::new(Arc::clone(&self.interrupt))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn variables(&self) -> ScopeSnapshot {
        self.scope.snapshot()
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.scope.get(name)
    }

    /// The block that will execute next.
    pub fn current_block(&self) -> Option<&Block> {
        self.current.and_then(|id| self.program.main.block(id))
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// True from start until the run completes, including while paused.
    pub fn is_running(&self) -> bool {
        self.state != ExecutionState::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.state == ExecutionState::Paused
    }

    /// The variable the pending Input block is waiting for.
    pub fn pending_input(&self) -> Option<&str> {
        self.pending_inputs.front().map(String::as_str)
    }

    fn begin(&mut self) -> Result<(), ExecutionError> {
        self.reset();
        if self.current.is_none() {
            self.listener
                .on_error(&format!("Execution error: {}", ExecutionError::MissingStartBlock));
            self.listener.on_complete();
            return Err(ExecutionError::MissingStartBlock);
        }
        Ok(())
    }

    fn run_loop(&mut self) {
        while self.state == ExecutionState::Running {
            if self.interrupt.take_pause() {
                info!("run paused");
                self.state = ExecutionState::Stepping;
                break;
            }
            self.execute_step();
        }
    }

    fn execute_step(&mut self) {
        if self.interrupt.take_stop() {
            warn!("run cancelled");
            self.stop();
            return;
        }
        if self.at_end() {
            self.finish();
            return;
        }
        let Some(id) = self.current else {
            return;
        };

        let program = Arc::clone(&self.program);
        let Some(block) = program.main.block(id) else {
            return;
        };
        debug!(block = id, kind = %block.kind, label = %block.label, "executing");

        let flow = Machine::new(
            &program,
            &mut self.scope,
            &mut self.output,
            &mut self.loops,
            &self.interrupt,
            self.max_call_depth,
        )
        .execute(block);

        match flow {
            Ok(Flow::Next(next)) => {
                self.current = next;
                self.notify_step(block);
                if self.at_end() {
                    self.finish();
                }
            }
            Ok(Flow::AwaitInput(variables)) => {
                self.pending_inputs = variables.into();
                self.input_block = Some(id);
                self.resume_running |= self.state == ExecutionState::Running;
                self.state = ExecutionState::Paused;
                if let Some(variable) = self.pending_inputs.front() {
                    debug!(block = id, variable = %variable, "awaiting input");
                    self.listener.on_input_required(variable);
                }
            }
            Err(EvaluationError::Cancelled) => {
                warn!("run cancelled during a function call");
                self.stop();
            }
            Err(e) => self.fail(&e),
        }
    }

    /// True when the next block is End or there is no next block.
    fn at_end(&self) -> bool {
        self.current
            .and_then(|id| self.program.main.block(id))
            .is_none_or(|block| block.kind == BlockKind::End)
    }

    fn notify_step(&mut self, block: &Block) {
        let snapshot = self.scope.snapshot();
        self.listener.on_step(block, &snapshot, &self.output);
    }

    fn finish(&mut self) {
        info!(output_bytes = self.output.len(), "run completed");
        self.state = ExecutionState::Idle;
        self.interrupt.clear();
        self.listener.on_complete();
    }

    fn fail(&mut self, error: &EvaluationError) {
        warn!(%error, "run failed");
        self.listener.on_error(&format!("Execution error: {error}"));
        self.stop();
    }
}
