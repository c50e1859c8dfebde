use super::handle::InterruptFlags;
use crate::error::EvaluationError;
use crate::evaluator::{Environment, ExpressionEvaluator};
use crate::graph::{Block, BlockId, BranchTag, Graph, Program};
use crate::label::{Instruction, split_assignment};
use crate::scope::{Frame, Scope};
use crate::value::Value;
use tracing::{debug, trace, warn};

/// What the caller should do after a block executed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    /// Continue at the given block; `None` means the path ended.
    Next(Option<BlockId>),
    /// The block is an Input block waiting for these variables, in order.
    AwaitInput(Vec<String>),
}

/// Executes blocks of one graph against borrowed interpreter state.
///
/// The interpreter builds one for every step of the main graph. A function call
/// builds a nested machine over the callee's body that shares the same scope
/// and output.
pub(crate) struct Machine<'a> {
    program: &'a Program,
    graph: &'a Graph,
    scope: &'a mut Scope,
    output: &'a mut String,
    /// Loop blocks whose body is currently being executed, innermost last.
    loops: &'a mut Vec<BlockId>,
    interrupt: &'a InterruptFlags,
    depth: usize,
    max_depth: usize,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(
        program: &'a Program,
        scope: &'a mut Scope,
        output: &'a mut String,
        loops: &'a mut Vec<BlockId>,
        interrupt: &'a InterruptFlags,
        max_depth: usize,
    ) -> Self {
        Self {
            program,
            graph: &program.main,
            scope,
            output,
            loops,
            interrupt,
            depth: 0,
            max_depth,
        }
    }

    pub(crate) fn execute(&mut self, block: &Block) -> Result<Flow, EvaluationError> {
        let id = block.id;
        let next = match Instruction::parse(block)? {
            Instruction::Start | Instruction::Merge => self.graph.successor(id),
            Instruction::End => None,
            Instruction::Assign { target, expression } => {
                let value = self.evaluate(expression)?;
                if let Some(target) = target {
                    self.scope.set(target, value);
                }
                self.graph.successor(id)
            }
            Instruction::Input { variables } => {
                return Ok(Flow::AwaitInput(
                    variables.into_iter().map(str::to_string).collect(),
                ));
            }
            Instruction::Output { expression } => {
                let value = self.evaluate(expression)?;
                self.output.push_str(&value.to_string());
                self.output.push('\n');
                self.graph.successor(id)
            }
            Instruction::If { condition } | Instruction::DoWhile { condition } => {
                let taken = self.condition(condition)?;
                self.branch(id, taken)
            }
            Instruction::While { condition } => {
                let taken = self.condition(condition)?;
                self.track_loop(id, taken);
                self.branch(id, taken)
            }
            Instruction::For {
                init,
                condition,
                increment,
            } => {
                // The loop context tells a fresh entry apart from a back-edge.
                let statement = if self.loops.contains(&id) { increment } else { init };
                self.run_statement(statement)?;
                let taken = self.condition(condition)?;
                self.track_loop(id, taken);
                self.branch(id, taken)
            }
            Instruction::Call { target, name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = self.invoke(name, values)?;
                if let Some(target) = target {
                    self.scope.set(target, result);
                }
                self.graph.successor(id)
            }
        };
        Ok(Flow::Next(next))
    }

    fn evaluate(&mut self, text: &str) -> Result<Value, EvaluationError> {
        ExpressionEvaluator::new(self).evaluate(text)
    }

    fn condition(&mut self, text: &str) -> Result<bool, EvaluationError> {
        let result = ExpressionEvaluator::new(self).evaluate_condition(text)?;
        trace!(condition = text, result, "condition evaluated");
        Ok(result)
    }

    /// Runs a for-loop init or increment clause.
    fn run_statement(&mut self, text: &str) -> Result<(), EvaluationError> {
        if text.is_empty() {
            return Ok(());
        }
        match split_assignment(text) {
            Some((target, expression)) => {
                let value = self.evaluate(expression)?;
                self.scope.set(target, value);
            }
            None => {
                self.evaluate(text)?;
            }
        }
        Ok(())
    }

    fn track_loop(&mut self, id: BlockId, entering_body: bool) {
        let position = self.loops.iter().rposition(|&b| b == id);
        match (entering_body, position) {
            (true, Some(p)) => self.loops.truncate(p + 1),
            (true, None) => self.loops.push(id),
            (false, Some(p)) => self.loops.truncate(p),
            (false, None) => {}
        }
    }

    fn branch(&self, id: BlockId, taken: bool) -> Option<BlockId> {
        let tag = BranchTag::from(taken);
        if let Some(edge) = self.graph.branch_edge(id, tag) {
            return Some(edge.target);
        }
        let fallback = self.graph.successor(id);
        warn!(block = id, branch = %tag, ?fallback, "no matching branch edge, taking first edge");
        fallback
    }

    /// Calls a user function synchronously: binds the arguments in a new frame,
    /// runs the body until End and reads the return variable.
    fn invoke(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvaluationError> {
        let program = self.program;
        let definition = program
            .functions
            .get(name)
            .ok_or_else(|| EvaluationError::UnknownFunction(name.to_string()))?;

        if args.len() != definition.parameters.len() {
            return Err(EvaluationError::ArgumentCount {
                function: name.to_string(),
                expected: definition.parameters.len(),
                found: args.len(),
            });
        }
        if self.depth >= self.max_depth {
            return Err(EvaluationError::CallDepthExceeded {
                function: name.to_string(),
                limit: self.max_depth,
            });
        }
        let (Some(start), Some(end)) = (definition.start_block(), definition.end_block()) else {
            return Err(EvaluationError::IncompleteFunction(name.to_string()));
        };

        let mut frame = Frame::new(name);
        for (parameter, arg) in definition.parameters.iter().zip(args) {
            frame.bind(parameter.name.as_str(), parameter.data_type.coerce(arg));
        }
        debug!(function = name, depth = self.depth + 1, "entering function");
        self.scope.push_frame(frame);

        let mut loops = Vec::new();
        let outcome = Machine {
            program,
            graph: &definition.body,
            scope: &mut *self.scope,
            output: &mut *self.output,
            loops: &mut loops,
            interrupt: self.interrupt,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
        .run_body(name, start, end);

        let frame = self.scope.pop_frame();
        outcome?;

        let result = match (definition.returns_value(), &definition.return_variable) {
            (true, Some(variable)) => frame
                .and_then(|f| f.take(variable))
                .unwrap_or(Value::Int(0)),
            _ => Value::Int(0),
        };
        debug!(function = name, %result, "leaving function");
        Ok(result)
    }

    fn run_body(&mut self, function: &str, start: BlockId, end: BlockId) -> Result<(), EvaluationError> {
        let graph = self.graph;
        let mut current = Some(start);
        while let Some(id) = current {
            if id == end {
                break;
            }
            if self.interrupt.stop_requested() {
                return Err(EvaluationError::Cancelled);
            }
            let block = graph
                .block(id)
                .ok_or(EvaluationError::BlockNotFound(id))?;
            trace!(function, block = id, kind = %block.kind, "executing");
            current = match self.execute(block)? {
                Flow::Next(next) => next,
                Flow::AwaitInput(variables) => {
                    return Err(EvaluationError::InputInsideCall {
                        function: function.to_string(),
                        variable: variables.into_iter().next().unwrap_or_default(),
                    });
                }
            };
        }
        Ok(())
    }
}

impl Environment for Machine<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.scope.get(name).cloned()
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvaluationError> {
        self.invoke(name, args)
    }
}
