//! Tests for running programs with the step-wise interpreter.
mod common;
use nagare::prelude::*;
use nagare::trace::TraceEvent;
use pretty_assertions::assert_eq;
use std::sync::{Arc, OnceLock};

/// `while (1 == 1) print 1`
fn endless_program() -> Program {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let check = g.add_block(BlockKind::Loop, "1 == 1");
    let print = g.add_block(BlockKind::Output, "1");
    let end = g.add_block(BlockKind::End, "");
    g.connect(start, check);
    g.connect_branch(check, print, BranchTag::True);
    g.connect_branch(check, end, BranchTag::False);
    g.connect(print, check);
    Program::new(g)
}

/// Records events and fires an interrupt once `after` blocks have executed.
struct Interrupting {
    trace: ExecutionTrace,
    handle: Arc<OnceLock<InterruptHandle>>,
    after: usize,
    pause: bool,
}

impl ExecutionListener for Interrupting {
    fn on_step(&mut self, block: &Block, variables: &ScopeSnapshot, output: &str) {
        self.trace.on_step(block, variables, output);
        if self.trace.visited().len() == self.after {
            if let Some(handle) = self.handle.get() {
                if self.pause {
                    handle.pause();
                } else {
                    handle.stop();
                }
            }
        }
    }

    fn on_complete(&mut self) {
        self.trace.on_complete();
    }

    fn on_error(&mut self, message: &str) {
        self.trace.on_error(message);
    }
}

fn interrupting(program: Program, after: usize, pause: bool) -> (Interpreter, ExecutionTrace) {
    let trace = ExecutionTrace::new();
    let handle = Arc::new(OnceLock::new());
    let interpreter = Interpreter::builder(program)
        .with_listener(Interrupting {
            trace: trace.clone(),
            handle: Arc::clone(&handle),
            after,
            pause,
        })
        .build();
    assert!(handle.set(interpreter.interrupt_handle()).is_ok());
    (interpreter, trace)
}

fn input_requests(trace: &ExecutionTrace) -> Vec<String> {
    trace
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::InputRequired(variable) => Some(variable),
            _ => None,
        })
        .collect()
}

#[test]
fn test_assignment_and_output() {
    let (interpreter, trace) = common::run(common::assignment_program());
    assert_eq!(interpreter.output(), "5\n");
    assert_eq!(interpreter.variable("x"), Some(&Value::Int(5)));
    assert_eq!(interpreter.state(), ExecutionState::Idle);
    assert_eq!(trace.visited(), vec![0, 1, 2]);
    assert_eq!(trace.completions(), 1);
}

#[test]
fn test_negated_variable_assignment() {
    let program = common::linear_program(&[
        (BlockKind::Assignment, "x = 3"),
        (BlockKind::Assignment, "y = -x"),
        (BlockKind::Assignment, "z = 10 - y"),
        (BlockKind::Output, "y"),
        (BlockKind::Output, "z"),
    ]);
    let (interpreter, trace) = common::run(program);
    assert_eq!(interpreter.output(), "-3\n13\n");
    assert_eq!(interpreter.variable("y"), Some(&Value::Int(-3)));
    assert!(trace.errors().is_empty());
    assert_eq!(trace.completions(), 1);
}

#[test]
fn test_conditional_takes_both_branches() {
    for (input, expected) in [("4", "8\n"), ("-1", "0\n")] {
        let (mut interpreter, trace) = common::run(common::conditional_program());
        assert!(interpreter.is_paused());
        assert!(interpreter.is_running());
        assert_eq!(interpreter.pending_input(), Some("n"));
        assert_eq!(interpreter.current_block().map(|b| b.id), Some(1));

        interpreter.provide_input(input).unwrap();
        assert_eq!(interpreter.output(), expected, "input: {}", input);
        assert_eq!(interpreter.state(), ExecutionState::Idle);
        assert_eq!(input_requests(&trace), vec!["n".to_string()]);
        assert_eq!(trace.completions(), 1);
    }
}

#[test]
fn test_loops_count_to_three() {
    for program in [
        common::while_program(),
        common::for_program(),
        common::do_while_program(),
    ] {
        let (interpreter, trace) = common::run(program);
        assert_eq!(interpreter.output(), "0\n1\n2\n");
        assert_eq!(interpreter.variable("i"), Some(&Value::Int(3)));
        assert_eq!(trace.completions(), 1);
    }
}

#[test]
fn test_nested_for_loops_restart_inner_loop() {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let outer = g.add_block(BlockKind::ForLoop, "i = 0; i < 2; i = i + 1");
    let inner = g.add_block(BlockKind::ForLoop, "j = 0; j < 2; j = j + 1");
    let print = g.add_block(BlockKind::Output, "i * 10 + j");
    let end = g.add_block(BlockKind::End, "");
    g.connect(start, outer);
    g.connect_branch(outer, inner, BranchTag::True);
    g.connect_branch(outer, end, BranchTag::False);
    g.connect_branch(inner, print, BranchTag::True);
    g.connect_branch(inner, outer, BranchTag::False);
    g.connect(print, inner);

    let (interpreter, _) = common::run(Program::new(g));
    assert_eq!(interpreter.output(), "0\n1\n10\n11\n");
}

#[test]
fn test_function_call_binds_result_and_discards_frame() {
    let (interpreter, trace) = common::run(common::function_program());
    assert_eq!(interpreter.output(), "5\n");
    assert_eq!(interpreter.variable("result"), Some(&Value::Int(5)));

    let variables = interpreter.variables();
    assert!(variables.get("a").is_none());
    assert!(variables.get("sum").is_none());
    assert!(trace.errors().is_empty());
}

#[test]
fn test_recursive_factorial() {
    let program = common::linear_program(&[
        (BlockKind::FunctionCall, "f = fact(5)"),
        (BlockKind::Output, "f"),
    ])
    .with_function(common::factorial_function());
    let (interpreter, trace) = common::run(program);
    assert_eq!(interpreter.output(), "120\n");
    assert!(trace.errors().is_empty());
}

#[test]
fn test_call_inside_assignment_expression() {
    let program = common::linear_program(&[
        (BlockKind::Assignment, "y = add(2, 3)"),
        (BlockKind::Output, "y"),
    ])
    .with_function(common::add_function());
    let (interpreter, _) = common::run(program);
    assert_eq!(interpreter.output(), "5\n");
}

#[test]
fn test_double_parameter_coerces_int_argument() {
    let body = common::linear_graph(&[(BlockKind::Assignment, "h = v")]);
    let identity = FunctionDefinition::new("widen", DataType::Double, body)
        .with_parameter("v", DataType::Double)
        .with_return_variable("h");
    let program = common::linear_program(&[
        (BlockKind::FunctionCall, "w = widen(5)"),
        (BlockKind::Output, "w"),
    ])
    .with_function(identity);

    let (interpreter, _) = common::run(program);
    assert_eq!(interpreter.output(), "5.0\n");
}

#[test]
fn test_void_function_output_is_shared() {
    let body = common::linear_graph(&[(BlockKind::Output, "\"hello\"")]);
    let greet = FunctionDefinition::new("greet", DataType::Void, body);
    let program = common::linear_program(&[
        (BlockKind::FunctionCall, "greet()"),
        (BlockKind::Output, "\"done\""),
    ])
    .with_function(greet);

    let (interpreter, _) = common::run(program);
    assert_eq!(interpreter.output(), "hello\ndone\n");
}

#[test]
fn test_step_mode_executes_one_block_per_call() {
    let trace = ExecutionTrace::new();
    let mut interpreter = Interpreter::builder(common::assignment_program())
        .with_listener(trace.clone())
        .build();

    interpreter.step().unwrap();
    assert_eq!(interpreter.state(), ExecutionState::Stepping);
    assert_eq!(trace.visited(), vec![0]);

    interpreter.step().unwrap();
    assert_eq!(interpreter.variable("x"), Some(&Value::Int(5)));
    assert_eq!(interpreter.output(), "");

    interpreter.step().unwrap();
    assert_eq!(interpreter.output(), "5\n");
    assert_eq!(interpreter.state(), ExecutionState::Idle);
    assert_eq!(trace.completions(), 1);
}

#[test]
fn test_step_is_ignored_while_awaiting_input() {
    let mut interpreter = Interpreter::new(common::conditional_program());
    interpreter.step().unwrap();
    interpreter.step().unwrap();
    assert!(interpreter.is_paused());

    interpreter.step().unwrap();
    assert!(interpreter.is_paused());
    assert_eq!(interpreter.pending_input(), Some("n"));

    // Answering in stepping mode does not resume continuous execution.
    interpreter.provide_input("3").unwrap();
    assert_eq!(interpreter.state(), ExecutionState::Stepping);
    assert_eq!(interpreter.current_block().map(|b| b.id), Some(2));
    assert_eq!(interpreter.output(), "");
}

#[test]
fn test_run_while_paused_resumes_after_input() {
    let mut interpreter = Interpreter::new(common::conditional_program());
    interpreter.step().unwrap();
    interpreter.step().unwrap();
    interpreter.run().unwrap();
    assert!(interpreter.is_paused());

    interpreter.provide_input("3").unwrap();
    assert_eq!(interpreter.output(), "6\n");
    assert_eq!(interpreter.state(), ExecutionState::Idle);
}

#[test]
fn test_run_continues_a_stepped_run() {
    let mut interpreter = Interpreter::new(common::while_program());
    interpreter.step().unwrap();
    interpreter.step().unwrap();
    interpreter.run().unwrap();
    assert_eq!(interpreter.output(), "0\n1\n2\n");
    assert_eq!(interpreter.state(), ExecutionState::Idle);
}

#[test]
fn test_provide_input_when_not_paused() {
    let mut interpreter = Interpreter::new(common::assignment_program());
    assert_eq!(
        interpreter.provide_input("1"),
        Err(ExecutionError::NotAwaitingInput)
    );
}

#[test]
fn test_multiple_input_variables() {
    let program = common::linear_program(&[
        (BlockKind::Input, "I: a, b"),
        (BlockKind::Assignment, "s = a + b"),
        (BlockKind::Output, "s"),
    ]);
    let (mut interpreter, trace) = common::run(program);
    assert_eq!(interpreter.pending_input(), Some("a"));

    interpreter.provide_input("2").unwrap();
    assert!(interpreter.is_paused());
    assert_eq!(interpreter.pending_input(), Some("b"));

    interpreter.provide_input("5").unwrap();
    assert_eq!(interpreter.output(), "7\n");
    assert_eq!(
        input_requests(&trace),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn test_input_text_is_typed() {
    let program = common::linear_program(&[
        (BlockKind::Input, "name"),
        (BlockKind::Output, "name"),
    ]);
    let (mut interpreter, _) = common::run(program);
    interpreter.provide_input("Ada").unwrap();
    assert_eq!(interpreter.variable("name"), Some(&Value::Str("Ada".to_string())));
    assert_eq!(interpreter.output(), "Ada\n");
}

#[test]
fn test_evaluation_error_is_reported_and_completes() {
    let program = common::linear_program(&[(BlockKind::Output, "y")]);
    let (interpreter, trace) = common::run(program);
    assert_eq!(
        trace.errors(),
        vec!["Execution error: Undefined variable 'y'".to_string()]
    );
    assert_eq!(trace.completions(), 1);
    assert_eq!(interpreter.state(), ExecutionState::Idle);
    assert_eq!(interpreter.output(), "");
}

#[test]
fn test_missing_start_block() {
    let trace = ExecutionTrace::new();
    let mut interpreter = Interpreter::builder(Program::new(Graph::new()))
        .with_listener(trace.clone())
        .build();
    assert_eq!(interpreter.start(), Err(ExecutionError::MissingStartBlock));
    assert_eq!(trace.errors().len(), 1);
    assert_eq!(trace.completions(), 1);
    assert_eq!(interpreter.state(), ExecutionState::Idle);
}

#[test]
fn test_argument_count_mismatch() {
    let program = common::linear_program(&[(BlockKind::FunctionCall, "r = add(1)")])
        .with_function(common::add_function());
    let (_, trace) = common::run(program);
    let errors = trace.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("expects 2 argument(s), but 1 were given"));
}

#[test]
fn test_unknown_function() {
    let program = common::linear_program(&[(BlockKind::FunctionCall, "r = missing(1)")]);
    let (_, trace) = common::run(program);
    assert!(trace.errors()[0].contains("'missing'"));
}

#[test]
fn test_call_depth_limit() {
    let body = common::linear_graph(&[(BlockKind::FunctionCall, "r = down(n)")]);
    let down = FunctionDefinition::new("down", DataType::Int, body)
        .with_parameter("n", DataType::Int)
        .with_return_variable("r");
    let program = common::linear_program(&[(BlockKind::FunctionCall, "x = down(1)")])
        .with_function(down);

    let trace = ExecutionTrace::new();
    let mut interpreter = Interpreter::builder(program)
        .with_listener(trace.clone())
        .with_max_call_depth(5)
        .build();
    interpreter.start().unwrap();

    let errors = trace.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("maximum call depth of 5"));
    assert_eq!(interpreter.variable("x"), None);
}

#[test]
fn test_input_inside_function_is_an_error() {
    let body = common::linear_graph(&[(BlockKind::Input, "v")]);
    let ask = FunctionDefinition::new("ask", DataType::Void, body);
    let program =
        common::linear_program(&[(BlockKind::FunctionCall, "ask()")]).with_function(ask);

    let (interpreter, trace) = common::run(program);
    assert!(trace.errors()[0].contains("inside function 'ask'"));
    assert!(!interpreter.is_paused());
}

#[test]
fn test_stop_from_listener_cancels_endless_loop() {
    let (mut interpreter, trace) = interrupting(endless_program(), 6, false);
    interpreter.start().unwrap();

    assert_eq!(interpreter.state(), ExecutionState::Idle);
    assert_eq!(interpreter.output(), "1\n1\n");
    assert_eq!(trace.visited().len(), 6);
    assert_eq!(trace.completions(), 1);
}

#[test]
fn test_pause_switches_to_stepping() {
    let (mut interpreter, trace) = interrupting(endless_program(), 4, true);
    interpreter.start().unwrap();
    assert_eq!(interpreter.state(), ExecutionState::Stepping);
    assert_eq!(interpreter.output(), "1\n");

    interpreter.step().unwrap();
    assert_eq!(interpreter.output(), "1\n1\n");

    interpreter.stop();
    assert_eq!(interpreter.state(), ExecutionState::Idle);
    assert_eq!(trace.completions(), 1);

    // A second stop on an idle interpreter is a no-op.
    interpreter.stop();
    assert_eq!(trace.completions(), 1);
}

#[test]
fn test_shared_interpreter_drops_overlapping_steps() {
    let shared = SharedInterpreter::new(Interpreter::new(common::assignment_program()));
    assert_eq!(shared.try_step(), Ok(true));

    let guard = shared.lock();
    assert_eq!(shared.try_step(), Ok(false));
    drop(guard);

    shared.run().unwrap();
    let interpreter = shared.lock();
    assert_eq!(interpreter.output(), "5\n");
    assert_eq!(interpreter.state(), ExecutionState::Idle);
}

#[test]
fn test_shared_interpreter_stop_while_idle_between_steps() {
    let trace = ExecutionTrace::new();
    let interpreter = Interpreter::builder(endless_program())
        .with_listener(trace.clone())
        .build();
    let shared = SharedInterpreter::new(interpreter);
    shared.try_step().unwrap();
    shared.try_step().unwrap();

    shared.stop();
    assert_eq!(shared.lock().state(), ExecutionState::Idle);
    assert_eq!(trace.completions(), 1);
}

#[test]
fn test_repeated_runs_are_deterministic() {
    let trace = ExecutionTrace::new();
    let mut interpreter = Interpreter::builder(common::while_program())
        .with_listener(trace.clone())
        .build();

    interpreter.start().unwrap();
    let first_output = interpreter.output().to_string();
    let first_trace = trace.format();
    trace.clear();

    interpreter.start().unwrap();
    assert_eq!(interpreter.output(), first_output);
    assert_eq!(trace.format(), first_trace);
}

#[test]
fn test_preset_variables_are_seeded_every_run() {
    let program = common::linear_program(&[
        (BlockKind::Assignment, "n = n + 1"),
        (BlockKind::Output, "greeting"),
        (BlockKind::Output, "n"),
    ]);
    let mut interpreter = Interpreter::builder(program)
        .with_variable("greeting", "hi")
        .with_variable("n", 41i64)
        .build();

    interpreter.start().unwrap();
    assert_eq!(interpreter.output(), "hi\n42\n");
    interpreter.start().unwrap();
    assert_eq!(interpreter.output(), "hi\n42\n");
}

#[test]
fn test_branch_matched_by_edge_label() {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let check = g.add_block(BlockKind::Conditional, "x > 0");
    let negative = g.add_block(BlockKind::Output, "\"neg\"");
    let positive = g.add_block(BlockKind::Output, "\"pos\"");
    let end = g.add_block(BlockKind::End, "");
    g.connect(start, check);
    for (target, label) in [(negative, "No"), (positive, "Yes")] {
        g.edges.push(Edge {
            source: check,
            target,
            label: Some(label.to_string()),
            branch: None,
        });
    }
    g.connect(negative, end);
    g.connect(positive, end);

    let mut interpreter = Interpreter::builder(Program::new(g))
        .with_variable("x", 1i64)
        .build();
    interpreter.start().unwrap();
    assert_eq!(interpreter.output(), "pos\n");
}

#[test]
fn test_unlabeled_branch_falls_back_to_first_edge() {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let check = g.add_block(BlockKind::Conditional, "1 > 2");
    let first = g.add_block(BlockKind::Output, "\"first\"");
    let second = g.add_block(BlockKind::Output, "\"second\"");
    let end = g.add_block(BlockKind::End, "");
    g.connect(start, check);
    g.connect(check, first);
    g.connect(check, second);
    g.connect(first, end);
    g.connect(second, end);

    let (interpreter, trace) = common::run(Program::new(g));
    assert_eq!(interpreter.output(), "first\n");
    assert!(trace.errors().is_empty());
}

#[test]
fn test_path_without_end_completes() {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let print = g.add_block(BlockKind::Output, "\"only\"");
    g.connect(start, print);

    let (interpreter, trace) = common::run(Program::new(g));
    assert_eq!(interpreter.output(), "only\n");
    assert_eq!(trace.completions(), 1);
}

#[test]
fn test_trace_format() {
    let (_, trace) = common::run(common::assignment_program());
    assert_eq!(
        trace.format(),
        "[0] Start\n\
         [1] Assignment `x = 2 + 3` | x = 5\n\
         [2] Output `x` | x = 5\n\
         complete\n"
    );
}
