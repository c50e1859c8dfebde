//! Common test utilities for building flowchart programs.
use nagare::prelude::*;

/// Chains `labels` between a Start and an End block, one block per `(kind, label)`.
#[allow(dead_code)]
pub fn linear_program(steps: &[(BlockKind, &str)]) -> Program {
    Program::new(linear_graph(steps))
}

#[allow(dead_code)]
pub fn linear_graph(steps: &[(BlockKind, &str)]) -> Graph {
    let mut graph = Graph::new();
    let mut previous = graph.add_block(BlockKind::Start, "");
    for (kind, label) in steps {
        let block = graph.add_block(*kind, *label);
        graph.connect(previous, block);
        previous = block;
    }
    let end = graph.add_block(BlockKind::End, "");
    graph.connect(previous, end);
    graph
}

/// `x = 2 + 3`, then prints `x`.
#[allow(dead_code)]
pub fn assignment_program() -> Program {
    linear_program(&[
        (BlockKind::Assignment, "x = 2 + 3"),
        (BlockKind::Output, "x"),
    ])
}

/// Reads `n`; `result = n * 2` when `n > 0`, otherwise `result = 0`; prints `result`.
#[allow(dead_code)]
pub fn conditional_program() -> Program {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let input = g.add_block(BlockKind::Input, "n");
    let check = g.add_block(BlockKind::Conditional, "n > 0");
    let double = g.add_block(BlockKind::Assignment, "result = n * 2");
    let zero = g.add_block(BlockKind::Assignment, "result = 0");
    let merge = g.add_block(BlockKind::Merge, "");
    let print = g.add_block(BlockKind::Output, "result");
    let end = g.add_block(BlockKind::End, "");

    g.connect(start, input);
    g.connect(input, check);
    g.connect_branch(check, double, BranchTag::True);
    g.connect_branch(check, zero, BranchTag::False);
    g.connect(double, merge);
    g.connect(zero, merge);
    g.connect(merge, print);
    g.connect(print, end);
    Program::new(g)
}

/// `i = 0; while (i < 3) { print i; i = i + 1 }`
#[allow(dead_code)]
pub fn while_program() -> Program {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let init = g.add_block(BlockKind::Assignment, "i = 0");
    let check = g.add_block(BlockKind::Loop, "i < 3");
    let print = g.add_block(BlockKind::Output, "i");
    let increment = g.add_block(BlockKind::Assignment, "i = i + 1");
    let end = g.add_block(BlockKind::End, "");

    g.connect(start, init);
    g.connect(init, check);
    g.connect_branch(check, print, BranchTag::True);
    g.connect_branch(check, end, BranchTag::False);
    g.connect(print, increment);
    g.connect(increment, check);
    Program::new(g)
}

/// `for (i = 0; i < 3; i = i + 1) print i`
#[allow(dead_code)]
pub fn for_program() -> Program {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let header = g.add_block(BlockKind::ForLoop, "i = 0; i < 3; i = i + 1");
    let print = g.add_block(BlockKind::Output, "i");
    let end = g.add_block(BlockKind::End, "");

    g.connect(start, header);
    g.connect_branch(header, print, BranchTag::True);
    g.connect_branch(header, end, BranchTag::False);
    g.connect(print, header);
    Program::new(g)
}

/// `i = 0; do { print i; i = i + 1 } while (i < 3)`
#[allow(dead_code)]
pub fn do_while_program() -> Program {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let init = g.add_block(BlockKind::Assignment, "i = 0");
    let entry = g.add_block(BlockKind::Merge, "");
    let print = g.add_block(BlockKind::Output, "i");
    let increment = g.add_block(BlockKind::Assignment, "i = i + 1");
    let check = g.add_block(BlockKind::DoWhile, "i < 3");
    let end = g.add_block(BlockKind::End, "");

    g.connect(start, init);
    g.connect(init, entry);
    g.connect(entry, print);
    g.connect(print, increment);
    g.connect(increment, check);
    g.connect_branch(check, entry, BranchTag::True);
    g.connect_branch(check, end, BranchTag::False);
    Program::new(g)
}

/// `int add(int a, int b)` returning `sum = a + b`.
#[allow(dead_code)]
pub fn add_function() -> FunctionDefinition {
    let body = linear_graph(&[(BlockKind::Assignment, "sum = a + b")]);
    FunctionDefinition::new("add", DataType::Int, body)
        .with_parameter("a", DataType::Int)
        .with_parameter("b", DataType::Int)
        .with_return_variable("sum")
}

/// `result = add(2, 3)`, then prints `result`.
#[allow(dead_code)]
pub fn function_program() -> Program {
    linear_program(&[
        (BlockKind::FunctionCall, "result = add(2, 3)"),
        (BlockKind::Output, "result"),
    ])
    .with_function(add_function())
}

/// Recursive `fact(n)`: `r = 1` when `n <= 1`, otherwise `r = n * fact(n - 1)`.
#[allow(dead_code)]
pub fn factorial_function() -> FunctionDefinition {
    let mut g = Graph::new();
    let start = g.add_block(BlockKind::Start, "");
    let check = g.add_block(BlockKind::Conditional, "n <= 1");
    let base = g.add_block(BlockKind::Assignment, "r = 1");
    let decrement = g.add_block(BlockKind::Assignment, "m = n - 1");
    let recurse = g.add_block(BlockKind::FunctionCall, "sub = fact(m)");
    let multiply = g.add_block(BlockKind::Assignment, "r = n * sub");
    let merge = g.add_block(BlockKind::Merge, "");
    let end = g.add_block(BlockKind::End, "");

    g.connect(start, check);
    g.connect_branch(check, base, BranchTag::True);
    g.connect_branch(check, decrement, BranchTag::False);
    g.connect(base, merge);
    g.connect(decrement, recurse);
    g.connect(recurse, multiply);
    g.connect(multiply, merge);
    g.connect(merge, end);

    FunctionDefinition::new("fact", DataType::Int, g)
        .with_parameter("n", DataType::Int)
        .with_return_variable("r")
}

/// Runs `program` to completion with a recording listener.
#[allow(dead_code)]
pub fn run(program: Program) -> (Interpreter, ExecutionTrace) {
    let trace = ExecutionTrace::new();
    let mut interpreter = Interpreter::builder(program)
        .with_listener(trace.clone())
        .build();
    interpreter.start().expect("program has a Start block");
    (interpreter, trace)
}
