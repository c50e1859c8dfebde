//! # Nagare - Flowchart Execution and Code Generation
//!
//! **Nagare** is the core of a visual flowchart programming tool. A flowchart is a
//! directed graph of typed blocks (assignments, input/output, conditionals, loops,
//! function calls) whose labels carry small expressions such as `x = x + 1` or
//! `i < n`. Nagare can either *run* such a graph step by step, or *translate* it
//! into structured C source.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Program**: Assemble a [`graph::Program`] directly, load one from JSON with
//!     `Program::from_json_str`, or implement [`graph::IntoProgram`] for your editor's model.
//! 2.  **Run it**: Create an [`interpreter::Interpreter`] with `Interpreter::builder`, attach an
//!     [`interpreter::ExecutionListener`], and drive it with `start`, `step` and `provide_input`.
//! 3.  **Translate it**: Hand the same program to [`codegen::CodeGenerator`] and call `generate`.
//!
//! Both consumers share one label parser and one expression evaluator, so a block
//! means the same thing whether it is executed or translated.
//!
//! ## Quick Start
//!
//! ```rust
//! use nagare::prelude::*;
//!
//! let mut main = Graph::new();
//! let start = main.add_block(BlockKind::Start, "");
//! let assign = main.add_block(BlockKind::Assignment, "x = 2 + 3");
//! let print = main.add_block(BlockKind::Output, "x");
//! let end = main.add_block(BlockKind::End, "");
//! main.connect(start, assign);
//! main.connect(assign, print);
//! main.connect(print, end);
//! let program = Program::new(main);
//!
//! let source = CodeGenerator::new(&program).generate();
//! assert!(source.contains("x = 2 + 3;"));
//!
//! let mut interpreter = Interpreter::new(program);
//! interpreter.start().unwrap();
//! assert_eq!(interpreter.output(), "5\n");
//! assert_eq!(interpreter.variable("x"), Some(&Value::Int(5)));
//! ```

pub mod codegen;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod interpreter;
pub mod label;
pub mod prelude;
pub mod scope;
pub mod trace;
pub mod value;
