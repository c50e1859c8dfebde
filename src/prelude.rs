//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the nagare crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use nagare::prelude::*;
//!
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("path/to/program.json")?;
//! let program = Program::from_json_str(&json)?;
//! program.validate()?;
//!
//! println!("{}", CodeGenerator::new(&program).generate());
//!
//! let trace = ExecutionTrace::new();
//! let mut interpreter = Interpreter::builder(program)
//!     .with_listener(trace.clone())
//!     .build();
//! interpreter.start()?;
//! print!("{}", trace.format());
//! # Ok(())
//! # }
//! ```

// Program model
pub use crate::graph::{
    Block, BlockId, BlockKind, BranchTag, DataType, Edge, FunctionDefinition, Graph, IntoProgram,
    Parameter, Program,
};

// Execution
pub use crate::interpreter::{
    ExecutionListener, ExecutionState, InterruptHandle, Interpreter, SharedInterpreter,
};
pub use crate::scope::{Scope, ScopeSnapshot};
pub use crate::value::Value;

// Evaluation
pub use crate::evaluator::{Environment, evaluate, evaluate_condition};

// Code generation
pub use crate::codegen::CodeGenerator;

// Trace recording and formatting
pub use crate::trace::{ExecutionTrace, TraceFormatter};

// Error types
pub use crate::error::{EvaluationError, ExecutionError, GraphConversionError, GraphError};
