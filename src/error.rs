use crate::graph::{BlockId, BlockKind, BranchTag};
use thiserror::Error;

/// Errors raised while evaluating a block label or expression.
///
/// Inside a run these never escape the interpreter: they are caught at the step
/// boundary, reported through `ExecutionListener::on_error`, and the run is stopped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("Function '{0}' is not defined in the function table")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} argument(s), but {found} were given")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Function '{0}' has no Start or End block")]
    IncompleteFunction(String),

    #[error("Call to '{function}' exceeded the maximum call depth of {limit}")]
    CallDepthExceeded { function: String, limit: usize },

    #[error("{kind} block has an invalid label '{label}': {message}")]
    InvalidLabel {
        kind: BlockKind,
        label: String,
        message: String,
    },

    #[error(
        "Input for '{variable}' was requested inside function '{function}', which runs synchronously and cannot suspend"
    )]
    InputInsideCall { function: String, variable: String },

    #[error("Block #{0} does not exist in the graph being executed")]
    BlockNotFound(BlockId),

    #[error("Execution was cancelled")]
    Cancelled,
}

/// Errors caused by driving an `Interpreter` incorrectly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("The interpreter is not waiting for input")]
    NotAwaitingInput,

    #[error("The main graph has no Start block")]
    MissingStartBlock,
}

/// Structural problems found by graph validation or while exchanging a program as JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Failed to parse program JSON: {0}")]
    JsonParseError(String),

    #[error("Edge {source_block} -> {target_block} references block #{missing}, which does not exist")]
    EdgeEndpointMissing {
        source_block: BlockId,
        target_block: BlockId,
        missing: BlockId,
    },

    #[error("Graph has no Start block")]
    MissingStart,

    #[error("Graph has no End block")]
    MissingEnd,

    #[error("Graph has more than one Start block (second one is #{0})")]
    DuplicateStart(BlockId),

    #[error("Graph has more than one End block (second one is #{0})")]
    DuplicateEnd(BlockId),

    #[error("Block #{block} has no {branch}-tagged outgoing edge")]
    MissingBranch { block: BlockId, branch: BranchTag },

    #[error("Block #{0} has no outgoing edge and is not an End block")]
    DeadEnd(BlockId),

    #[error("Block #{0} must have exactly one outgoing edge")]
    FanOut(BlockId),

    #[error("Merge block #{0} must not carry a label")]
    LabeledMerge(BlockId),

    #[error("Merge block #{0} has no incoming edge")]
    UnreachedMerge(BlockId),

    #[error("Function '{function}' is invalid: {source}")]
    InvalidFunction {
        function: String,
        #[source]
        source: Box<GraphError>,
    },
}

/// Errors that can occur when converting a custom editor model into a `Program`.
#[derive(Error, Debug, Clone)]
pub enum GraphConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
