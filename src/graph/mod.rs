pub mod conversion;
pub mod definition;
pub mod function;
pub mod validate;

pub use conversion::*;
pub use definition::*;
pub use function::*;

use crate::error::GraphError;

impl Graph {
    /// Checks the structural invariants of a single graph.
    pub fn validate(&self) -> Result<(), GraphError> {
        validate::validate_graph(self)
    }
}

impl Program {
    /// Checks the main graph and every function body.
    pub fn validate(&self) -> Result<(), GraphError> {
        validate::validate_program(self)
    }
}
