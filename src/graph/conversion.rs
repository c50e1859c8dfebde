use super::function::Program;
use crate::error::GraphConversionError;

/// A trait for editor models that can be converted into a nagare `Program`.
///
/// This is the extension point that keeps nagare independent of any particular
/// editor or project file format. The host implements it on its own structs and
/// hands the resulting snapshot to the `Interpreter` or the `CodeGenerator`.
///
/// # Example
///
/// ```rust,no_run
/// use nagare::prelude::*;
/// use nagare::error::GraphConversionError;
///
/// struct Cell { style: String, text: String }
/// struct Canvas { cells: Vec<Cell>, links: Vec<(usize, usize)> }
///
/// impl IntoProgram for Canvas {
///     fn into_program(self) -> Result<Program, GraphConversionError> {
///         let mut graph = Graph::new();
///         for cell in self.cells {
///             let kind = match cell.style.as_str() {
///                 "START" => BlockKind::Start,
///                 "END" => BlockKind::End,
///                 "ASSIGNMENT" => BlockKind::Assignment,
///                 other => {
///                     return Err(GraphConversionError::ValidationError(format!(
///                         "unsupported style {other}"
///                     )))
///                 }
///             };
///             graph.add_block(kind, cell.text);
///         }
///         for (from, to) in self.links {
///             graph.connect(from, to);
///         }
///         Ok(Program::new(graph))
///     }
/// }
/// ```
pub trait IntoProgram {
    /// Consumes the object and converts it into a runnable program snapshot.
    fn into_program(self) -> Result<Program, GraphConversionError>;
}

impl IntoProgram for Program {
    fn into_program(self) -> Result<Program, GraphConversionError> {
        Ok(self)
    }
}
