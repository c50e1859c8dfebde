//! Translation of a [`Program`] into C source.
//!
//! Generation runs two passes over every graph: inference decides a C type
//! for each variable, then emission recovers `if`/`else`, `while`, `for` and
//! `do`/`while` from the block and edge shape. Functions are emitted in table
//! order followed by `main`, so the same program always yields the same text.

use crate::graph::{BlockId, FunctionDefinition, Graph, Parameter, Program};
use itertools::Itertools;
use tracing::{debug, info};

mod emitter;
mod inference;

use emitter::{Emitter, EmitterSettings};
use inference::TypeTable;

pub use emitter::c_condition;

pub const INCOMPLETE_PROGRAM: &str = "// Incomplete flowchart: missing Start or End block\n";

pub struct CodeGenerator<'p> {
    program: &'p Program,
    settings: EmitterSettings,
    prototypes: bool,
}

pub struct CodeGeneratorBuilder<'p> {
    program: &'p Program,
    indent_width: usize,
    string_capacity: usize,
    prototypes: bool,
}

impl<'p> CodeGeneratorBuilder<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            indent_width: 4,
            string_capacity: 256,
            prototypes: true,
        }
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Size of the `char name[N]` buffers declared for string variables.
    pub fn with_string_capacity(mut self, capacity: usize) -> Self {
        self.string_capacity = capacity;
        self
    }

    /// Whether to forward-declare every function before the definitions.
    pub fn with_prototypes(mut self, enabled: bool) -> Self {
        self.prototypes = enabled;
        self
    }

    pub fn build(self) -> CodeGenerator<'p> {
        CodeGenerator {
            program: self.program,
            settings: EmitterSettings {
                indent_width: self.indent_width,
                string_capacity: self.string_capacity,
            },
            prototypes: self.prototypes,
        }
    }
}

impl<'p> CodeGenerator<'p> {
    pub fn new(program: &'p Program) -> Self {
        CodeGeneratorBuilder::new(program).build()
    }

    pub fn builder(program: &'p Program) -> CodeGeneratorBuilder<'p> {
        CodeGeneratorBuilder::new(program)
    }

    /// Generates the whole translation unit. A main graph without Start or End
    /// produces a single comment line instead.
    pub fn generate(&self) -> String {
        let main = &self.program.main;
        let (Some(start), Some(_)) = (main.start(), main.end()) else {
            info!("main graph is incomplete, emitting placeholder");
            return INCOMPLETE_PROGRAM.to_string();
        };

        let mut code = String::new();
        code.push_str("#include <stdio.h>\n");
        code.push_str("#include <stdlib.h>\n");
        code.push_str("#include <string.h>\n\n");

        let functions = &self.program.functions;
        if self.prototypes {
            let complete: Vec<&FunctionDefinition> = functions
                .iter()
                .filter(|f| f.start_block().is_some() && f.end_block().is_some())
                .collect();
            for definition in &complete {
                code.push_str(&signature(definition));
                code.push_str(";\n");
            }
            if !complete.is_empty() {
                code.push('\n');
            }
        }

        for definition in functions.iter() {
            self.function(definition, &mut code);
            code.push('\n');
        }

        code.push_str("int main() {\n");
        self.body(main, &[], start, &mut code);
        self.indented(1, "return 0;", &mut code);
        code.push_str("}\n");

        info!(
            functions = functions.len(),
            bytes = code.len(),
            "code generation finished"
        );
        code
    }

    fn function(&self, definition: &FunctionDefinition, code: &mut String) {
        let (Some(start), Some(_)) = (definition.start_block(), definition.end_block()) else {
            debug!(function = %definition.name, "skipping incomplete function");
            code.push_str(&format!(
                "// Incomplete function '{}': missing Start or End block\n",
                definition.name
            ));
            return;
        };
        debug!(function = %definition.name, "generating function");

        code.push_str(&signature(definition));
        code.push_str(" {\n");
        self.body(&definition.body, &definition.parameters, start, code);
        if let (true, Some(variable)) = (definition.returns_value(), &definition.return_variable) {
            self.indented(1, &format!("return {};", variable), code);
        }
        code.push_str("}\n");
    }

    /// Hoisted declarations followed by the statements reachable from `start`.
    fn body(&self, graph: &Graph, parameters: &[Parameter], start: BlockId, code: &mut String) {
        let types = TypeTable::infer(graph, self.program, parameters);
        let mut emitter = Emitter::new(self.program, graph, &types, &self.settings, code, 1);
        emitter.emit_declarations();
        emitter.emit_from(Some(start));
    }

    fn indented(&self, level: usize, text: &str, code: &mut String) {
        code.push_str(&" ".repeat(level * self.settings.indent_width));
        code.push_str(text);
        code.push('\n');
    }
}

/// `int add(int a, int b)`
fn signature(definition: &FunctionDefinition) -> String {
    let parameters = if definition.parameters.is_empty() {
        "void".to_string()
    } else {
        definition
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.data_type.c_keyword(), p.name))
            .join(", ")
    };
    format!(
        "{} {}({})",
        definition.return_type.c_keyword(),
        definition.name,
        parameters
    )
}
