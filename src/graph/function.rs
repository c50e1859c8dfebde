use super::definition::{BlockId, Graph};
use crate::error::GraphError;
use crate::value::Value;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter or function result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Double,
    String,
    Void,
}

impl DataType {
    /// Converts an argument to the declared parameter type where the conversion
    /// is lossless (an integer passed to a `double` parameter).
    pub fn coerce(self, value: Value) -> Value {
        match (self, value) {
            (DataType::Double, Value::Int(i)) => Value::Float(i as f64),
            (_, other) => other,
        }
    }

    /// The C keyword used when declaring a scalar of this type.
    pub fn c_keyword(self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Double => "double",
            DataType::String => "char*",
            DataType::Void => "void",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "int",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Void => "void",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A user-defined function: its own body graph with one Start and one End block.
///
/// When `return_type` is not `Void`, the value bound to `return_variable` in the
/// callee's frame at the time it reaches End becomes the call's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub return_type: DataType,
    pub body: Graph,
    #[serde(default)]
    pub return_variable: Option<String>,
}

impl FunctionDefinition {
    pub fn new(name: impl Into<String>, return_type: DataType, body: Graph) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            body,
            return_variable: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(Parameter::new(name, data_type));
        self
    }

    pub fn with_return_variable(mut self, name: impl Into<String>) -> Self {
        self.return_variable = Some(name.into());
        self
    }

    pub fn start_block(&self) -> Option<BlockId> {
        self.body.start()
    }

    pub fn end_block(&self) -> Option<BlockId> {
        self.body.end()
    }

    pub fn returns_value(&self) -> bool {
        self.return_type != DataType::Void
    }
}

/// Function table that keeps definitions in insertion order, so anything
/// iterating it (the code generator in particular) is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FunctionDefinition>", into = "Vec<FunctionDefinition>")]
pub struct FunctionTable {
    definitions: Vec<FunctionDefinition>,
    index: AHashMap<String, usize>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a definition, replacing an existing one with the same name in place.
    pub fn insert(&mut self, definition: FunctionDefinition) {
        match self.index.get(&definition.name) {
            Some(&slot) => self.definitions[slot] = definition,
            None => {
                self.index
                    .insert(definition.name.clone(), self.definitions.len());
                self.definitions.push(definition);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.index.get(name).map(|&slot| &self.definitions[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl From<Vec<FunctionDefinition>> for FunctionTable {
    fn from(definitions: Vec<FunctionDefinition>) -> Self {
        let mut table = FunctionTable::new();
        for definition in definitions {
            table.insert(definition);
        }
        table
    }
}

impl From<FunctionTable> for Vec<FunctionDefinition> {
    fn from(table: FunctionTable) -> Self {
        table.definitions
    }
}

/// A complete flowchart program: the main graph plus its function table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub main: Graph,
    #[serde(default)]
    pub functions: FunctionTable,
}

impl Program {
    pub fn new(main: Graph) -> Self {
        Self {
            main,
            functions: FunctionTable::new(),
        }
    }

    pub fn with_function(mut self, definition: FunctionDefinition) -> Self {
        self.functions.insert(definition);
        self
    }

    /// Parses a program snapshot exchanged as JSON.
    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::JsonParseError(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::JsonParseError(e.to_string()))
    }
}
