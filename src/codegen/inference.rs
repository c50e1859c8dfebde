//! Best-effort variable typing for generated declarations and format specifiers.

use crate::evaluator::literal::{is_identifier, parse_call, parse_numeric_literal, parse_string_literal};
use crate::graph::{DataType, Graph, Parameter, Program};
use crate::label::{Instruction, split_assignment};
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap());
static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").unwrap());

/// Variable types of one function (or of `main`), in first-assignment order.
#[derive(Debug, Default)]
pub(crate) struct TypeTable {
    locals: Vec<(String, DataType)>,
    known: AHashMap<String, DataType>,
}

impl TypeTable {
    /// Walks `graph` breadth-first from its Start block, visiting each block once.
    /// Parameters are known to the table but are not declared as locals.
    pub(crate) fn infer(graph: &Graph, program: &Program, parameters: &[Parameter]) -> Self {
        let mut table = TypeTable::default();
        for parameter in parameters {
            table
                .known
                .insert(parameter.name.clone(), parameter.data_type);
        }

        let Some(start) = graph.start() else {
            return table;
        };
        let mut visited = AHashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(block) = graph.block(id) {
                if let Ok(instruction) = Instruction::parse(block) {
                    table.record(&instruction, program);
                }
            }
            queue.extend(graph.outgoing_edges(id).map(|e| e.target));
        }
        table
    }

    fn record(&mut self, instruction: &Instruction<'_>, program: &Program) {
        match instruction {
            Instruction::Assign {
                target: Some(target),
                expression,
            } => {
                let data_type = self.expression_type(expression, program);
                self.declare(target, data_type);
            }
            Instruction::Input { variables } => {
                for variable in variables {
                    self.declare(variable, DataType::Int);
                }
            }
            Instruction::Call {
                target: Some(target),
                name,
                ..
            } => {
                let data_type = return_type(program, name);
                self.declare(target, data_type);
            }
            Instruction::For { init, .. } => {
                if let Some((target, expression)) = split_assignment(init) {
                    let data_type = self.expression_type(expression, program);
                    self.declare(target, data_type);
                }
            }
            _ => {}
        }
    }

    /// The first assignment to a name fixes its type.
    fn declare(&mut self, name: &str, data_type: DataType) {
        if !is_identifier(name) || self.known.contains_key(name) {
            return;
        }
        self.known.insert(name.to_string(), data_type);
        self.locals.push((name.to_string(), data_type));
    }

    pub(crate) fn get(&self, name: &str) -> Option<DataType> {
        self.known.get(name).copied()
    }

    pub(crate) fn locals(&self) -> impl Iterator<Item = &(String, DataType)> {
        self.locals.iter()
    }

    /// Type of an expression's result: quoted text is a string, a decimal point
    /// makes a double, a call has its callee's return type, and a variable keeps
    /// its own type. Everything else is an int.
    pub(crate) fn expression_type(&self, expression: &str, program: &Program) -> DataType {
        let expression = expression.trim();
        if parse_string_literal(expression).is_some() {
            return DataType::String;
        }
        if parse_numeric_literal(expression).is_some() {
            return if expression.contains('.') {
                DataType::Double
            } else {
                DataType::Int
            };
        }
        if let Some(call) = parse_call(expression) {
            return return_type(program, call.name);
        }
        if is_identifier(expression) {
            return self.get(expression).unwrap_or(DataType::Int);
        }

        let operands: Vec<DataType> = WORD
            .find_iter(expression)
            .filter_map(|m| self.get(m.as_str()))
            .collect();
        if expression.contains('"') || operands.contains(&DataType::String) {
            DataType::String
        } else if DECIMAL.is_match(expression) || operands.contains(&DataType::Double) {
            DataType::Double
        } else {
            DataType::Int
        }
    }
}

fn return_type(program: &Program, function: &str) -> DataType {
    program
        .functions
        .get(function)
        .map(|definition| definition.return_type)
        .filter(|&data_type| data_type != DataType::Void)
        .unwrap_or(DataType::Int)
}
