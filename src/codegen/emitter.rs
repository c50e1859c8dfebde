//! Recovers structured control flow from a graph and writes it as C statements.

use super::inference::TypeTable;
use crate::evaluator::literal::parse_string_literal;
use crate::graph::{Block, BlockId, BlockKind, BranchTag, DataType, Graph, Program};
use crate::label::Instruction;
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use tracing::trace;

static AND_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAND\b").unwrap());
static OR_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bOR\b").unwrap());
static NOT_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNOT\b\s*").unwrap());

pub(crate) struct EmitterSettings {
    pub(crate) indent_width: usize,
    pub(crate) string_capacity: usize,
}

/// Emission state for one graph. A fresh emitter is used for `main` and for
/// every function body.
pub(crate) struct Emitter<'g> {
    program: &'g Program,
    graph: &'g Graph,
    types: &'g TypeTable,
    settings: &'g EmitterSettings,
    output: &'g mut String,
    indent_level: usize,
    visited: AHashSet<BlockId>,
    /// Blocks that end the region being emitted: enclosing loop headers and
    /// do-while conditions.
    stops: Vec<BlockId>,
    /// Entry block of each do-while body, mapped to its condition block.
    do_entries: AHashMap<BlockId, BlockId>,
    opened_do: AHashSet<BlockId>,
}

impl<'g> Emitter<'g> {
    pub(crate) fn new(
        program: &'g Program,
        graph: &'g Graph,
        types: &'g TypeTable,
        settings: &'g EmitterSettings,
        output: &'g mut String,
        indent_level: usize,
    ) -> Self {
        let do_entries = graph
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::DoWhile)
            .filter_map(|b| do_body_entry(graph, b.id).map(|entry| (entry, b.id)))
            .collect();
        Self {
            program,
            graph,
            types,
            settings,
            output,
            indent_level,
            visited: AHashSet::new(),
            stops: Vec::new(),
            do_entries,
            opened_do: AHashSet::new(),
        }
    }

    /// Hoisted declarations for every local the inference pass found.
    pub(crate) fn emit_declarations(&mut self) {
        let types = self.types;
        for (name, data_type) in types.locals() {
            let declaration = match data_type {
                DataType::String => format!("char {}[{}];", name, self.settings.string_capacity),
                other => format!("{} {};", other.c_keyword(), name),
            };
            self.line(&declaration);
        }
    }

    /// Emits everything reachable from `start` up to End or an enclosing stop.
    pub(crate) fn emit_from(&mut self, start: Option<BlockId>) {
        let graph = self.graph;
        let mut current = start;
        while let Some(id) = current {
            if self.stops.contains(&id) {
                return;
            }
            if let Some(&condition) = self.do_entries.get(&id) {
                if self.opened_do.insert(id) {
                    current = self.emit_do_while(id, condition);
                    continue;
                }
            }
            if !self.visited.insert(id) {
                return;
            }
            let Some(block) = graph.block(id) else {
                return;
            };
            trace!(block = id, kind = %block.kind, "emitting");
            current = self.emit_block(block);
        }
    }

    /// Emits one block and returns where straight-line emission continues.
    fn emit_block(&mut self, block: &Block) -> Option<BlockId> {
        let id = block.id;
        let instruction = match Instruction::parse(block) {
            Ok(instruction) => instruction,
            Err(_) => {
                self.line(&format!("// Unrecognized block: {}", block.label.trim()));
                return self.graph.successor(id);
            }
        };

        match instruction {
            Instruction::Start | Instruction::Merge => self.graph.successor(id),
            Instruction::End => None,
            Instruction::Assign { target, expression } => {
                match target {
                    Some(target) => self.assignment(target, expression),
                    None => self.line(&format!("{};", expression)),
                }
                self.graph.successor(id)
            }
            Instruction::Input { variables } => {
                for variable in variables {
                    let statement = match self.types.get(variable).unwrap_or(DataType::Int) {
                        DataType::Double => format!("scanf(\"%lf\", &{});", variable),
                        DataType::String => format!("scanf(\"%s\", {});", variable),
                        _ => format!("scanf(\"%d\", &{});", variable),
                    };
                    self.line(&statement);
                }
                self.graph.successor(id)
            }
            Instruction::Output { expression } => {
                self.output_statement(expression);
                self.graph.successor(id)
            }
            Instruction::If { condition } => self.emit_if(id, condition),
            Instruction::While { condition } => {
                self.emit_loop(id, &format!("while ({})", c_condition(condition)))
            }
            Instruction::For {
                init,
                condition,
                increment,
            } => {
                let header = format!("for ({}; {}; {})", init, c_condition(condition), increment);
                self.emit_loop(id, &header)
            }
            Instruction::DoWhile { condition } => {
                // Reached without passing through the body's entry first.
                self.line("do {");
                self.line(&format!("}} while ({});", c_condition(condition)));
                self.branch_target(id, BranchTag::False)
            }
            Instruction::Call { target, name, args } => {
                let call = format!("{}({})", name, args.join(", "));
                match target {
                    Some(target) => self.assignment(target, &call),
                    None => self.line(&format!("{};", call)),
                }
                self.graph.successor(id)
            }
        }
    }

    fn assignment(&mut self, target: &str, expression: &str) {
        if self.types.get(target) == Some(DataType::String) {
            self.line(&format!("strcpy({}, {});", target, expression));
        } else {
            self.line(&format!("{} = {};", target, expression));
        }
    }

    fn output_statement(&mut self, expression: &str) {
        if let Some(text) = parse_string_literal(expression) {
            self.line(&format!("printf(\"{}\\n\");", text));
            return;
        }
        let specifier = match self.types.expression_type(expression, self.program) {
            DataType::Double => "%lf",
            DataType::String => "%s",
            _ => "%d",
        };
        self.line(&format!("printf(\"{}\\n\", {});", specifier, expression));
    }

    fn emit_if(&mut self, id: BlockId, condition: &str) -> Option<BlockId> {
        self.line(&format!("if ({}) {{", c_condition(condition)));
        let when_true = self.branch_target(id, BranchTag::True);
        self.nested(when_true);
        if let Some(when_false) = self.branch_target(id, BranchTag::False) {
            self.line("} else {");
            self.nested(Some(when_false));
        }
        self.line("}");

        // Only the first path into a shared merge continues past it. When a
        // branch got there first, the successor is already visited.
        let merge = self.nearest_merge(id)?;
        trace!(block = id, merge, "resuming after merge");
        self.graph.successor(merge)
    }

    fn emit_loop(&mut self, id: BlockId, header: &str) -> Option<BlockId> {
        self.line(&format!("{} {{", header));
        self.stops.push(id);
        let body = self.branch_target(id, BranchTag::True);
        self.nested(body);
        self.stops.pop();
        self.line("}");
        self.branch_target(id, BranchTag::False)
    }

    fn emit_do_while(&mut self, entry: BlockId, condition_block: BlockId) -> Option<BlockId> {
        let condition = self
            .graph
            .block(condition_block)
            .map(|b| b.label.trim().to_string())
            .unwrap_or_default();

        self.line("do {");
        self.stops.push(condition_block);
        self.nested(Some(entry));
        self.stops.pop();
        self.line(&format!("}} while ({});", c_condition(&condition)));

        self.visited.insert(condition_block);
        self.branch_target(condition_block, BranchTag::False)
    }

    fn nested(&mut self, start: Option<BlockId>) {
        self.indent_level += 1;
        self.emit_from(start);
        self.indent_level -= 1;
    }

    fn branch_target(&self, id: BlockId, branch: BranchTag) -> Option<BlockId> {
        self.graph.branch_edge(id, branch).map(|e| e.target)
    }

    /// Breadth-first search over the successors of `id` for the closest Merge
    /// block. The search never crosses End or an enclosing stop.
    fn nearest_merge(&self, id: BlockId) -> Option<BlockId> {
        let mut seen = AHashSet::new();
        seen.insert(id);
        let mut queue: VecDeque<BlockId> =
            self.graph.outgoing_edges(id).map(|e| e.target).collect();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            let Some(block) = self.graph.block(current) else {
                continue;
            };
            if block.kind == BlockKind::Merge {
                return Some(current);
            }
            if block.kind == BlockKind::End || self.stops.contains(&current) {
                continue;
            }
            queue.extend(self.graph.outgoing_edges(current).map(|e| e.target));
        }
        None
    }

    fn line(&mut self, text: &str) {
        let width = self.indent_level * self.settings.indent_width;
        self.output.extend(std::iter::repeat_n(' ', width));
        self.output.push_str(text);
        self.output.push('\n');
    }
}

/// Entry block of a do-while body: the target of the condition's true edge,
/// otherwise found by walking back from the condition to its first predecessor
/// chain's Merge block.
fn do_body_entry(graph: &Graph, condition: BlockId) -> Option<BlockId> {
    if let Some(edge) = graph.branch_edge(condition, BranchTag::True) {
        if edge.target != condition {
            return Some(edge.target);
        }
    }
    let mut seen = AHashSet::new();
    seen.insert(condition);
    let mut current = graph
        .incoming_edges(condition)
        .map(|e| e.source)
        .find(|&source| source != condition)?;
    loop {
        let block = graph.block(current)?;
        if block.kind == BlockKind::Merge || !seen.insert(current) {
            return Some(current);
        }
        match graph.incoming_edges(current).map(|e| e.source).next() {
            Some(previous) if previous != condition => current = previous,
            _ => return Some(current),
        }
    }
}

/// Rewrites the evaluator's condition syntax into C: word connectives become
/// operators, a lone `&`/`|` is doubled and a lone `=` becomes `==`.
pub fn c_condition(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_suffix('?').unwrap_or(text).trim();
    let text = AND_WORD.replace_all(text, "&&");
    let text = OR_WORD.replace_all(&text, "||");
    let text = NOT_WORD.replace_all(&text, "!");

    let bytes = text.as_bytes();
    let mut result = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    for (i, ch) in text.char_indices() {
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + ch.len_utf8()).copied();
        match ch {
            '"' => {
                in_string = !in_string;
                result.push(ch);
            }
            '=' if !in_string
                && next != Some(b'=')
                && !matches!(prev, Some(b'=' | b'<' | b'>' | b'!')) =>
            {
                result.push_str("==");
            }
            '&' | '|' if !in_string && next != Some(ch as u8) && prev != Some(ch as u8) => {
                result.push(ch);
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }
    result
}
