//! Recording and formatting of interpreter runs.

use crate::graph::{Block, BlockId, BlockKind};
use crate::interpreter::ExecutionListener;
use crate::scope::ScopeSnapshot;
use crate::value::Value;
use itertools::Itertools;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Step {
        block: BlockId,
        kind: BlockKind,
        label: String,
        variables: ScopeSnapshot,
    },
    InputRequired(String),
    Error(String),
    Complete,
}

/// A listener that records every event of a run.
///
/// Clones share the same log, so one clone can be handed to the interpreter
/// and another kept to inspect the run afterwards.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.log().clone()
    }

    /// Ids of the executed blocks, in order.
    pub fn visited(&self) -> Vec<BlockId> {
        self.log()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Step { block, .. } => Some(*block),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.log()
            .iter()
            .filter(|event| matches!(event, TraceEvent::Complete))
            .count()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    pub fn format(&self) -> String {
        TraceFormatter::format_trace(&self.log())
    }

    fn log(&self) -> MutexGuard<'_, Vec<TraceEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ExecutionListener for ExecutionTrace {
    fn on_step(&mut self, block: &Block, variables: &ScopeSnapshot, _output: &str) {
        self.log().push(TraceEvent::Step {
            block: block.id,
            kind: block.kind,
            label: block.label.clone(),
            variables: variables.clone(),
        });
    }

    fn on_complete(&mut self) {
        self.log().push(TraceEvent::Complete);
    }

    fn on_error(&mut self, message: &str) {
        self.log().push(TraceEvent::Error(message.to_string()));
    }

    fn on_input_required(&mut self, variable: &str) {
        self.log().push(TraceEvent::InputRequired(variable.to_string()));
    }
}

/// Formats recorded events into a human-readable log.
pub struct TraceFormatter;

impl TraceFormatter {
    /// One line per event.
    pub fn format_trace(events: &[TraceEvent]) -> String {
        let mut result = String::new();
        for event in events {
            result.push_str(&Self::format_event(event));
            result.push('\n');
        }
        result
    }

    pub fn format_event(event: &TraceEvent) -> String {
        match event {
            TraceEvent::Step {
                block,
                kind,
                label,
                variables,
            } => {
                let mut line = format!("[{}] {}", block, kind);
                if !label.is_empty() {
                    line.push_str(&format!(" `{}`", label));
                }
                if !variables.is_empty() {
                    line.push_str(" | ");
                    line.push_str(&Self::format_bindings(variables));
                }
                line
            }
            TraceEvent::InputRequired(variable) => format!("input required: {}", variable),
            TraceEvent::Error(message) => format!("error: {}", message),
            TraceEvent::Complete => "complete".to_string(),
        }
    }

    /// `name = value` pairs in name order. Strings are quoted.
    pub fn format_bindings(variables: &ScopeSnapshot) -> String {
        variables
            .iter()
            .map(|(name, value)| format!("{} = {}", name, Self::format_value(value)))
            .join(", ")
    }

    fn format_value(value: &Value) -> String {
        match value {
            Value::Str(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}
