use crate::trace::TraceFormatter;
use crate::value::Value;
use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Local bindings of one active function call.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub function: String,
    locals: AHashMap<String, Value>,
}

impl Frame {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            locals: AHashMap::new(),
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Consumes the frame and returns one binding, used to read a return value.
    pub fn take(mut self, name: &str) -> Option<Value> {
        self.locals.remove(name)
    }
}

/// Variable scope: a call stack of frames on top of a single global frame.
///
/// Reads check the top frame first and fall back to the globals. Writes go to the
/// top frame while a call is active, otherwise to the globals.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    globals: AHashMap<String, Value>,
    frames: Vec<Frame>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames
            .last()
            .and_then(|frame| frame.locals.get(name))
            .or_else(|| self.globals.get(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.locals.insert(name.into(), value);
            }
            None => {
                self.globals.insert(name.into(), value);
            }
        }
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Number of active call frames (0 while executing the main graph).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.globals.clear();
        self.frames.clear();
    }

    /// Every binding currently visible: globals shadowed by the top frame.
    pub fn visible(&self) -> impl Iterator<Item = (&String, &Value)> {
        let top = self.frames.last();
        self.globals
            .iter()
            .filter(move |(name, _)| top.is_none_or(|f| !f.locals.contains_key(name.as_str())))
            .chain(top.into_iter().flat_map(|f| f.locals.iter()))
    }

    /// A sorted copy of the visible bindings, handed to listeners after each step.
    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot(
            self.visible()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// An immutable, name-ordered copy of the visible variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopeSnapshot(pub BTreeMap<String, Value>);

impl ScopeSnapshot {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl fmt::Display for ScopeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TraceFormatter::format_bindings(self))
    }
}
