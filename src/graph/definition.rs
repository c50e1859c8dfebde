use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a block inside one graph. Blocks added through
/// [`Graph::add_block`] get their arena index as id.
pub type BlockId = usize;

/// The eleven block kinds a flowchart can contain.
///
/// Deserialization also accepts the editor's style constants (`"FOR_LOOP"`, ...)
/// and the deprecated `PROCESS` / `IO` aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(alias = "START")]
    Start,
    #[serde(alias = "END")]
    End,
    #[serde(alias = "ASSIGNMENT", alias = "PROCESS")]
    Assignment,
    #[serde(alias = "INPUT")]
    Input,
    #[serde(alias = "OUTPUT", alias = "IO")]
    Output,
    #[serde(alias = "CONDITIONAL")]
    Conditional,
    #[serde(alias = "LOOP")]
    Loop,
    #[serde(alias = "FOR_LOOP")]
    ForLoop,
    #[serde(alias = "DO_WHILE")]
    DoWhile,
    #[serde(alias = "MERGE")]
    Merge,
    #[serde(alias = "FUNCTION_CALL")]
    FunctionCall,
}

impl BlockKind {
    /// Kinds whose outgoing edges are split into a True and a False branch.
    pub fn is_branching(self) -> bool {
        matches!(
            self,
            BlockKind::Conditional | BlockKind::Loop | BlockKind::ForLoop | BlockKind::DoWhile
        )
    }

    pub fn is_loop(self) -> bool {
        matches!(self, BlockKind::Loop | BlockKind::ForLoop | BlockKind::DoWhile)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Start => "Start",
            BlockKind::End => "End",
            BlockKind::Assignment => "Assignment",
            BlockKind::Input => "Input",
            BlockKind::Output => "Output",
            BlockKind::Conditional => "Conditional",
            BlockKind::Loop => "Loop",
            BlockKind::ForLoop => "ForLoop",
            BlockKind::DoWhile => "DoWhile",
            BlockKind::Merge => "Merge",
            BlockKind::FunctionCall => "FunctionCall",
        };
        f.write_str(name)
    }
}

/// Human labels accepted for each branch when an edge carries no [`BranchTag`].
const TRUE_LABELS: [&str; 4] = ["True", "Yes", "Sì", "Si"];
const FALSE_LABELS: [&str; 2] = ["False", "No"];

/// Structural marker on edges leaving a branching block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BranchTag {
    True,
    False,
}

impl From<bool> for BranchTag {
    fn from(value: bool) -> Self {
        if value { BranchTag::True } else { BranchTag::False }
    }
}

impl fmt::Display for BranchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchTag::True => f.write_str("True"),
            BranchTag::False => f.write_str("False"),
        }
    }
}

/// A single block of the flowchart. `label` is the raw text typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    #[serde(default)]
    pub label: String,
}

/// A directed connection between two blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: BlockId,
    pub target: BlockId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub branch: Option<BranchTag>,
}

/// An arena of blocks and edges. Both the interpreter and the code generator
/// only ever read from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub blocks: Vec<Block>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block and returns its id.
    pub fn add_block(&mut self, kind: BlockKind, label: impl Into<String>) -> BlockId {
        let id = self.blocks.len();
        self.blocks.push(Block {
            id,
            kind,
            label: label.into(),
        });
        id
    }

    /// Connects two blocks with an untagged, unlabeled edge.
    pub fn connect(&mut self, source: BlockId, target: BlockId) {
        self.edges.push(Edge {
            source,
            target,
            label: None,
            branch: None,
        });
    }

    /// Connects a branching block to one of its successors, tagging the edge.
    pub fn connect_branch(&mut self, source: BlockId, target: BlockId, branch: BranchTag) {
        let label = match branch {
            BranchTag::True => "True",
            BranchTag::False => "False",
        };
        self.edges.push(Edge {
            source,
            target,
            label: Some(label.to_string()),
            branch: Some(branch),
        });
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        // Fast path for arena-built graphs, linear scan for deserialized ones.
        match self.blocks.get(id) {
            Some(block) if block.id == id => Some(block),
            _ => self.blocks.iter().find(|b| b.id == id),
        }
    }

    /// The first Start block, if any.
    pub fn start(&self) -> Option<BlockId> {
        self.first_of_kind(BlockKind::Start)
    }

    /// The first End block, if any.
    pub fn end(&self) -> Option<BlockId> {
        self.first_of_kind(BlockKind::End)
    }

    fn first_of_kind(&self, kind: BlockKind) -> Option<BlockId> {
        self.blocks.iter().find(|b| b.kind == kind).map(|b| b.id)
    }

    /// Outgoing edges of `block`, in insertion order.
    pub fn outgoing_edges(&self, block: BlockId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.source == block)
    }

    /// Incoming edges of `block`, in insertion order.
    pub fn incoming_edges(&self, block: BlockId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.target == block)
    }

    pub fn edge_with_branch(&self, block: BlockId, branch: BranchTag) -> Option<&Edge> {
        self.outgoing_edges(block)
            .find(|e| e.branch == Some(branch))
    }

    /// Finds an outgoing edge whose human label equals `text`, ignoring case and
    /// surrounding whitespace.
    pub fn edge_with_label(&self, block: BlockId, text: &str) -> Option<&Edge> {
        self.outgoing_edges(block).find(|e| {
            e.label
                .as_deref()
                .is_some_and(|l| l.trim().eq_ignore_ascii_case(text.trim()))
        })
    }

    /// The edge taken when `block` evaluates to `branch`: the tagged edge if there
    /// is one, otherwise an edge whose label reads as that branch.
    pub fn branch_edge(&self, block: BlockId, branch: BranchTag) -> Option<&Edge> {
        let labels: &[&str] = match branch {
            BranchTag::True => &TRUE_LABELS,
            BranchTag::False => &FALSE_LABELS,
        };
        self.edge_with_branch(block, branch).or_else(|| {
            labels
                .iter()
                .find_map(|label| self.edge_with_label(block, label))
        })
    }

    /// The target of the first outgoing edge; `None` means the path ends here.
    pub fn successor(&self, block: BlockId) -> Option<BlockId> {
        self.outgoing_edges(block).next().map(|e| e.target)
    }
}
