//! Strict structural checks for hosts that want to reject malformed flowcharts
//! before running or translating them. Neither the interpreter nor the code
//! generator calls these; both degrade gracefully on bad graphs instead.

use super::definition::{BlockKind, BranchTag, Graph};
use super::function::Program;
use crate::error::GraphError;

pub fn validate_graph(graph: &Graph) -> Result<(), GraphError> {
    validate_edges_reference_existing_blocks(graph)?;
    validate_single_start_and_end(graph)?;
    validate_branch_edges(graph)?;
    validate_no_dead_ends(graph)?;
    validate_single_successor(graph)?;
    validate_merge_blocks(graph)?;
    Ok(())
}

pub fn validate_program(program: &Program) -> Result<(), GraphError> {
    validate_graph(&program.main)?;
    for function in program.functions.iter() {
        validate_graph(&function.body).map_err(|e| GraphError::InvalidFunction {
            function: function.name.clone(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}

pub fn validate_edges_reference_existing_blocks(graph: &Graph) -> Result<(), GraphError> {
    for edge in &graph.edges {
        for endpoint in [edge.source, edge.target] {
            if graph.block(endpoint).is_none() {
                return Err(GraphError::EdgeEndpointMissing {
                    source_block: edge.source,
                    target_block: edge.target,
                    missing: endpoint,
                });
            }
        }
    }
    Ok(())
}

pub fn validate_single_start_and_end(graph: &Graph) -> Result<(), GraphError> {
    let mut starts = graph.blocks.iter().filter(|b| b.kind == BlockKind::Start);
    if starts.next().is_none() {
        return Err(GraphError::MissingStart);
    }
    if let Some(extra) = starts.next() {
        return Err(GraphError::DuplicateStart(extra.id));
    }

    let mut ends = graph.blocks.iter().filter(|b| b.kind == BlockKind::End);
    if ends.next().is_none() {
        return Err(GraphError::MissingEnd);
    }
    if let Some(extra) = ends.next() {
        return Err(GraphError::DuplicateEnd(extra.id));
    }
    Ok(())
}

pub fn validate_branch_edges(graph: &Graph) -> Result<(), GraphError> {
    for block in graph.blocks.iter().filter(|b| b.kind.is_branching()) {
        for branch in [BranchTag::True, BranchTag::False] {
            if graph.edge_with_branch(block.id, branch).is_none() {
                return Err(GraphError::MissingBranch {
                    block: block.id,
                    branch,
                });
            }
        }
    }
    Ok(())
}

pub fn validate_no_dead_ends(graph: &Graph) -> Result<(), GraphError> {
    for block in graph.blocks.iter().filter(|b| b.kind != BlockKind::End) {
        if graph.outgoing_edges(block.id).next().is_none() {
            return Err(GraphError::DeadEnd(block.id));
        }
    }
    Ok(())
}

/// Every block that is neither branching nor End continues along exactly one edge.
pub fn validate_single_successor(graph: &Graph) -> Result<(), GraphError> {
    for block in graph
        .blocks
        .iter()
        .filter(|b| b.kind != BlockKind::End && !b.kind.is_branching())
    {
        if graph.outgoing_edges(block.id).count() != 1 {
            return Err(GraphError::FanOut(block.id));
        }
    }
    Ok(())
}

pub fn validate_merge_blocks(graph: &Graph) -> Result<(), GraphError> {
    for block in graph.blocks.iter().filter(|b| b.kind == BlockKind::Merge) {
        if !block.label.trim().is_empty() {
            return Err(GraphError::LabeledMerge(block.id));
        }
        if graph.incoming_edges(block.id).next().is_none() {
            return Err(GraphError::UnreachedMerge(block.id));
        }
    }
    Ok(())
}
