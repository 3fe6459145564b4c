// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while building or validating a processing graph.

use thiserror::Error;

/// Topology errors. Construction errors (`DuplicateNode`, `SelfLoop`,
/// `UnknownNode`, `DuplicateEdge`) are returned by the mutating graph calls;
/// the remaining variants are produced by [`crate::graph::Graph::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node '{0}' already exists in the graph")]
    DuplicateNode(String),

    #[error("Node '{0}' cannot link to itself")]
    SelfLoop(String),

    #[error("Node '{0}' does not exist in the graph")]
    UnknownNode(String),

    #[error("Edge between '{from}' and '{to}' already exists")]
    DuplicateEdge { from: String, to: String },

    #[error("Node '{0}' has neither parents nor children")]
    IsolatedNode(String),

    #[error("Node '{node_id}' has {parent_count} parents but the graph allows at most one")]
    MultipleParents {
        node_id: String,
        parent_count: usize,
    },

    #[error("Adjacency entry '{from}' -> '{to}' refers to a node that does not exist")]
    DanglingAdjacency { from: String, to: String },

    #[error("Cyclic link detected: {}", .cycle.join(" -> "))]
    CyclicGraph { cycle: Vec<String> },
}
