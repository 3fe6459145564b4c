// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Directed graph of named nodes.
//!
//! Nodes live in an arena in insertion order and are addressed by their
//! string ID. Edges are stored as ID lists on each [`GraphNode`] plus a
//! derived adjacency set, so no node ever owns another node.
//!
//! # Examples
//!
//! ```
//! use branchline::graph::Graph;
//!
//! let mut graph = Graph::new();
//! graph.add_node("input", ())?;
//! graph.add_node("detect", ())?;
//! graph.add_edge("input", "detect")?;
//!
//! assert!(graph.is_valid());
//! let children: Vec<&str> = graph.get_children("input")?.iter().map(|n| n.id()).collect();
//! assert_eq!(children, vec!["detect"]);
//! # Ok::<(), branchline::errors::GraphError>(())
//! ```

mod validation;

use std::collections::{HashMap, HashSet};

use crate::errors::GraphError;

/// One vertex: identity, ordered edge lists, and the node value it carries.
#[derive(Debug, Clone)]
pub struct GraphNode<N> {
    id: String,
    parents: Vec<String>,
    children: Vec<String>,
    value: N,
}

impl<N> GraphNode<N> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parent IDs in the order the edges were added.
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Child IDs in the order the edges were added.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn value(&self) -> &N {
        &self.value
    }
}

#[derive(Debug, Clone)]
pub struct Graph<N> {
    nodes: Vec<GraphNode<N>>,
    index: HashMap<String, usize>,
    adjacency: HashMap<String, HashSet<String>>,
    one_parent: bool,
}

impl<N> Default for Graph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Graph<N> {
    pub fn new() -> Self {
        Self::with_one_parent(false)
    }

    /// Create a graph that, once validated, allows at most one parent per node.
    pub fn with_one_parent(one_parent: bool) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: HashMap::new(),
            one_parent,
        }
    }

    pub fn one_parent(&self) -> bool {
        self.one_parent
    }

    pub fn add_node(&mut self, id: impl Into<String>, value: N) -> Result<(), GraphError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }

        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(GraphNode {
            id,
            parents: Vec::new(),
            children: Vec::new(),
            value,
        });
        Ok(())
    }

    /// Link `from` to `to`.
    ///
    /// Rejects self-loops, unknown endpoints, and an edge already recorded in
    /// either direction.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from.to_string()));
        }
        let from_index = self.position(from)?;
        let to_index = self.position(to)?;

        if self.has_edge(from, to) || self.has_edge(to, from) {
            return Err(GraphError::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.nodes[from_index].children.push(to.to_string());
        self.nodes[to_index].parents.push(from.to_string());
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        Ok(())
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.adjacency
            .get(from)
            .is_some_and(|children| children.contains(to))
    }

    pub fn get(&self, id: &str) -> Option<&GraphNode<N>> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_parents(&self, id: &str) -> Result<Vec<&GraphNode<N>>, GraphError> {
        let node = &self.nodes[self.position(id)?];
        Ok(self.resolve(&node.parents))
    }

    pub fn get_children(&self, id: &str) -> Result<Vec<&GraphNode<N>>, GraphError> {
        let node = &self.nodes[self.position(id)?];
        Ok(self.resolve(&node.children))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode<N>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Graph entry points, in insertion order.
    pub fn nodes_without_parents(&self) -> Vec<&GraphNode<N>> {
        self.nodes.iter().filter(|n| n.parents.is_empty()).collect()
    }

    /// Fan-out points, in insertion order.
    pub fn nodes_with_multiple_children(&self) -> Vec<&GraphNode<N>> {
        self.nodes.iter().filter(|n| n.children.len() > 1).collect()
    }

    fn position(&self, id: &str) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    fn resolve(&self, ids: &[String]) -> Vec<&GraphNode<N>> {
        ids.iter().filter_map(|id| self.get(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(ids: &[&str]) -> Graph<()> {
        let mut graph = Graph::new();
        for id in ids {
            graph.add_node(*id, ()).unwrap();
        }
        graph
    }

    #[test]
    fn test_add_node_rejects_duplicates() {
        let mut graph = graph_of(&["a"]);
        assert_eq!(
            graph.add_node("a", ()),
            Err(GraphError::DuplicateNode("a".to_string()))
        );
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_add_edge_errors_table_driven() {
        struct TestCase {
            name: &'static str,
            from: &'static str,
            to: &'static str,
            expected: GraphError,
        }

        let test_cases = vec![
            TestCase {
                name: "self loop",
                from: "a",
                to: "a",
                expected: GraphError::SelfLoop("a".to_string()),
            },
            TestCase {
                name: "unknown source",
                from: "ghost",
                to: "b",
                expected: GraphError::UnknownNode("ghost".to_string()),
            },
            TestCase {
                name: "unknown target",
                from: "a",
                to: "ghost",
                expected: GraphError::UnknownNode("ghost".to_string()),
            },
            TestCase {
                name: "same direction duplicate",
                from: "a",
                to: "b",
                expected: GraphError::DuplicateEdge {
                    from: "a".to_string(),
                    to: "b".to_string(),
                },
            },
            TestCase {
                name: "reverse direction duplicate",
                from: "b",
                to: "a",
                expected: GraphError::DuplicateEdge {
                    from: "b".to_string(),
                    to: "a".to_string(),
                },
            },
        ];

        for case in test_cases {
            let mut graph = graph_of(&["a", "b"]);
            graph.add_edge("a", "b").unwrap();
            assert_eq!(
                graph.add_edge(case.from, case.to),
                Err(case.expected),
                "case: {}",
                case.name
            );
        }
    }

    #[test]
    fn test_edges_keep_lists_and_adjacency_in_agreement() {
        let mut graph = graph_of(&["a", "b", "c"]);
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "c").unwrap();

        let a = graph.get("a").unwrap();
        assert_eq!(a.children(), &["b".to_string(), "c".to_string()]);
        assert_eq!(graph.get("c").unwrap().parents(), &["a".to_string()]);
        assert!(graph.has_edge("a", "c"));
        assert!(!graph.has_edge("c", "a"));
    }

    #[test]
    fn test_get_parents_and_children_resolve_nodes() {
        let mut graph = graph_of(&["a", "b", "c"]);
        graph.add_edge("a", "c").unwrap();
        graph.add_edge("b", "c").unwrap();

        let parents: Vec<&str> = graph
            .get_parents("c")
            .unwrap()
            .iter()
            .map(|n| n.id())
            .collect();
        assert_eq!(parents, vec!["a", "b"]);
        assert!(graph.get_children("c").unwrap().is_empty());
        assert_eq!(
            graph.get_children("nope").unwrap_err(),
            GraphError::UnknownNode("nope".to_string())
        );
    }

    #[test]
    fn test_entry_and_fan_out_queries() {
        let mut graph = graph_of(&["input", "a", "b", "c"]);
        graph.add_edge("input", "a").unwrap();
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "c").unwrap();

        let roots: Vec<&str> = graph.nodes_without_parents().iter().map(|n| n.id()).collect();
        let fan_outs: Vec<&str> = graph
            .nodes_with_multiple_children()
            .iter()
            .map(|n| n.id())
            .collect();
        assert_eq!(roots, vec!["input"]);
        assert_eq!(fan_outs, vec!["a"]);
    }
}
