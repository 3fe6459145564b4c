// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topology invariants.
//!
//! Checks run in a fixed order and accumulate, so a caller sees every
//! violation at once:
//!
//! 1. **Isolation**: every node has at least one parent or one child
//! 2. **Adjacency**: every adjacency entry refers to existing nodes
//! 3. **Single parent** (only with `one_parent`): no node has two parents
//! 4. **Acyclicity**: DFS with a recursion stack; reports the cycle path
//!
//! Cycle detection only runs when the structural checks passed, since it
//! walks the adjacency records.

use std::collections::HashSet;

use super::Graph;
use crate::errors::GraphError;
use crate::observability::messages::{graph::TopologyViolation, StructuredLog};

impl<N> Graph<N> {
    /// `true` when every invariant holds. Each violation is logged; never fails.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(errors) => {
                for error in &errors {
                    TopologyViolation { error }.log();
                }
                false
            }
        }
    }

    /// Collect every invariant violation.
    pub fn validate(&self) -> Result<(), Vec<GraphError>> {
        let mut errors = Vec::new();

        for node in &self.nodes {
            if node.parents.is_empty() && node.children.is_empty() {
                errors.push(GraphError::IsolatedNode(node.id.clone()));
            }
            if self.one_parent && node.parents.len() > 1 {
                errors.push(GraphError::MultipleParents {
                    node_id: node.id.clone(),
                    parent_count: node.parents.len(),
                });
            }
        }

        let mut dangling: Vec<GraphError> = self
            .adjacency
            .iter()
            .flat_map(|(from, children)| children.iter().map(move |to| (from, to)))
            .filter(|(from, to)| !self.contains(from) || !self.contains(to))
            .map(|(from, to)| GraphError::DanglingAdjacency {
                from: from.clone(),
                to: to.clone(),
            })
            .collect();
        dangling.sort_by_key(|e| e.to_string());
        errors.extend(dangling);

        if errors.is_empty() {
            if let Some(cycle) = self.find_cycle() {
                errors.push(GraphError::CyclicGraph { cycle });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// First cycle found by DFS over the child lists, closed with its start node.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node.id.as_str()) {
                if let Some(cycle) =
                    self.dfs_cycle(&node.id, &mut visited, &mut rec_stack, &mut path)
                {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn dfs_cycle<'a>(
        &'a self,
        id: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(id);
        rec_stack.insert(id);
        path.push(id);

        let children = self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[]);
        for child in children {
            let child = child.as_str();
            if !visited.contains(child) {
                if let Some(cycle) = self.dfs_cycle(child, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(child) {
                let start = path.iter().position(|p| *p == child).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|p| p.to_string()).collect();
                cycle.push(child.to_string());
                return Some(cycle);
            }
        }

        rec_stack.remove(id);
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(one_parent: bool, ids: &[&str], links: &[(&str, &str)]) -> Graph<()> {
        let mut graph = Graph::with_one_parent(one_parent);
        for id in ids {
            graph.add_node(*id, ()).unwrap();
        }
        for (from, to) in links {
            graph.add_edge(from, to).unwrap();
        }
        graph
    }

    #[test]
    fn test_valid_fan_out_graph() {
        let graph = build(false, &["input", "a", "b", "c"], &[("input", "a"), ("a", "b"), ("a", "c")]);
        assert!(graph.is_valid());
        assert_eq!(graph.validate(), Ok(()));
    }

    #[test]
    fn test_isolated_node_is_reported() {
        let graph = build(false, &["input", "a", "orphan"], &[("input", "a")]);
        assert!(!graph.is_valid());
        assert_eq!(
            graph.validate(),
            Err(vec![GraphError::IsolatedNode("orphan".to_string())])
        );
    }

    #[test]
    fn test_one_parent_rejects_fan_in_only_when_enabled() {
        let ids = ["a", "b", "merge"];
        let links = [("a", "merge"), ("b", "merge")];

        assert!(build(false, &ids, &links).is_valid());

        let strict = build(true, &ids, &links);
        assert_eq!(
            strict.validate(),
            Err(vec![GraphError::MultipleParents {
                node_id: "merge".to_string(),
                parent_count: 2,
            }])
        );
    }

    #[test]
    fn test_one_parent_allows_entry_points() {
        let graph = build(true, &["input", "a", "b"], &[("input", "a"), ("a", "b")]);
        assert!(graph.is_valid());
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let graph = build(
            false,
            &["input", "a", "b", "c"],
            &[("input", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
        );

        match graph.validate() {
            Err(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(
                    errors[0],
                    GraphError::CyclicGraph {
                        cycle: vec![
                            "a".to_string(),
                            "b".to_string(),
                            "c".to_string(),
                            "a".to_string()
                        ],
                    }
                );
            }
            Ok(()) => panic!("Expected a cycle to be detected"),
        }
    }

    #[test]
    fn test_errors_accumulate() {
        let mut graph = build(true, &["a", "b", "m", "x", "y"], &[("a", "m"), ("b", "m")]);
        graph.add_node("z", ()).unwrap();
        let errors = graph.validate().unwrap_err();

        assert!(errors.contains(&GraphError::IsolatedNode("x".to_string())));
        assert!(errors.contains(&GraphError::IsolatedNode("y".to_string())));
        assert!(errors.contains(&GraphError::IsolatedNode("z".to_string())));
        assert!(errors.iter().any(|e| matches!(e, GraphError::MultipleParents { .. })));
    }
}
