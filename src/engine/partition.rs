// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Splits a validated graph into branches.
//!
//! A node starts a new branch when it has no parents, when its parent fans
//! out to more than one child, or when it merges more than one parent.
//! Every other node joins the branch of its single parent. Branches are
//! returned in node declaration order of their heads.

use std::collections::HashSet;

use crate::graph::Graph;
use crate::observability::messages::graph::PartitionCompleted;
use crate::observability::messages::StructuredLog;

/// Node IDs of every branch, head first.
pub fn partition<N>(graph: &Graph<N>) -> Vec<Vec<String>> {
    let roots = branch_roots(graph);
    let mut assigned: HashSet<&str> = HashSet::new();
    let mut branches = Vec::new();

    for node in graph.nodes().filter(|n| roots.contains(n.id())) {
        let mut chain = vec![node.id().to_string()];
        assigned.insert(node.id());

        let mut current = node;
        while let Some(next_id) = current.children().first() {
            if roots.contains(next_id.as_str()) || assigned.contains(next_id.as_str()) {
                break;
            }
            let Some(next) = graph.get(next_id) else {
                break;
            };
            chain.push(next.id().to_string());
            assigned.insert(next.id());
            current = next;
        }

        branches.push(chain);
    }

    PartitionCompleted {
        branch_count: branches.len(),
        node_count: assigned.len(),
    }
    .log();

    branches
}

fn branch_roots<N>(graph: &Graph<N>) -> HashSet<&str> {
    let mut roots: HashSet<&str> = graph
        .nodes_without_parents()
        .into_iter()
        .map(|n| n.id())
        .collect();

    for fan_out in graph.nodes_with_multiple_children() {
        roots.extend(fan_out.children().iter().map(String::as_str));
    }

    roots.extend(
        graph
            .nodes()
            .filter(|n| n.parents().len() > 1)
            .map(|n| n.id()),
    );

    roots
}
