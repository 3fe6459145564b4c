// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Instrument;

use super::Node;
use crate::data::PipelineData;
use crate::errors::BranchFailure;
use crate::observability::messages::task::{NodeExecution, NodeTaskFailed};
use crate::observability::messages::StructuredLog;

/// An ordered chain of nodes run sequentially by one worker.
///
/// The branch is identified by its head node. Every node sees the same
/// [`PipelineData`], so attachments published early in the chain are visible
/// to later nodes.
#[derive(Debug)]
pub struct Branch<T> {
    nodes: Vec<Node<T>>,
    started: AtomicBool,
}

impl<T> Branch<T> {
    pub fn new(head: Node<T>) -> Self {
        Self {
            nodes: vec![head],
            started: AtomicBool::new(false),
        }
    }

    /// Append a node to the tail. Ignored once the branch has started.
    pub fn add_node(&mut self, node: Node<T>) -> bool {
        if self.is_started() {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn id(&self) -> &str {
        self.nodes[0].id()
    }

    pub fn last_id(&self) -> &str {
        self.nodes[self.nodes.len() - 1].id()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(Node::id).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) fn mark_started(&self) {
        self.started.store(true, Ordering::Release);
    }

    /// Run every node in order, stopping at the first failure.
    pub async fn process(&self, data: &mut PipelineData<T>) -> Result<(), BranchFailure> {
        for node in &self.nodes {
            let execution = NodeExecution {
                node_id: node.id(),
                task: node.task_name(),
                round: data.round(),
            };
            let span = execution.span("node_execution");
            span.in_scope(|| execution.log());

            if let Err(error) = node.process(data).instrument(span).await {
                NodeTaskFailed {
                    node_id: node.id(),
                    task: node.task_name(),
                    error: &error,
                }
                .log();
                return Err(BranchFailure {
                    branch_id: self.id().to_string(),
                    node_id: node.id().to_string(),
                    round: data.round(),
                    error,
                });
            }
        }
        Ok(())
    }

    pub async fn reset(&self) {
        for node in &self.nodes {
            node.reset().await;
        }
    }
}
