// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::time::Duration;

use super::TaskSettings;
use crate::engine::SyncPolicy;
use crate::errors::GraphError;
use crate::graph::Graph;

/// A parsed pipeline description: the nodes, the links between them, and the
/// scheduling options the controller runs them under.
///
/// # Example
/// ```yaml
/// name: text_fanout
/// sync_policy: parallel_no_wait
/// options:
///   fan_out_policy: coalesce_newest
/// nodes:
///   - id: input
///     task: passthrough
///   - id: upper
///     task: change_text_case
///     options:
///       mode: upper
///   - id: reverse
///     task: reverse_text
/// links:
///   - [input, upper]
///   - [input, reverse]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineTopology {
    pub name: String,
    #[serde(default)]
    pub sync_policy: SyncPolicy,
    #[serde(default)]
    pub options: PipelineOptions,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(flatten)]
    pub settings: TaskSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Every non-entry node must have exactly one parent.
    pub one_parent: bool,
    pub fan_out_policy: FanOutPolicy,
    /// Upper bound on one branch round. Unbounded when absent.
    pub process_timeout_ms: Option<u64>,
    pub observer_delivery: ObserverDelivery,
}

impl PipelineOptions {
    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_ms.map(Duration::from_millis)
    }
}

/// What happens to a fan-out clone whose target branch is not idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutPolicy {
    /// The clone is discarded when the child is not `Finished`.
    #[default]
    DropWhenBusy,
    /// A child that is `Ready` has its pending clone replaced by the newer
    /// one. `Running` and `NeedStop` children still drop.
    CoalesceNewest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverDelivery {
    /// Observers run on the worker task that completed the round.
    #[default]
    Sync,
    /// Each notification is spawned onto the runtime.
    Async,
}

impl PipelineTopology {
    /// Checks the topology without constructing any task, returning every
    /// violation found.
    pub fn validate(&self) -> Result<(), Vec<GraphError>> {
        let mut graph = Graph::with_one_parent(self.options.one_parent);
        let mut errors = Vec::new();

        for node in &self.nodes {
            if let Err(e) = graph.add_node(node.id.clone(), ()) {
                errors.push(e);
            }
        }

        for (from, to) in &self.links {
            if let Err(e) = graph.add_edge(from, to) {
                errors.push(e);
            }
        }

        if let Err(graph_errors) = graph.validate() {
            errors.extend(graph_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
