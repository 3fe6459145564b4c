// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for topology construction and validation events.

use crate::errors::GraphError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A graph invariant does not hold.
///
/// # Log Level
/// `error!` - topology violations are fatal to pipeline startup
///
/// # Example
/// ```
/// use branchline::errors::GraphError;
/// use branchline::observability::messages::graph::TopologyViolation;
///
/// let error = GraphError::IsolatedNode("orphan".to_string());
/// let msg = TopologyViolation { error: &error };
///
/// tracing::error!("{}", msg);
/// ```
pub struct TopologyViolation<'a> {
    pub error: &'a GraphError,
}

impl Display for TopologyViolation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Topology violation: {}", self.error)
    }
}

impl StructuredLog for TopologyViolation<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("topology_violation", span_name = name, error = %self.error)
    }
}

/// Branch partitioning finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PartitionCompleted {
    pub branch_count: usize,
    pub node_count: usize,
}

impl Display for PartitionCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Partitioned {} nodes into {} branches",
            self.node_count, self.branch_count
        )
    }
}

impl StructuredLog for PartitionCompleted {
    fn log(&self) {
        tracing::info!(
            branch_count = self.branch_count,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "partition",
            span_name = name,
            branch_count = self.branch_count,
            node_count = self.node_count,
        )
    }
}

/// A parentless node other than the root heads its own branch but will never
/// receive external input.
///
/// # Log Level
/// `warn!` - Probably a configuration mistake
pub struct UnreachableEntryPoint<'a> {
    pub node_id: &'a str,
    pub root_id: &'a str,
}

impl Display for UnreachableEntryPoint<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' has no parents but input is only fed to root '{}'",
            self.node_id, self.root_id
        )
    }
}

impl StructuredLog for UnreachableEntryPoint<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, root_id = self.root_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "unreachable_entry_point",
            span_name = name,
            node_id = self.node_id,
            root_id = self.root_id,
        )
    }
}
