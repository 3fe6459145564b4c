// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node-level task execution and payload side-channel events.

use crate::errors::TaskError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A node's task returned a failure. The failure still propagates unchanged.
///
/// # Log Level
/// `debug!` - the branch worker reports the contained failure at `warn!`
pub struct NodeTaskFailed<'a> {
    pub node_id: &'a str,
    pub task: &'a str,
    pub error: &'a TaskError,
}

impl Display for NodeTaskFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ({}) failed: {}",
            self.node_id, self.task, self.error
        )
    }
}

impl StructuredLog for NodeTaskFailed<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            task = self.task,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_task_failed",
            span_name = name,
            node_id = self.node_id,
            task = self.task,
        )
    }
}

/// Span context for one node invocation.
///
/// # Log Level
/// `trace!`
pub struct NodeExecution<'a> {
    pub node_id: &'a str,
    pub task: &'a str,
    pub round: u64,
}

impl Display for NodeExecution<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing node '{}' ({}) for round {}",
            self.node_id, self.task, self.round
        )
    }
}

impl StructuredLog for NodeExecution<'_> {
    fn log(&self) {
        tracing::trace!(
            node_id = self.node_id,
            task = self.task,
            round = self.round,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "node",
            span_name = name,
            node_id = self.node_id,
            task = self.task,
            round = self.round,
        )
    }
}

/// An attachment key was written twice; the newer value wins.
///
/// # Log Level
/// `debug!`
///
/// # Example
/// ```
/// use branchline::observability::messages::task::AttachmentOverwritten;
///
/// let msg = AttachmentOverwritten { key: "faces" };
/// assert_eq!(msg.to_string(), "Attachment 'faces' overwritten");
/// ```
pub struct AttachmentOverwritten<'a> {
    pub key: &'a str,
}

impl Display for AttachmentOverwritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Attachment '{}' overwritten", self.key)
    }
}

impl StructuredLog for AttachmentOverwritten<'_> {
    fn log(&self) {
        tracing::debug!(key = self.key, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("attachment_overwritten", span_name = name, key = self.key)
    }
}
