// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline, dispatch loop, and branch worker events.
//!
//! This module contains message types for logging events related to:
//! * Pipeline construction and shutdown
//! * Dispatch loop lifecycle and dispatch decisions
//! * Fan-out of branch results to child branches
//! * Contained branch round failures

use crate::engine::{BranchStatus, SyncPolicy};
use crate::errors::BranchFailure;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Pipeline constructed and partitioned.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use branchline::engine::SyncPolicy;
/// use branchline::observability::messages::engine::PipelineConstructed;
///
/// let msg = PipelineConstructed {
///     pipeline: "faces",
///     branch_count: 3,
///     node_count: 5,
///     sync_policy: SyncPolicy::ParallelWait,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineConstructed<'a> {
    pub pipeline: &'a str,
    pub branch_count: usize,
    pub node_count: usize,
    pub sync_policy: SyncPolicy,
}

impl Display for PipelineConstructed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' constructed: {} nodes in {} branches, sync_policy={}",
            self.pipeline, self.node_count, self.branch_count, self.sync_policy
        )
    }
}

impl StructuredLog for PipelineConstructed<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            branch_count = self.branch_count,
            node_count = self.node_count,
            sync_policy = %self.sync_policy,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            pipeline = self.pipeline,
            sync_policy = %self.sync_policy,
        )
    }
}

/// Dispatch loop spawned.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DispatchLoopStarted<'a> {
    pub pipeline: &'a str,
}

impl Display for DispatchLoopStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dispatch loop for pipeline '{}' started", self.pipeline)
    }
}

impl StructuredLog for DispatchLoopStarted<'_> {
    fn log(&self) {
        tracing::info!(pipeline = self.pipeline, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("dispatch_loop", span_name = name, pipeline = self.pipeline)
    }
}

/// Pipeline stopped: dispatch loop joined, workers stopped, states reset.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineStopped<'a> {
    pub pipeline: &'a str,
    pub branch_count: usize,
}

impl Display for PipelineStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' stopped, {} branches reset",
            self.pipeline, self.branch_count
        )
    }
}

impl StructuredLog for PipelineStopped<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            branch_count = self.branch_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pipeline_stop", span_name = name, pipeline = self.pipeline)
    }
}

/// External input refused because the root branch is busy.
///
/// # Log Level
/// `debug!` - Back-pressure is expected under load
pub struct InputRejected<'a> {
    pub pipeline: &'a str,
    pub root_status: BranchStatus,
}

impl Display for InputRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' rejected input: root branch is {}",
            self.pipeline, self.root_status
        )
    }
}

impl StructuredLog for InputRejected<'_> {
    fn log(&self) {
        tracing::debug!(
            pipeline = self.pipeline,
            root_status = %self.root_status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("input_rejected", span_name = name, pipeline = self.pipeline)
    }
}

/// Pending data handed to a branch worker.
///
/// # Log Level
/// `debug!`
pub struct BranchDispatched<'a> {
    pub branch_id: &'a str,
    pub round: u64,
}

impl Display for BranchDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatched round {} to branch '{}'",
            self.round, self.branch_id
        )
    }
}

impl StructuredLog for BranchDispatched<'_> {
    fn log(&self) {
        tracing::debug!(branch_id = self.branch_id, round = self.round, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "branch_dispatch",
            span_name = name,
            branch_id = self.branch_id,
            round = self.round,
        )
    }
}

/// A child branch was not idle when its parent completed; the clone is dropped.
///
/// # Log Level
/// `debug!` - At-most-one-pending-item back-pressure, not an error
pub struct FanOutDropped<'a> {
    pub from_branch: &'a str,
    pub to_branch: &'a str,
    pub to_status: BranchStatus,
    pub round: u64,
}

impl Display for FanOutDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped round {} from '{}' for busy branch '{}' ({})",
            self.round, self.from_branch, self.to_branch, self.to_status
        )
    }
}

impl StructuredLog for FanOutDropped<'_> {
    fn log(&self) {
        tracing::debug!(
            from_branch = self.from_branch,
            to_branch = self.to_branch,
            to_status = %self.to_status,
            round = self.round,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "fan_out_dropped",
            span_name = name,
            from_branch = self.from_branch,
            to_branch = self.to_branch,
        )
    }
}

/// A newer clone replaced an unconsumed one in a ready child branch.
///
/// # Log Level
/// `debug!`
pub struct FanOutCoalesced<'a> {
    pub from_branch: &'a str,
    pub to_branch: &'a str,
    pub replaced_round: u64,
    pub round: u64,
}

impl Display for FanOutCoalesced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Round {} from '{}' replaced pending round {} in branch '{}'",
            self.round, self.from_branch, self.replaced_round, self.to_branch
        )
    }
}

impl StructuredLog for FanOutCoalesced<'_> {
    fn log(&self) {
        tracing::debug!(
            from_branch = self.from_branch,
            to_branch = self.to_branch,
            replaced_round = self.replaced_round,
            round = self.round,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "fan_out_coalesced",
            span_name = name,
            from_branch = self.from_branch,
            to_branch = self.to_branch,
        )
    }
}

/// A branch round failed and was dropped; the branch is idle again.
///
/// # Log Level
/// `warn!` - The pipeline keeps running
///
/// # Example
/// ```
/// use branchline::errors::{BranchFailure, TaskError};
/// use branchline::observability::messages::engine::BranchRoundFailed;
///
/// let failure = BranchFailure {
///     branch_id: "detect".to_string(),
///     node_id: "detect".to_string(),
///     round: 3,
///     error: TaskError::failed("detector", "model not loaded"),
/// };
/// let msg = BranchRoundFailed { failure: &failure };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct BranchRoundFailed<'a> {
    pub failure: &'a BranchFailure,
}

impl Display for BranchRoundFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dropping round: {}", self.failure)
    }
}

impl StructuredLog for BranchRoundFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            branch_id = %self.failure.branch_id,
            node_id = %self.failure.node_id,
            round = self.failure.round,
            error = %self.failure.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "branch_round_failed",
            span_name = name,
            branch_id = %self.failure.branch_id,
            round = self.failure.round,
        )
    }
}

/// Branch worker loop spawned.
///
/// # Log Level
/// `debug!`
pub struct WorkerStarted<'a> {
    pub branch_id: &'a str,
}

impl Display for WorkerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker for branch '{}' started", self.branch_id)
    }
}

impl StructuredLog for WorkerStarted<'_> {
    fn log(&self) {
        tracing::debug!(branch_id = self.branch_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker", span_name = name, branch_id = self.branch_id)
    }
}

/// Branch worker loop exited.
///
/// # Log Level
/// `debug!`
pub struct WorkerStopped<'a> {
    pub branch_id: &'a str,
    pub drained: usize,
}

impl Display for WorkerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker for branch '{}' stopped, {} queued items drained",
            self.branch_id, self.drained
        )
    }
}

impl StructuredLog for WorkerStopped<'_> {
    fn log(&self) {
        tracing::debug!(branch_id = self.branch_id, drained = self.drained, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker_stop", span_name = name, branch_id = self.branch_id)
    }
}

/// A branch was torn down through `NeedStop`.
///
/// # Log Level
/// `info!`
pub struct BranchTornDown<'a> {
    pub branch_id: &'a str,
    pub dropped_pending: bool,
}

impl Display for BranchTornDown<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Branch '{}' torn down (pending data dropped: {})",
            self.branch_id, self.dropped_pending
        )
    }
}

impl StructuredLog for BranchTornDown<'_> {
    fn log(&self) {
        tracing::info!(
            branch_id = self.branch_id,
            dropped_pending = self.dropped_pending,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("branch_teardown", span_name = name, branch_id = self.branch_id)
    }
}

/// An observer panicked while being notified. The panic is contained.
///
/// # Log Level
/// `warn!`
///
/// # Example
/// ```
/// use branchline::observability::messages::engine::ObserverPanicked;
///
/// let msg = ObserverPanicked {
///     branch_id: "detect",
///     message: "index out of bounds",
/// };
/// assert_eq!(
///     msg.to_string(),
///     "Observer panicked while handling branch 'detect': index out of bounds"
/// );
/// ```
pub struct ObserverPanicked<'a> {
    pub branch_id: &'a str,
    pub message: &'a str,
}

impl Display for ObserverPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Observer panicked while handling branch '{}': {}",
            self.branch_id, self.message
        )
    }
}

impl StructuredLog for ObserverPanicked<'_> {
    fn log(&self) {
        tracing::warn!(
            branch_id = self.branch_id,
            message = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("observer_panic", span_name = name, branch_id = self.branch_id)
    }
}
