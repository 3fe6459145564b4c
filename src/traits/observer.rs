// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::data::PipelineData;
use crate::errors::BranchFailure;

/// Subscriber to pipeline results.
///
/// Outputs are delivered on the worker task that completed the round and
/// failures on the dispatch loop, unless the pipeline is configured with
/// asynchronous observer delivery. Observers must not block.
pub trait PipelineObserver<T>: Send + Sync {
    /// A branch finished a round. `data` is the branch's result, shared with
    /// the clones handed to child branches.
    fn on_output(&self, branch_id: &str, data: &Arc<PipelineData<T>>);

    /// A branch round failed and was dropped.
    fn on_failure(&self, _failure: &BranchFailure) {}
}
