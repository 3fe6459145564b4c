// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fmt::{Display, Formatter};

use crate::data::PipelineData;

/// Per-branch scheduling state.
///
/// ```text
/// Finished --offer--> Ready --dispatch--> Running --complete/fail--> Finished
/// Finished|Ready --begin_stop--> NeedStop --finish--> Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchStatus {
    /// Idle with no pending data.
    Finished,
    /// Idle with pending data, eligible for dispatch.
    Ready,
    /// Data handed to the worker.
    Running,
    /// Being torn down; neither accepts data nor dispatches.
    NeedStop,
}

impl Display for BranchStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            BranchStatus::Finished => "finished",
            BranchStatus::Ready => "ready",
            BranchStatus::Running => "running",
            BranchStatus::NeedStop => "need_stop",
        };
        f.write_str(s)
    }
}

/// How concurrently branches may run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// One branch runs at a time, in dependency order.
    #[default]
    Sync,
    /// The root branch only starts a new round once every other branch is
    /// `Finished`. Downstream branches run concurrently.
    ParallelWait,
    /// Every ready branch dispatches immediately.
    ParallelNoWait,
}

impl Display for SyncPolicy {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            SyncPolicy::Sync => "sync",
            SyncPolicy::ParallelWait => "parallel_wait",
            SyncPolicy::ParallelNoWait => "parallel_no_wait",
        };
        f.write_str(s)
    }
}

/// Controller-side record for one branch. Holds at most one undelivered item.
#[derive(Debug)]
pub struct BranchRuntimeState<T> {
    pending: Option<PipelineData<T>>,
    status: BranchStatus,
}

impl<T> Default for BranchRuntimeState<T> {
    fn default() -> Self {
        Self {
            pending: None,
            status: BranchStatus::Finished,
        }
    }
}

impl<T> BranchRuntimeState<T> {
    pub fn status(&self) -> BranchStatus {
        self.status
    }

    pub fn pending(&self) -> Option<&PipelineData<T>> {
        self.pending.as_ref()
    }

    /// `Finished -> Ready`. Hands the data back when the branch is not idle.
    pub fn offer(&mut self, data: PipelineData<T>) -> Result<(), PipelineData<T>> {
        if self.status != BranchStatus::Finished {
            return Err(data);
        }
        self.pending = Some(data);
        self.status = BranchStatus::Ready;
        Ok(())
    }

    /// Swap the pending item of a `Ready` branch, returning the round it replaced.
    pub fn replace_pending(&mut self, data: PipelineData<T>) -> Result<u64, PipelineData<T>> {
        if self.status != BranchStatus::Ready {
            return Err(data);
        }
        let replaced = self.pending.replace(data).map(|old| old.round()).unwrap_or_default();
        Ok(replaced)
    }

    /// `Ready -> Running`, moving the pending item out for the worker.
    pub fn take_for_dispatch(&mut self) -> Option<PipelineData<T>> {
        if self.status != BranchStatus::Ready {
            return None;
        }
        let data = self.pending.take()?;
        self.status = BranchStatus::Running;
        Some(data)
    }

    /// `Finished|Ready -> NeedStop`. Returns `None` when the branch cannot be
    /// torn down, otherwise whether pending data was dropped.
    pub fn begin_stop(&mut self) -> Option<bool> {
        match self.status {
            BranchStatus::Finished | BranchStatus::Ready => {
                self.status = BranchStatus::NeedStop;
                Some(self.pending.take().is_some())
            }
            BranchStatus::Running | BranchStatus::NeedStop => None,
        }
    }

    /// Back to `Finished`, dropping anything pending.
    pub fn finish(&mut self) {
        self.pending = None;
        self.status = BranchStatus::Finished;
    }
}
