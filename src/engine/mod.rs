// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Branch scheduling: partitioning, per-branch workers, and the controller
//! that dispatches between them.

mod branch;
mod controller;
mod node;
mod partition;
mod state;
mod worker;


pub use branch::Branch;
pub use controller::{ObserverId, Pipeline};
pub use node::Node;
pub use partition::partition;
pub use state::{BranchRuntimeState, BranchStatus, SyncPolicy};
pub use worker::{BranchWorker, CompletionObserver};
