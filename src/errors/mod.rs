// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod graph;
mod pipeline;
mod task;

pub use config::ConfigError;
pub use graph::GraphError;
pub use pipeline::PipelineError;
pub use task::{BranchFailure, RegistryError, TaskError};
pub(crate) use task::panic_message;
