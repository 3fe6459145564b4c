// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::{GraphError, RegistryError};

/// Errors that prevent a pipeline from being constructed or addressed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline topology is invalid:\n{}", format_errors(.0))]
    InvalidTopology(Vec<GraphError>),

    #[error("Failed to create the task for node '{node_id}': {source}")]
    NodeCreation {
        node_id: String,
        #[source]
        source: RegistryError,
    },

    #[error("Pipeline has no entry point: every node has at least one parent")]
    NoEntryPoint,

    #[error("Pipeline must be constructed inside a tokio runtime")]
    NoRuntime,

    #[error("Branch '{0}' does not exist")]
    UnknownBranch(String),
}

pub(crate) fn format_errors(errors: &[GraphError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
