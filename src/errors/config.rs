// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use super::pipeline::format_errors;
use super::GraphError;

/// Errors raised while loading a topology document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read topology file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse topology: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Topology validation failed:\n{}", format_errors(.0))]
    Validation(Vec<GraphError>),
}
