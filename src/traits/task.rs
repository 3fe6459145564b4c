// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::TaskSettings;
use crate::data::PipelineData;
use crate::errors::TaskError;

/// The unit of work wrapped by a graph node.
///
/// A task receives the payload envelope by mutable reference: it may replace
/// or mutate the payload and publish attachments for later nodes in the same
/// branch. Returning an error drops the current round for the owning branch.
#[async_trait]
pub trait Task<T>: Send {
    /// Apply settings resolved from the topology. Called once, right after
    /// construction through the registry.
    fn set_settings(&mut self, _settings: &TaskSettings) -> Result<(), TaskError> {
        Ok(())
    }

    /// Clear any per-run state.
    fn reset(&mut self) {}

    async fn process(&mut self, data: &mut PipelineData<T>) -> Result<(), TaskError>;

    fn name(&self) -> &'static str;
}
