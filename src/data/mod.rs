// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The payload envelope that flows through a pipeline.

mod meta_storage;
mod pipeline_data;

pub use meta_storage::MetaStorage;
pub use pipeline_data::PipelineData;
