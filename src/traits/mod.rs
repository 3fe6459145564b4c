// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod observer;
pub mod task;

pub use observer::PipelineObserver;
pub use task::Task;
