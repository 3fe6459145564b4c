// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // topology, task settings + registry
pub mod data;       // payload envelope + attachments
pub mod engine;     // branch scheduling
pub mod errors;     // error handling
pub mod graph;      // topology graph + validation
pub mod observability;
pub mod tasks;      // built-in tasks
pub mod traits;     // task + observer contracts
