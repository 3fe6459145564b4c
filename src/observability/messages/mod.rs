// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Messages are organized by subsystem:
//!
//! * `engine` - pipeline, dispatch loop, and branch worker events
//! * `graph` - topology construction and validation events
//! * `task` - node-level task execution and payload side-channel events

pub mod engine;
pub mod graph;
pub mod task;

use tracing::Span;

/// A message that knows how to emit itself through `tracing`.
pub trait StructuredLog {
    /// Emit the message at its documented level with structured fields.
    fn log(&self);

    /// Open a span carrying the same fields as the message.
    fn span(&self, name: &str) -> Span;
}
