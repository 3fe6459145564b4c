// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the scheduler.
//!
//! Every diagnostic emitted by the crate is a message struct from
//! [`messages`]. Each message implements `Display` for the human-readable
//! line and [`messages::StructuredLog`] to emit it through `tracing` with
//! structured fields at its documented level.
//!
//! # Usage
//!
//! ```rust
//! use branchline::observability::messages::StructuredLog;
//! use branchline::observability::messages::engine::BranchDispatched;
//!
//! BranchDispatched {
//!     branch_id: "decode",
//!     round: 7,
//! }
//! .log();
//! ```

pub mod messages;
