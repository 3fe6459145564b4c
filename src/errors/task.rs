// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by tasks, the task registry, and branch workers.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single task invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Task '{task}' rejected its settings: {reason}")]
    InvalidSettings { task: String, reason: String },

    #[error("Task '{task}' failed: {reason}")]
    Failed { task: String, reason: String },

    #[error("Branch round exceeded the {limit:?} processing limit")]
    TimedOut { limit: Duration },

    #[error("Task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },
}

impl TaskError {
    pub fn failed(task: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            task: task.into(),
            reason: reason.into(),
        }
    }

    pub fn panicked(task: impl Into<String>, payload: &(dyn Any + Send)) -> Self {
        Self::Panicked {
            task: task.into(),
            message: panic_message(payload),
        }
    }

    pub fn is_panicked(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }

    pub fn invalid_settings(task: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            task: task.into(),
            reason: reason.into(),
        }
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("No task constructor registered for '{0}'")]
    UnregisteredId(String),

    #[error(transparent)]
    Settings(#[from] TaskError),
}

/// A contained failure of one branch round, queued by the branch worker and
/// pulled by the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Branch '{branch_id}' failed at node '{node_id}' in round {round}: {error}")]
pub struct BranchFailure {
    pub branch_id: String,
    /// Node that raised the failure. Equals the branch id for timeouts, which
    /// are attributed to the whole round.
    pub node_id: String,
    pub round: u64,
    #[source]
    pub error: TaskError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panicked_carries_payload_text() {
        struct TestCase {
            payload: Box<dyn Any + Send>,
            expected: &'static str,
        }

        let test_cases = vec![
            TestCase {
                payload: Box::new("static text"),
                expected: "static text",
            },
            TestCase {
                payload: Box::new(format!("formatted {}", 7)),
                expected: "formatted 7",
            },
            TestCase {
                payload: Box::new(42_u32),
                expected: "non-string panic payload",
            },
        ];

        for test_case in test_cases {
            let error = TaskError::panicked("upper", &*test_case.payload);
            assert!(error.is_panicked());
            assert_eq!(
                error.to_string(),
                format!("Task 'upper' panicked: {}", test_case.expected)
            );
        }
    }
}
