// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use futures_util::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::data::PipelineData;
use crate::errors::TaskError;
use crate::traits::Task;

/// A graph vertex value: a node ID and the task it wraps.
///
/// Cloning a node shares the task, so the graph and the branch that executes
/// the node refer to the same instance.
pub struct Node<T> {
    id: String,
    task_name: &'static str,
    task: Arc<Mutex<Box<dyn Task<T>>>>,
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            task_name: self.task_name,
            task: Arc::clone(&self.task),
        }
    }
}

impl<T> Node<T> {
    pub fn new(id: impl Into<String>, task: Box<dyn Task<T>>) -> Self {
        Self {
            id: id.into(),
            task_name: task.name(),
            task: Arc::new(Mutex::new(task)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_name(&self) -> &'static str {
        self.task_name
    }

    /// Run the wrapped task. Failures propagate unchanged; a panic inside the
    /// task becomes [`TaskError::Panicked`].
    pub async fn process(&self, data: &mut PipelineData<T>) -> Result<(), TaskError> {
        let mut task = self.task.lock().await;
        match AssertUnwindSafe(task.process(data)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(TaskError::panicked(self.task_name, &*payload)),
        }
    }

    pub async fn reset(&self) {
        self.task.lock().await.reset();
    }
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("task", &self.task_name)
            .finish()
    }
}
