// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::TaskSettings;
use crate::errors::RegistryError;
use crate::traits::Task;

pub type TaskConstructor<T> = Arc<dyn Fn() -> Box<dyn Task<T>> + Send + Sync>;

/// Resolves settings identifiers into fresh task instances.
///
/// The registry is an ordinary value handed to the pipeline at construction,
/// so tests can build a pipeline from a registry holding only test tasks.
pub struct TaskRegistry<T> {
    constructors: HashMap<String, TaskConstructor<T>>,
}

impl<T> Default for TaskRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TaskRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            constructors: self.constructors.clone(),
        }
    }
}

impl<T> TaskRegistry<T> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor, replacing any earlier one under the same identifier.
    pub fn register<F>(&mut self, identifier: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Task<T>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(identifier.into(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Construct the task named by `settings.task` and apply the settings to it.
    pub fn create(&self, settings: &TaskSettings) -> Result<Box<dyn Task<T>>, RegistryError> {
        let constructor = self
            .constructors
            .get(&settings.task)
            .ok_or_else(|| RegistryError::UnregisteredId(settings.task.clone()))?;

        let mut task = constructor();
        task.set_settings(settings)?;
        Ok(task)
    }
}

impl<T> fmt::Debug for TaskRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}
