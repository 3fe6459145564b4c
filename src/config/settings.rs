// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

use crate::errors::TaskError;

/// Settings for one node's task: the settings identifier used to look up a
/// constructor in the [`TaskRegistry`](super::TaskRegistry), plus free-form
/// task-specific options.
///
/// # Example
/// ```yaml
/// task: prefix_suffix_adder
/// options:
///   prefix: "<<"
///   suffix: ">>"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskSettings {
    pub task: String,
    #[serde(default)]
    pub options: HashMap<String, Value>,
}

impl TaskSettings {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            options: HashMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.option(key).and_then(Value::as_str)
    }

    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.option(key).and_then(Value::as_bool)
    }

    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.option(key).and_then(Value::as_u64)
    }

    /// Deserialize the whole option map into a task's own settings type.
    pub fn parse_options<S: DeserializeOwned>(&self) -> Result<S, TaskError> {
        let mapping: Mapping = self
            .options
            .iter()
            .map(|(key, value)| (Value::String(key.clone()), value.clone()))
            .collect();

        serde_yaml::from_value(Value::Mapping(mapping))
            .map_err(|e| TaskError::invalid_settings(&self.task, e.to_string()))
    }
}
