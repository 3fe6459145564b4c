// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in task implementations and their registration.

pub mod text;

#[cfg(test)]
pub(crate) mod stub;

use crate::config::TaskRegistry;
use text::{ChangeTextCase, Passthrough, PrefixSuffixAdder, ReverseText, TokenCounter};

/// Register every built-in text task under its settings identifier.
pub fn register_text_tasks(registry: &mut TaskRegistry<String>) {
    registry
        .register("change_text_case", || Box::new(ChangeTextCase::default()))
        .register("reverse_text", || Box::new(ReverseText))
        .register("prefix_suffix_adder", || Box::new(PrefixSuffixAdder::default()))
        .register("token_counter", || Box::new(TokenCounter))
        .register("passthrough", || Box::new(Passthrough));
}

impl TaskRegistry<String> {
    /// A registry holding the built-in text tasks.
    pub fn with_text_tasks() -> Self {
        let mut registry = Self::new();
        register_text_tasks(&mut registry);
        registry
    }
}
