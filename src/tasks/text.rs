// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in tasks over `String` payloads.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::TaskSettings;
use crate::data::PipelineData;
use crate::errors::TaskError;
use crate::traits::Task;

/// Attachment key under which [`TokenCounter`] publishes its [`TokenCounts`].
pub const TOKEN_COUNTS_KEY: &str = "token_counts";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMode {
    #[default]
    Upper,
    Lower,
    /// First letter of each word capitalized.
    Proper,
    /// Like `Proper`, but short articles and prepositions stay lowercase
    /// after the first word.
    Title,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeTextCaseOptions {
    #[serde(default)]
    mode: CaseMode,
}

/// Converts the payload to another letter case. Option `mode`.
#[derive(Debug, Default)]
pub struct ChangeTextCase {
    mode: CaseMode,
}

impl ChangeTextCase {
    pub fn new(mode: CaseMode) -> Self {
        Self { mode }
    }

    pub fn upper() -> Self {
        Self::new(CaseMode::Upper)
    }

    pub fn lower() -> Self {
        Self::new(CaseMode::Lower)
    }

    pub fn title() -> Self {
        Self::new(CaseMode::Title)
    }

    pub fn mode(&self) -> CaseMode {
        self.mode
    }

    fn convert(&self, input: &str) -> String {
        match self.mode {
            CaseMode::Upper => input.to_uppercase(),
            CaseMode::Lower => input.to_lowercase(),
            CaseMode::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            CaseMode::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower = word.to_lowercase();
                    if i > 0 && is_minor_word(&lower) {
                        lower
                    } else {
                        capitalize(word)
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_minor_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by"
    )
}

#[async_trait]
impl Task<String> for ChangeTextCase {
    fn set_settings(&mut self, settings: &TaskSettings) -> Result<(), TaskError> {
        let options: ChangeTextCaseOptions = settings.parse_options()?;
        self.mode = options.mode;
        Ok(())
    }

    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        let converted = self.convert(data.payload());
        data.set_payload(converted);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}

/// Reverses the payload by characters.
#[derive(Debug, Default)]
pub struct ReverseText;

#[async_trait]
impl Task<String> for ReverseText {
    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        let reversed: String = data.payload().chars().rev().collect();
        data.set_payload(reversed);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "reverse_text"
    }
}

/// Wraps the payload. Options `prefix` and `suffix`, both optional.
#[derive(Debug, Default, Deserialize)]
pub struct PrefixSuffixAdder {
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    suffix: String,
}

impl PrefixSuffixAdder {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

#[async_trait]
impl Task<String> for PrefixSuffixAdder {
    fn set_settings(&mut self, settings: &TaskSettings) -> Result<(), TaskError> {
        *self = settings.parse_options()?;
        Ok(())
    }

    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        let wrapped = format!("{}{}{}", self.prefix, data.payload(), self.suffix);
        data.set_payload(wrapped);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "prefix_suffix_adder"
    }
}

/// Counts published by [`TokenCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCounts {
    pub chars: usize,
    pub words: usize,
    pub lines: usize,
}

/// Publishes [`TokenCounts`] under [`TOKEN_COUNTS_KEY`]; the payload is untouched.
#[derive(Debug, Default)]
pub struct TokenCounter;

#[async_trait]
impl Task<String> for TokenCounter {
    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        let text = data.payload();
        let counts = TokenCounts {
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: text.lines().count().max(1),
        };
        data.meta_mut().set_attachment(TOKEN_COUNTS_KEY, counts);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "token_counter"
    }
}

/// Leaves the payload as it is. Useful as an entry node.
#[derive(Debug, Default)]
pub struct Passthrough;

#[async_trait]
impl<T: Send + 'static> Task<T> for Passthrough {
    async fn process(&mut self, _data: &mut PipelineData<T>) -> Result<(), TaskError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
