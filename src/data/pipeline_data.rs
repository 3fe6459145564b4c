// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::MetaStorage;

/// A payload value plus its [`MetaStorage`] side-channel.
///
/// Cloning value-copies the payload and shallow-copies the attachments (see
/// [`MetaStorage`]). The `round` is preserved so every clone fanned out from
/// one input can be correlated by observers.
#[derive(Debug, Clone, Default)]
pub struct PipelineData<T> {
    payload: T,
    meta: MetaStorage,
    round: u64,
}

impl<T> PipelineData<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            meta: MetaStorage::new(),
            round: 0,
        }
    }

    pub(crate) fn with_round(mut self, round: u64) -> Self {
        self.round = round;
        self
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    pub fn set_payload(&mut self, payload: T) {
        self.payload = payload;
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn meta(&self) -> &MetaStorage {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut MetaStorage {
        &mut self.meta
    }

    /// Sequence number assigned when the payload entered the pipeline.
    pub fn round(&self) -> u64 {
        self.round
    }
}

impl<T> From<T> for PipelineData<T> {
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}
