// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test-only tasks for driving the scheduler into specific states.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;

use crate::data::PipelineData;
use crate::errors::TaskError;
use crate::traits::Task;

/// Fails every round, or only rounds whose payload equals `only_on`.
pub struct FailingTask {
    reason: String,
    only_on: Option<String>,
}

impl FailingTask {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            only_on: None,
        }
    }

    pub fn on_payload(payload: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            only_on: Some(payload.into()),
        }
    }
}

#[async_trait]
impl Task<String> for FailingTask {
    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        match &self.only_on {
            Some(payload) if payload != data.payload() => Ok(()),
            _ => Err(TaskError::failed("failing", self.reason.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Panics every round, or only rounds whose payload equals `only_on`.
pub struct PanickingTask {
    only_on: Option<String>,
}

impl PanickingTask {
    pub fn new() -> Self {
        Self { only_on: None }
    }

    pub fn on_payload(payload: impl Into<String>) -> Self {
        Self {
            only_on: Some(payload.into()),
        }
    }
}

#[async_trait]
impl Task<String> for PanickingTask {
    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        match &self.only_on {
            Some(payload) if payload != data.payload() => Ok(()),
            _ => panic!("cannot handle '{}'", data.payload()),
        }
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// Shared control for a [`GatedTask`]: observe rounds entering the task and
/// let them through one at a time.
pub struct Gate {
    entered_tx: UnboundedSender<u64>,
    entered_rx: tokio::sync::Mutex<UnboundedReceiver<u64>>,
    permits: Semaphore,
}

impl Gate {
    /// Wait for the next round to enter the task; returns its round number.
    pub async fn wait_entered(&self) -> u64 {
        self.entered_rx
            .lock()
            .await
            .recv()
            .await
            .unwrap_or_default()
    }

    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    pub fn release_n(&self, n: usize) {
        self.permits.add_permits(n);
    }
}

/// Blocks every round until its gate is released. The payload is untouched.
pub struct GatedTask {
    gate: Arc<Gate>,
}

impl GatedTask {
    pub fn new() -> Self {
        let (entered_tx, entered_rx) = mpsc::unbounded_channel();
        Self {
            gate: Arc::new(Gate {
                entered_tx,
                entered_rx: tokio::sync::Mutex::new(entered_rx),
                permits: Semaphore::new(0),
            }),
        }
    }

    pub fn gate(&self) -> Arc<Gate> {
        Arc::clone(&self.gate)
    }
}

#[async_trait]
impl Task<String> for GatedTask {
    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        let _ = self.gate.entered_tx.send(data.round());
        self.gate
            .permits
            .acquire()
            .await
            .map_err(|e| TaskError::failed("gated", e.to_string()))?
            .forget();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

pub type Seen = Arc<Mutex<Vec<(u64, String)>>>;

/// Records `(round, payload)` for every round it sees and counts resets.
pub struct RecordingTask {
    seen: Seen,
    resets: Arc<AtomicUsize>,
}

impl RecordingTask {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            resets: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn seen(&self) -> Seen {
        Arc::clone(&self.seen)
    }

    pub fn resets(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.resets)
    }
}

#[async_trait]
impl Task<String> for RecordingTask {
    async fn process(&mut self, data: &mut PipelineData<String>) -> Result<(), TaskError> {
        self.seen.lock().push((data.round(), data.payload().clone()));
        Ok(())
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Shared counters for [`ProbeTask`]s: how many rounds overlap at most.
#[derive(Clone, Default)]
pub struct ConcurrencyProbe {
    inflight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    pub fn task(&self, hold: std::time::Duration) -> ProbeTask {
        ProbeTask {
            probe: self.clone(),
            hold,
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Holds each round for a fixed time while counting overlapping rounds.
pub struct ProbeTask {
    probe: ConcurrencyProbe,
    hold: std::time::Duration,
}

#[async_trait]
impl Task<String> for ProbeTask {
    async fn process(&mut self, _data: &mut PipelineData<String>) -> Result<(), TaskError> {
        let now = self.probe.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.probe.inflight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "probe"
    }
}
