// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-branch worker loop.
//!
//! One long-lived tokio task per branch consumes an unbounded FIFO queue.
//! Each item runs through the whole branch; the result goes to the
//! completion observers, a failure goes to the exception queue where the
//! controller pulls it. Failures never end the loop. Stopping is cooperative:
//! the cancellation token is only observed between items.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::Branch;
use crate::data::PipelineData;
use crate::errors::{BranchFailure, TaskError};
use crate::observability::messages::engine::{WorkerStarted, WorkerStopped};
use crate::observability::messages::StructuredLog;

/// Receives the outcome of a branch round, on the worker's task.
pub trait CompletionObserver<T>: Send + Sync {
    fn on_branch_complete(&self, branch_id: &str, result: &Arc<PipelineData<T>>);

    /// A failure was queued and is waiting to be pulled.
    fn on_failure_queued(&self, _branch_id: &str) {}
}

type ExceptionQueue = Arc<Mutex<VecDeque<BranchFailure>>>;

struct WorkerRun<T> {
    sender: UnboundedSender<PipelineData<T>>,
    cancel: CancellationToken,
    join: JoinHandle<usize>,
}

/// Executes one branch on its own task.
pub struct BranchWorker<T> {
    branch: Arc<Branch<T>>,
    handle: Handle,
    timeout: Option<Duration>,
    observers: Vec<Arc<dyn CompletionObserver<T>>>,
    exceptions: ExceptionQueue,
    run: Mutex<Option<WorkerRun<T>>>,
}

impl<T> BranchWorker<T> {
    pub fn new(branch: Arc<Branch<T>>, handle: Handle) -> Self {
        Self {
            branch,
            handle,
            timeout: None,
            observers: Vec::new(),
            exceptions: Arc::new(Mutex::new(VecDeque::new())),
            run: Mutex::new(None),
        }
    }

    /// Bound each round. An expired round is queued as [`TaskError::TimedOut`].
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn add_completion_observer(&mut self, observer: Arc<dyn CompletionObserver<T>>) {
        self.observers.push(observer);
    }

    pub fn branch(&self) -> &Arc<Branch<T>> {
        &self.branch
    }

    pub fn branch_id(&self) -> &str {
        self.branch.id()
    }

    pub fn is_running(&self) -> bool {
        self.run
            .lock()
            .as_ref()
            .is_some_and(|r| !r.join.is_finished())
    }

    /// A loop was spawned and has not been stopped since.
    pub fn is_spawned(&self) -> bool {
        self.run.lock().is_some()
    }

    pub fn has_exceptions(&self) -> bool {
        !self.exceptions.lock().is_empty()
    }

    pub fn get_exceptions(&self) -> Vec<BranchFailure> {
        self.exceptions.lock().iter().cloned().collect()
    }

    pub fn reset_exceptions(&self) {
        self.exceptions.lock().clear();
    }

    /// Remove and return every captured exception.
    pub fn take_exceptions(&self) -> Vec<BranchFailure> {
        self.exceptions.lock().drain(..).collect()
    }
}

impl<T> BranchWorker<T>
where
    T: Send + Sync + 'static,
{
    /// Queue an item, spawning the loop first if it is not running.
    pub fn add_data(&self, data: PipelineData<T>) {
        let mut run = self.run.lock();

        let alive = run
            .as_ref()
            .is_some_and(|r| !r.sender.is_closed() && !r.cancel.is_cancelled());
        if !alive {
            *run = Some(self.spawn());
        }

        if let Some(active) = run.as_ref() {
            // The receiver lives as long as the loop, which was just checked.
            let _ = active.sender.send(data);
        }
    }

    /// Stop the loop after the in-flight item, drop whatever is still queued,
    /// and clear captured exceptions. Returns the number of dropped items.
    pub async fn stop(&self) -> usize {
        let run = self.run.lock().take();
        let drained = match run {
            Some(run) => {
                run.cancel.cancel();
                drop(run.sender);
                run.join.await.unwrap_or_default()
            }
            None => 0,
        };
        self.reset_exceptions();
        drained
    }

    fn spawn(&self) -> WorkerRun<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let context = WorkerContext {
            branch: Arc::clone(&self.branch),
            timeout: self.timeout,
            observers: self.observers.clone(),
            exceptions: Arc::clone(&self.exceptions),
        };
        let join = self.handle.spawn(context.run(receiver, cancel.clone()));

        WorkerRun {
            sender,
            cancel,
            join,
        }
    }
}

impl<T> Drop for BranchWorker<T> {
    fn drop(&mut self) {
        if let Some(run) = self.run.get_mut().as_ref() {
            run.cancel.cancel();
        }
    }
}

struct WorkerContext<T> {
    branch: Arc<Branch<T>>,
    timeout: Option<Duration>,
    observers: Vec<Arc<dyn CompletionObserver<T>>>,
    exceptions: ExceptionQueue,
}

impl<T> WorkerContext<T>
where
    T: Send + Sync + 'static,
{
    async fn run(
        self,
        mut receiver: UnboundedReceiver<PipelineData<T>>,
        cancel: CancellationToken,
    ) -> usize {
        let branch_id = self.branch.id().to_string();
        WorkerStarted {
            branch_id: &branch_id,
        }
        .log();

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                item = receiver.recv() => match item {
                    Some(item) => item,
                    None => break,
                },
            };
            self.run_round(item).await;
        }

        receiver.close();
        let mut drained = 0;
        while receiver.try_recv().is_ok() {
            drained += 1;
        }

        WorkerStopped {
            branch_id: &branch_id,
            drained,
        }
        .log();
        drained
    }

    async fn run_round(&self, mut data: PipelineData<T>) {
        self.branch.mark_started();

        let outcome = match self.timeout {
            None => self.branch.process(&mut data).await,
            Some(limit) => {
                match tokio::time::timeout(limit, self.branch.process(&mut data)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(BranchFailure {
                        branch_id: self.branch.id().to_string(),
                        node_id: self.branch.id().to_string(),
                        round: data.round(),
                        error: TaskError::TimedOut { limit },
                    }),
                }
            }
        };

        match outcome {
            Ok(()) => {
                let result = Arc::new(data);
                for observer in &self.observers {
                    observer.on_branch_complete(self.branch.id(), &result);
                }
            }
            Err(failure) => {
                self.exceptions.lock().push_back(failure);
                for observer in &self.observers {
                    observer.on_failure_queued(self.branch.id());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Node;
    use crate::tasks::stub::{FailingTask, GatedTask, PanickingTask};
    use crate::tasks::text::ChangeTextCase;
    use tokio::sync::mpsc::UnboundedSender as Tx;

    struct Forward {
        outputs: Tx<(String, String, u64)>,
        failures: Tx<String>,
    }

    impl CompletionObserver<String> for Forward {
        fn on_branch_complete(&self, branch_id: &str, result: &Arc<PipelineData<String>>) {
            let _ = self.outputs.send((
                branch_id.to_string(),
                result.payload().clone(),
                result.round(),
            ));
        }

        fn on_failure_queued(&self, branch_id: &str) {
            let _ = self.failures.send(branch_id.to_string());
        }
    }

    fn worker(
        task: Box<dyn crate::traits::Task<String>>,
    ) -> (
        BranchWorker<String>,
        UnboundedReceiver<(String, String, u64)>,
        UnboundedReceiver<String>,
    ) {
        let (outputs, out_rx) = mpsc::unbounded_channel();
        let (failures, fail_rx) = mpsc::unbounded_channel();
        let branch = Arc::new(Branch::new(Node::new("b", task)));
        let mut worker = BranchWorker::new(branch, Handle::current());
        worker.add_completion_observer(Arc::new(Forward { outputs, failures }));
        (worker, out_rx, fail_rx)
    }

    fn item(text: &str, round: u64) -> PipelineData<String> {
        PipelineData::new(text.to_string()).with_round(round)
    }

    #[tokio::test]
    async fn test_items_processed_in_fifo_order() {
        let (worker, mut outputs, _failures) = worker(Box::new(ChangeTextCase::upper()));
        assert!(!worker.is_running());

        worker.add_data(item("one", 1));
        worker.add_data(item("two", 2));
        worker.add_data(item("three", 3));

        for (expected, round) in [("ONE", 1), ("TWO", 2), ("THREE", 3)] {
            let (branch, payload, seen_round) = outputs.recv().await.unwrap();
            assert_eq!(branch, "b");
            assert_eq!(payload, expected);
            assert_eq!(seen_round, round);
        }
        assert!(worker.is_running());
        assert!(worker.branch().is_started());

        worker.stop().await;
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_failures_are_queued_and_loop_survives() {
        let (worker, _outputs, mut failures) = worker(Box::new(FailingTask::new("bad frame")));

        worker.add_data(item("x", 1));
        worker.add_data(item("y", 2));
        failures.recv().await.unwrap();
        failures.recv().await.unwrap();

        assert!(worker.has_exceptions());
        let rounds: Vec<u64> = worker.get_exceptions().iter().map(|f| f.round).collect();
        assert_eq!(rounds, vec![1, 2]);
        assert!(worker.is_running());

        let taken = worker.take_exceptions();
        assert_eq!(taken.len(), 2);
        assert!(!worker.has_exceptions());

        worker.stop().await;
    }

    #[tokio::test]
    async fn test_panicking_task_is_queued_and_loop_survives() {
        let (worker, _outputs, mut failures) = worker(Box::new(PanickingTask::new()));

        worker.add_data(item("x", 1));
        worker.add_data(item("y", 2));
        failures.recv().await.unwrap();
        failures.recv().await.unwrap();

        let taken = worker.take_exceptions();
        assert_eq!(taken.len(), 2);
        assert!(taken.iter().all(|f| f.node_id == "b" && f.error.is_panicked()));
        assert_eq!(
            taken[1].error,
            TaskError::Panicked {
                task: "panicking".to_string(),
                message: "cannot handle 'y'".to_string(),
            }
        );
        assert!(worker.is_running());

        worker.stop().await;
        assert!(!worker.is_spawned());
    }

    #[tokio::test]
    async fn test_queued_rounds_run_in_order_once_released() {
        let gated = GatedTask::new();
        let gate = gated.gate();
        let (worker, mut outputs, _failures) = worker(Box::new(gated));
        assert!(!worker.is_spawned());

        for (round, text) in ["a", "b", "c"].into_iter().enumerate() {
            worker.add_data(item(text, round as u64 + 1));
        }
        assert!(worker.is_spawned());
        assert_eq!(gate.wait_entered().await, 1);
        gate.release_n(3);

        for expected in ["a", "b", "c"] {
            let (_, payload, _) = outputs.recv().await.unwrap();
            assert_eq!(payload, expected);
        }
        worker.stop().await;
    }

    #[tokio::test]
    async fn test_stop_drains_queue_and_clears_exceptions() {
        let gated = GatedTask::new();
        let gate = gated.gate();
        let (worker, mut outputs, _failures) = worker(Box::new(gated));

        worker.add_data(item("first", 1));
        gate.wait_entered().await;
        worker.add_data(item("second", 2));
        worker.add_data(item("third", 3));

        let stopping = worker.stop();
        tokio::pin!(stopping);
        tokio::select! {
            _ = &mut stopping => panic!("stop must wait for the in-flight round"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }
        gate.release();
        let drained = stopping.await;

        assert_eq!(drained, 2);
        let (_, payload, _) = outputs.recv().await.unwrap();
        assert_eq!(payload, "first");
        assert!(!worker.has_exceptions());
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_failure() {
        let gated = GatedTask::new();
        let (worker, _outputs, mut failures) = worker(Box::new(gated));
        let worker = worker.with_timeout(Some(Duration::from_millis(10)));

        worker.add_data(item("stuck", 5));
        failures.recv().await.unwrap();

        let failure = worker.take_exceptions().remove(0);
        assert_eq!(failure.round, 5);
        assert_eq!(
            failure.error,
            TaskError::TimedOut {
                limit: Duration::from_millis(10)
            }
        );
        worker.stop().await;
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (worker, mut outputs, _failures) = worker(Box::new(ChangeTextCase::upper()));

        worker.add_data(item("a", 1));
        outputs.recv().await.unwrap();
        worker.stop().await;

        worker.add_data(item("b", 2));
        let (_, payload, _) = outputs.recv().await.unwrap();
        assert_eq!(payload, "B");
        worker.stop().await;
    }
}
