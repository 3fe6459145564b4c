// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The pipeline controller.
//!
//! The controller owns the graph, one worker per branch, and the runtime
//! state of every branch. A dispatch loop, woken by input, completions,
//! failures, and stop requests, moves `Ready` branches to their workers as
//! the sync policy allows. Completions arrive on the worker's task and fan
//! the result out to child branches under the same lock.
//!
//! ```text
//! add_process_data ──> [root: Ready] ──dispatch──> worker ──complete──┐
//!                                                                     │
//!          [child: Ready] <──clone── fan-out (idle children only) <───┘
//! ```

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::partition::partition;
use super::worker::{BranchWorker, CompletionObserver};
use super::{Branch, BranchRuntimeState, BranchStatus, Node, SyncPolicy};
use crate::config::{FanOutPolicy, ObserverDelivery, PipelineOptions, PipelineTopology, TaskRegistry};
use crate::data::PipelineData;
use crate::errors::{panic_message, BranchFailure, PipelineError};
use crate::graph::Graph;
use crate::observability::messages::engine::{
    BranchDispatched, BranchRoundFailed, BranchTornDown, DispatchLoopStarted, FanOutCoalesced,
    FanOutDropped, InputRejected, ObserverPanicked, PipelineConstructed, PipelineStopped,
};
use crate::observability::messages::graph::{TopologyViolation, UnreachableEntryPoint};
use crate::observability::messages::StructuredLog;
use crate::traits::PipelineObserver;

/// Handle returned by [`Pipeline::register_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type BranchStates<T> = HashMap<String, BranchRuntimeState<T>>;
type Workers<T> = HashMap<String, BranchWorker<T>>;

struct DispatchRun {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Everything shared between the public handle, the dispatch loop, and the
/// worker completion callbacks. Holds no reference to the workers.
struct PipelineCore<T> {
    name: String,
    sync_policy: SyncPolicy,
    options: PipelineOptions,
    root_id: String,
    graph: Graph<Node<T>>,
    branch_order: Vec<String>,
    /// Branch order with the root moved last, so a round in progress is
    /// drained before the root takes the next one.
    dispatch_order: Vec<String>,
    branch_children: HashMap<String, Vec<String>>,
    states: Mutex<BranchStates<T>>,
    observers: RwLock<Vec<(ObserverId, Arc<dyn PipelineObserver<T>>)>>,
    next_observer: AtomicU64,
    next_round: AtomicU64,
    wake: Notify,
    idle: Notify,
    handle: Handle,
}

/// A running graph of branches.
///
/// Payloads enter at the root branch through [`add_process_data`], which
/// refuses input while the root is busy. Results of every branch round are
/// broadcast to registered [`PipelineObserver`]s.
///
/// [`add_process_data`]: Pipeline::add_process_data
pub struct Pipeline<T> {
    core: Arc<PipelineCore<T>>,
    workers: Arc<Workers<T>>,
    dispatch: Mutex<Option<DispatchRun>>,
}

impl<T> Pipeline<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build every node's task through `registry` and assemble the pipeline.
    pub fn construct(
        topology: &PipelineTopology,
        registry: &TaskRegistry<T>,
    ) -> Result<Self, PipelineError> {
        let mut graph = Graph::with_one_parent(topology.options.one_parent);
        let mut errors = Vec::new();

        for node_spec in &topology.nodes {
            let task = registry
                .create(&node_spec.settings)
                .map_err(|source| PipelineError::NodeCreation {
                    node_id: node_spec.id.clone(),
                    source,
                })?;
            let node = Node::new(node_spec.id.clone(), task);
            if let Err(e) = graph.add_node(node_spec.id.clone(), node) {
                errors.push(e);
            }
        }

        for (from, to) in &topology.links {
            if let Err(e) = graph.add_edge(from, to) {
                errors.push(e);
            }
        }

        if !errors.is_empty() {
            for error in &errors {
                TopologyViolation { error }.log();
            }
            return Err(PipelineError::InvalidTopology(errors));
        }

        Self::from_graph(
            topology.name.clone(),
            graph,
            topology.sync_policy,
            topology.options.clone(),
        )
    }

    /// Assemble a pipeline from an already built graph. Must be called
    /// inside a tokio runtime; workers and the dispatch loop spawn on it.
    pub fn from_graph(
        name: impl Into<String>,
        graph: Graph<Node<T>>,
        sync_policy: SyncPolicy,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        let handle = Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;

        if let Err(errors) = graph.validate() {
            for error in &errors {
                TopologyViolation { error }.log();
            }
            return Err(PipelineError::InvalidTopology(errors));
        }

        let entry_points: Vec<String> = graph
            .nodes_without_parents()
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        let root_id = entry_points
            .first()
            .cloned()
            .ok_or(PipelineError::NoEntryPoint)?;
        for extra in entry_points.iter().skip(1) {
            UnreachableEntryPoint {
                node_id: extra,
                root_id: &root_id,
            }
            .log();
        }

        let mut branches = Vec::new();
        for chain in partition(&graph) {
            let mut nodes = chain
                .iter()
                .filter_map(|id| graph.get(id))
                .map(|n| n.value().clone());
            let Some(head) = nodes.next() else {
                continue;
            };
            let mut branch = Branch::new(head);
            for node in nodes {
                branch.add_node(node);
            }
            branches.push(branch);
        }

        let branch_order: Vec<String> = branches.iter().map(|b| b.id().to_string()).collect();
        let mut dispatch_order: Vec<String> = branch_order
            .iter()
            .filter(|id| **id != root_id)
            .cloned()
            .collect();
        dispatch_order.push(root_id.clone());

        let branch_children: HashMap<String, Vec<String>> = branches
            .iter()
            .map(|branch| {
                let children = graph
                    .get(branch.last_id())
                    .map(|tail| {
                        tail.children()
                            .iter()
                            .filter(|child| branch_order.contains(*child))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                (branch.id().to_string(), children)
            })
            .collect();

        let states = branch_order
            .iter()
            .map(|id| (id.clone(), BranchRuntimeState::default()))
            .collect();

        PipelineConstructed {
            pipeline: &name,
            branch_count: branches.len(),
            node_count: graph.len(),
            sync_policy,
        }
        .log();

        let timeout = options.process_timeout();
        let core = Arc::new(PipelineCore {
            name,
            sync_policy,
            options,
            root_id,
            graph,
            branch_order,
            dispatch_order,
            branch_children,
            states: Mutex::new(states),
            observers: RwLock::new(Vec::new()),
            next_observer: AtomicU64::new(0),
            next_round: AtomicU64::new(1),
            wake: Notify::new(),
            idle: Notify::new(),
            handle: handle.clone(),
        });

        let workers = branches
            .into_iter()
            .map(|branch| {
                let id = branch.id().to_string();
                let mut worker =
                    BranchWorker::new(Arc::new(branch), handle.clone()).with_timeout(timeout);
                worker.add_completion_observer(Arc::clone(&core) as Arc<dyn CompletionObserver<T>>);
                (id, worker)
            })
            .collect();

        Ok(Self {
            core,
            workers: Arc::new(workers),
            dispatch: Mutex::new(None),
        })
    }

    /// Offer a payload to the root branch.
    ///
    /// Returns `false` without taking the payload when the root branch is not
    /// `Finished`; the caller decides whether to retry or drop it.
    pub fn add_process_data(&self, payload: T) -> bool {
        self.add_pipeline_data(PipelineData::new(payload))
    }

    /// Like [`add_process_data`](Self::add_process_data), for a payload that
    /// already carries attachments. The round number is reassigned.
    pub fn add_pipeline_data(&self, data: PipelineData<T>) -> bool {
        self.ensure_dispatching();

        let accepted = {
            let mut states = self.core.states.lock();
            match states.get_mut(&self.core.root_id) {
                Some(root) if root.status() == BranchStatus::Finished => {
                    let round = self.core.next_round.fetch_add(1, Ordering::Relaxed);
                    root.offer(data.with_round(round)).is_ok()
                }
                Some(root) => {
                    InputRejected {
                        pipeline: &self.core.name,
                        root_status: root.status(),
                    }
                    .log();
                    false
                }
                None => false,
            }
        };

        if accepted {
            self.core.wake.notify_one();
        }
        accepted
    }

    /// Stop the dispatch loop and every worker, then reset every branch to
    /// `Finished`. In-flight rounds complete first. The pipeline accepts
    /// input again afterwards. Tasks are reset only if something ran, so
    /// stopping a stopped pipeline does nothing.
    pub async fn stop(&self) {
        let run = self.dispatch.lock().take();
        let was_running = run.is_some();
        if let Some(run) = run {
            run.cancel.cancel();
            let _ = run.join.await;
        }

        for id in &self.core.branch_order {
            if let Some(worker) = self.workers.get(id) {
                let spawned = worker.is_spawned();
                worker.stop().await;
                if was_running || spawned {
                    worker.branch().reset().await;
                }
            }
        }

        for state in self.core.states.lock().values_mut() {
            state.finish();
        }

        if was_running {
            PipelineStopped {
                pipeline: &self.core.name,
                branch_count: self.core.branch_order.len(),
            }
            .log();
        }
        self.core.idle.notify_waiters();
    }

    /// Tear down one idle branch: drop its pending data, stop its worker,
    /// and return it to `Finished`. Returns `Ok(false)` when the branch is
    /// running or already being torn down.
    pub async fn stop_branch(&self, branch_id: &str) -> Result<bool, PipelineError> {
        let worker = self
            .workers
            .get(branch_id)
            .ok_or_else(|| PipelineError::UnknownBranch(branch_id.to_string()))?;

        let dropped_pending = {
            let mut states = self.core.states.lock();
            match states.get_mut(branch_id).and_then(|s| s.begin_stop()) {
                Some(dropped) => dropped,
                None => return Ok(false),
            }
        };

        worker.stop().await;
        worker.branch().reset().await;

        let idle = {
            let mut states = self.core.states.lock();
            if let Some(state) = states.get_mut(branch_id) {
                state.finish();
            }
            all_finished(&states)
        };

        BranchTornDown {
            branch_id,
            dropped_pending,
        }
        .log();

        if idle {
            self.core.idle.notify_waiters();
        }
        self.core.wake.notify_one();
        Ok(true)
    }

    /// Resolve once every branch is `Finished`.
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.core.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    pub fn register_observer(&self, observer: Arc<dyn PipelineObserver<T>>) -> ObserverId {
        let id = ObserverId(self.core.next_observer.fetch_add(1, Ordering::Relaxed));
        self.core.observers.write().push((id, observer));
        id
    }

    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.core.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn ensure_dispatching(&self) {
        let mut dispatch = self.dispatch.lock();
        if dispatch.as_ref().is_some_and(|run| !run.join.is_finished()) {
            return;
        }

        let cancel = CancellationToken::new();
        let core = Arc::clone(&self.core);
        let workers = Arc::clone(&self.workers);
        let join = self
            .core
            .handle
            .spawn(core.run_dispatch_loop(workers, cancel.clone()));
        *dispatch = Some(DispatchRun { cancel, join });
    }
}

impl<T> Pipeline<T> {
    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        self.core.sync_policy
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.core.options
    }

    pub fn root_branch_id(&self) -> &str {
        &self.core.root_id
    }

    /// Branch IDs in declaration order of their head nodes.
    pub fn branch_ids(&self) -> Vec<&str> {
        self.core.branch_order.iter().map(String::as_str).collect()
    }

    pub fn branch_nodes(&self, branch_id: &str) -> Option<Vec<&str>> {
        self.workers.get(branch_id).map(|w| w.branch().node_ids())
    }

    /// Branches fed by `branch_id` when it completes a round.
    pub fn child_branches(&self, branch_id: &str) -> Option<&[String]> {
        self.core.branch_children.get(branch_id).map(Vec::as_slice)
    }

    pub fn branch_status(&self, branch_id: &str) -> Option<BranchStatus> {
        self.core.states.lock().get(branch_id).map(|s| s.status())
    }

    pub fn status_snapshot(&self) -> Vec<(String, BranchStatus)> {
        let states = self.core.states.lock();
        self.core
            .branch_order
            .iter()
            .filter_map(|id| states.get(id).map(|s| (id.clone(), s.status())))
            .collect()
    }

    /// `true` while the dispatch loop is alive.
    pub fn is_running(&self) -> bool {
        self.dispatch
            .lock()
            .as_ref()
            .is_some_and(|run| !run.join.is_finished())
    }

    pub fn is_idle(&self) -> bool {
        all_finished(&self.core.states.lock())
    }

    pub fn graph(&self) -> &Graph<Node<T>> {
        &self.core.graph
    }
}

impl<T> Drop for Pipeline<T> {
    fn drop(&mut self) {
        if let Some(run) = self.dispatch.get_mut().as_ref() {
            run.cancel.cancel();
        }
    }
}

impl<T> PipelineCore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run_dispatch_loop(self: Arc<Self>, workers: Arc<Workers<T>>, cancel: CancellationToken) {
        DispatchLoopStarted { pipeline: &self.name }.log();

        loop {
            self.dispatch_pass(&workers);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.wake.notified() => {}
            }
        }
    }

    /// Pull contained failures, then hand every eligible `Ready` branch to
    /// its worker.
    fn dispatch_pass(&self, workers: &Workers<T>) {
        let failures: Vec<BranchFailure> = self
            .branch_order
            .iter()
            .filter_map(|id| workers.get(id))
            .filter(|worker| worker.has_exceptions())
            .flat_map(|worker| worker.take_exceptions())
            .collect();

        let idle = {
            let mut states = self.states.lock();

            for failure in &failures {
                BranchRoundFailed { failure }.log();
                if let Some(state) = states.get_mut(&failure.branch_id) {
                    if state.status() == BranchStatus::Running {
                        state.finish();
                    }
                }
            }

            let ready_for_wait = self.ready_for_wait(&states);
            let mut running = states
                .values()
                .filter(|s| s.status() == BranchStatus::Running)
                .count();

            for id in &self.dispatch_order {
                let Some(state) = states.get_mut(id) else {
                    continue;
                };
                if state.status() != BranchStatus::Ready {
                    continue;
                }

                let allowed = match self.sync_policy {
                    SyncPolicy::Sync => running == 0,
                    SyncPolicy::ParallelWait => *id != self.root_id || ready_for_wait,
                    SyncPolicy::ParallelNoWait => true,
                };
                if !allowed {
                    continue;
                }

                let Some(worker) = workers.get(id) else {
                    continue;
                };
                if let Some(data) = state.take_for_dispatch() {
                    BranchDispatched {
                        branch_id: id,
                        round: data.round(),
                    }
                    .log();
                    worker.add_data(data);
                    running += 1;
                }
            }

            !failures.is_empty() && all_finished(&states)
        };

        for failure in &failures {
            self.notify_failure(failure);
        }
        if idle {
            self.idle.notify_waiters();
        }
    }

    /// Root is `Ready` and every other branch is `Finished`.
    fn ready_for_wait(&self, states: &BranchStates<T>) -> bool {
        states.iter().all(|(id, state)| {
            if *id == self.root_id {
                state.status() == BranchStatus::Ready
            } else {
                state.status() == BranchStatus::Finished
            }
        })
    }

    fn fan_out(
        &self,
        states: &mut BranchStates<T>,
        from: &str,
        to: &str,
        result: &PipelineData<T>,
    ) {
        let Some(state) = states.get_mut(to) else {
            return;
        };

        match (state.status(), self.options.fan_out_policy) {
            (BranchStatus::Finished, _) => {
                let _ = state.offer(result.clone());
            }
            (BranchStatus::Ready, FanOutPolicy::CoalesceNewest) => {
                if let Ok(replaced_round) = state.replace_pending(result.clone()) {
                    FanOutCoalesced {
                        from_branch: from,
                        to_branch: to,
                        replaced_round,
                        round: result.round(),
                    }
                    .log();
                }
            }
            (status, _) => {
                FanOutDropped {
                    from_branch: from,
                    to_branch: to,
                    to_status: status,
                    round: result.round(),
                }
                .log();
            }
        }
    }

    fn observer_snapshot(&self) -> Vec<Arc<dyn PipelineObserver<T>>> {
        self.observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }

    fn notify_output(&self, branch_id: &str, result: &Arc<PipelineData<T>>) {
        for observer in self.observer_snapshot() {
            match self.options.observer_delivery {
                ObserverDelivery::Sync => {
                    guard_observer(branch_id, || observer.on_output(branch_id, result))
                }
                ObserverDelivery::Async => {
                    let branch_id = branch_id.to_string();
                    let result = Arc::clone(result);
                    self.handle.spawn(async move {
                        guard_observer(&branch_id, || observer.on_output(&branch_id, &result))
                    });
                }
            }
        }
    }

    fn notify_failure(&self, failure: &BranchFailure) {
        for observer in self.observer_snapshot() {
            match self.options.observer_delivery {
                ObserverDelivery::Sync => {
                    guard_observer(&failure.branch_id, || observer.on_failure(failure))
                }
                ObserverDelivery::Async => {
                    let failure = failure.clone();
                    self.handle.spawn(async move {
                        guard_observer(&failure.branch_id, || observer.on_failure(&failure))
                    });
                }
            }
        }
    }
}

impl<T> CompletionObserver<T> for PipelineCore<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn on_branch_complete(&self, branch_id: &str, result: &Arc<PipelineData<T>>) {
        let idle = {
            let mut states = self.states.lock();
            if let Some(state) = states.get_mut(branch_id) {
                if state.status() == BranchStatus::Running {
                    state.finish();
                }
            }

            if let Some(children) = self.branch_children.get(branch_id) {
                for child in children {
                    self.fan_out(&mut states, branch_id, child, result);
                }
            }
            all_finished(&states)
        };

        self.notify_output(branch_id, result);
        if idle {
            self.idle.notify_waiters();
        }
        self.wake.notify_one();
    }

    fn on_failure_queued(&self, _branch_id: &str) {
        self.wake.notify_one();
    }
}

/// Run one observer callback, containing a panic to a log line.
fn guard_observer(branch_id: &str, notify: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(notify)) {
        ObserverPanicked {
            branch_id,
            message: &panic_message(&*payload),
        }
        .log();
    }
}

fn all_finished<T>(states: &BranchStates<T>) -> bool {
    states
        .values()
        .all(|s| s.status() == BranchStatus::Finished)
}
