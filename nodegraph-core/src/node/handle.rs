//! Node Handle and State Machine
//!
//! [`Node`] is a cheap, clonable handle to a node's shared state. Cloning
//! the handle shares the node; the node is destroyed when the last strong
//! handle goes away. Downstream connections and the node arena only hold
//! [`WeakNode`]s.
//!
//! # Locking discipline
//!
//! Each node guards its mutable state with one mutex. Every operation
//! decides what to do while holding it, releases it, and only then performs
//! the follow-up (running the computation, queueing a deferred run,
//! emitting to outputs, cancelling downstream nodes). No node lock is ever
//! held while another node is entered, which keeps cyclic graphs and
//! re-entrant emissions deadlock free.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::computation::{Completion, Computation, Inputs, Outputs, Serializable};
use super::state::{NodeState, ProcessingState};
use super::{NodeBuilder, NodeId, TriggerPolicy};
use crate::error::{NodeGraphError, Result};
use crate::port::{Input, InputPort, OutputPort, PortKey, Value};
use crate::runtime::{self, arena, Batch};

/// Shared state behind a [`Node`] handle.
pub(crate) struct NodeInner {
    id: NodeId,
    trigger: TriggerPolicy,
    deferred: bool,
    inputs: SmallVec<[InputPort; 4]>,
    outputs: SmallVec<[OutputPort; 2]>,
    computation: Box<dyn Computation>,
    labels: RwLock<Labels>,
    state: Mutex<NodeState>,
}

#[derive(Debug, Default)]
struct Labels {
    name: Option<String>,
    description: Option<String>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        arena::unregister(self.id);
        trace!(node = %self.id, "node dropped");
    }
}

/// What to do once the state lock is released.
enum Followup {
    Nothing,
    Schedule,
    Run { run: u64, inputs: Inputs },
}

/// A processing unit with keyed inputs, keyed outputs and a trigger policy.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

/// Non-owning handle to a [`Node`].
#[derive(Clone)]
pub struct WeakNode {
    inner: Weak<NodeInner>,
}

impl WeakNode {
    /// Upgrade to a strong handle if the node is still alive.
    pub fn upgrade(&self) -> Option<Node> {
        self.inner.upgrade().map(|inner| Node { inner })
    }
}

impl fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakNode")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Node {
    /// Start declaring a node.
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    pub(crate) fn from_parts(
        inputs: SmallVec<[InputPort; 4]>,
        outputs: SmallVec<[OutputPort; 2]>,
        trigger: TriggerPolicy,
        deferred: bool,
        name: Option<String>,
        description: Option<String>,
        computation: Box<dyn Computation>,
    ) -> Self {
        let state = NodeState::new(inputs.len());
        let node = Self {
            inner: Arc::new(NodeInner {
                id: NodeId::new(),
                trigger,
                deferred,
                inputs,
                outputs,
                computation,
                labels: RwLock::new(Labels { name, description }),
                state: Mutex::new(state),
            }),
        };
        arena::register(&node);
        trace!(node = %node.id(), ?trigger, deferred, "node constructed");
        node
    }

    // ------------------------------------------------------------------
    // Identity and configuration
    // ------------------------------------------------------------------

    /// The node's unique id.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// A non-owning handle to this node.
    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The trigger policy.
    pub fn trigger_policy(&self) -> TriggerPolicy {
        self.inner.trigger
    }

    /// Whether requests run at the end of the current batch rather than
    /// immediately.
    pub fn uses_deferred_processing(&self) -> bool {
        self.inner.deferred
    }

    /// Human readable name.
    pub fn name(&self) -> Option<String> {
        self.inner.labels.read().name.clone()
    }

    /// Set the human readable name.
    pub fn set_name(&self, name: Option<String>) {
        self.inner.labels.write().name = name;
    }

    /// What the node does.
    pub fn description(&self) -> Option<String> {
        self.inner.labels.read().description.clone()
    }

    /// Set the description.
    pub fn set_description(&self, description: Option<String>) {
        self.inner.labels.write().description = description;
    }

    /// The node's computation.
    pub fn computation(&self) -> &dyn Computation {
        self.inner.computation.as_ref()
    }

    /// The serialization capability of the computation, if any.
    pub fn serializable(&self) -> Option<&dyn Serializable> {
        self.inner.computation.serializable()
    }

    // ------------------------------------------------------------------
    // Ports
    // ------------------------------------------------------------------

    /// Input declarations, in declaration order.
    pub fn input_ports(&self) -> &[InputPort] {
        &self.inner.inputs
    }

    /// Outputs, in declaration order.
    pub fn output_ports(&self) -> &[OutputPort] {
        &self.inner.outputs
    }

    pub(crate) fn input_index(&self, key: &PortKey) -> Option<usize> {
        self.inner.inputs.iter().position(|port| port.key() == key)
    }

    /// The input with `key`.
    pub fn input(&self, key: impl Into<PortKey>) -> Option<Input<'_>> {
        let key = key.into();
        self.input_index(&key).map(|index| Input::new(self, index))
    }

    /// The only input, for single-input nodes.
    pub fn sole_input(&self) -> Option<Input<'_>> {
        (self.inner.inputs.len() == 1).then(|| Input::new(self, 0))
    }

    /// All inputs, in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = Input<'_>> {
        (0..self.inner.inputs.len()).map(move |index| Input::new(self, index))
    }

    /// The output with `key`.
    pub fn output(&self, key: impl Into<PortKey>) -> Option<&OutputPort> {
        let key = key.into();
        self.inner.outputs.iter().find(|port| *port.key() == key)
    }

    /// The only output, for single-output nodes.
    pub fn sole_output(&self) -> Option<&OutputPort> {
        match self.inner.outputs.as_slice() {
            [output] => Some(output),
            _ => None,
        }
    }

    /// Set the input with `key`.
    ///
    /// Returns `Ok(false)` if the input's validator rejected the value.
    pub fn set_input(&self, key: impl Into<PortKey>, value: impl Into<Value>) -> Result<bool> {
        let key = key.into();
        match self.input_index(&key) {
            Some(index) => Ok(self.assign_input(index, Some(value.into()))),
            None => Err(NodeGraphError::UnknownPort {
                node: self.id(),
                direction: "input",
                key: key.to_string(),
            }),
        }
    }

    /// Connect the output `output` of this node to `input` on `target`.
    pub fn connect(
        &self,
        output: impl Into<PortKey>,
        target: &Node,
        input: impl Into<PortKey>,
    ) -> Result<()> {
        let output = output.into();
        let port = self.output(&output).ok_or_else(|| NodeGraphError::UnknownPort {
            node: self.id(),
            direction: "output",
            key: output.to_string(),
        })?;
        port.connect(target, input)
    }

    /// Remove a connection made with [`Node::connect`].
    pub fn disconnect(
        &self,
        output: impl Into<PortKey>,
        target: &Node,
        input: impl Into<PortKey>,
    ) -> bool {
        self.output(output)
            .map(|port| port.disconnect(target, input))
            .unwrap_or(false)
    }

    /// Live nodes directly connected to any of this node's outputs.
    pub fn downstream(&self) -> Vec<Node> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for port in self.inner.outputs.iter() {
            for (node, _) in port.live_targets() {
                if seen.insert(node.id()) {
                    nodes.push(node);
                }
            }
        }
        nodes
    }

    // ------------------------------------------------------------------
    // Observed state
    // ------------------------------------------------------------------

    /// Current processing state.
    pub fn processing_state(&self) -> ProcessingState {
        self.inner.state.lock().processing
    }

    /// Whether a run is queued or in flight.
    pub fn is_processing(&self) -> bool {
        self.processing_state().is_busy()
    }

    /// Current lock count.
    pub fn lock_count(&self) -> usize {
        self.inner.state.lock().lock_count
    }

    /// Elapsed time of the last completed (not cancelled) run.
    pub fn processing_duration(&self) -> Option<Duration> {
        self.inner.state.lock().duration
    }

    /// Number of runs that completed and emitted.
    pub fn completed_runs(&self) -> u64 {
        self.inner.state.lock().completed_runs
    }

    /// Whether a request is waiting for an unlock or the in-flight run.
    pub fn has_pending_request(&self) -> bool {
        self.inner.state.lock().pending
    }

    pub(crate) fn input_value(&self, index: usize) -> Option<Value> {
        self.inner.state.lock().values.get(index).cloned().flatten()
    }

    pub(crate) fn input_touched(&self, index: usize) -> bool {
        self.inner
            .state
            .lock()
            .touched
            .get(index)
            .copied()
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Input notifications
    // ------------------------------------------------------------------

    /// Store a value in input `index` and run trigger evaluation.
    pub(crate) fn assign_input(&self, index: usize, value: Option<Value>) -> bool {
        let port = &self.inner.inputs[index];
        if !port.accepts(value.as_ref()) {
            trace!(node = %self.id(), input = %port.key(), "value rejected by validator");
            return false;
        }

        let _batch = Batch::begin();
        let followup = {
            let mut state = self.inner.state.lock();
            state.values[index] = value;
            state.touched[index] = true;
            state.seen[index] = true;
            if self.inner.trigger.should_raise(&state.touched, &state.seen) {
                self.raise(&mut state)
            } else {
                Followup::Nothing
            }
        };

        if self.inner.trigger == TriggerPolicy::Custom {
            self.inner.computation.input_did_update(self, port.key());
        }
        self.perform(followup);
        true
    }

    /// Deliver an emitted value to the input with `key`.
    pub(crate) fn deliver(&self, key: &PortKey, value: Value) -> bool {
        match self.input_index(key) {
            Some(index) => self.assign_input(index, Some(value)),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Request a run with the current input values.
    ///
    /// Honours deferral. A no-op while the node is locked; recorded as
    /// pending while a run is in flight.
    pub fn process(&self) {
        let _batch = Batch::begin();
        let followup = {
            let mut state = self.inner.state.lock();
            if state.lock_count > 0 {
                trace!(node = %self.id(), "process() ignored while locked");
                return;
            }
            self.raise(&mut state)
        };
        self.perform(followup);
    }

    /// Handle a processing request under the state lock.
    fn raise(&self, state: &mut NodeState) -> Followup {
        if runtime::on_path(self.id()) {
            trace!(node = %self.id(), "request absorbed: node is already on the propagation path");
            return Followup::Nothing;
        }
        if state.lock_count > 0 {
            state.pending = true;
            trace!(node = %self.id(), "request recorded while locked");
            return Followup::Nothing;
        }
        match state.processing {
            ProcessingState::Idle if self.inner.deferred => {
                state.processing = ProcessingState::Deferred;
                Followup::Schedule
            }
            ProcessingState::Idle => self.begin_run(state),
            ProcessingState::Deferred => Followup::Nothing,
            ProcessingState::Processing | ProcessingState::Cancelling => {
                state.pending = true;
                trace!(node = %self.id(), state = ?state.processing, "request recorded while busy");
                Followup::Nothing
            }
        }
    }

    fn begin_run(&self, state: &mut NodeState) -> Followup {
        state.processing = ProcessingState::Processing;
        // The run sees the latest inputs, so it serves every earlier request.
        state.pending = false;
        state.run += 1;
        state.started_at = Some(std::time::Instant::now());

        let inputs = Inputs::from_entries(
            self.inner
                .inputs
                .iter()
                .zip(state.values.iter())
                .map(|(port, value)| (port.key().clone(), value.clone()))
                .collect(),
        );
        if self.inner.trigger.resets_touched() {
            state.reset_touched();
        }
        Followup::Run {
            run: state.run,
            inputs,
        }
    }

    fn perform(&self, followup: Followup) {
        match followup {
            Followup::Nothing => {}
            Followup::Schedule => runtime::schedule(self),
            Followup::Run { run, inputs } => {
                debug!(node = %self.id(), run, "processing");
                let completion = Completion::new(self.downgrade(), self.id(), run);
                self.inner.computation.run(&inputs, completion);
            }
        }
    }

    /// Start a deferred run. Called when the batch drains.
    pub(crate) fn run_deferred(&self) {
        let followup = {
            let mut state = self.inner.state.lock();
            if state.processing != ProcessingState::Deferred {
                // Cancelled after it was queued.
                return;
            }
            if state.lock_count > 0 {
                state.processing = ProcessingState::Idle;
                state.pending = true;
                return;
            }
            self.begin_run(&mut state)
        };
        self.perform(followup);
    }

    /// Return a queued node to `Idle` without running it.
    pub(crate) fn abandon_deferred(&self) {
        let mut state = self.inner.state.lock();
        if state.processing == ProcessingState::Deferred {
            state.processing = ProcessingState::Idle;
        }
    }

    /// Handle the completion signal of run `run`.
    pub(crate) fn complete_run(&self, run: u64, outputs: Outputs) {
        let _batch = Batch::begin();
        let (emit, pending) = {
            let mut state = self.inner.state.lock();
            if state.run != run {
                debug!(node = %self.id(), run, current = state.run, "stale completion ignored");
                return;
            }
            let emit = match state.processing {
                ProcessingState::Processing => {
                    state.duration = state.started_at.map(|started| started.elapsed());
                    state.completed_runs += 1;
                    true
                }
                ProcessingState::Cancelling => {
                    debug!(node = %self.id(), run, "completion discarded after cancel");
                    false
                }
                ProcessingState::Idle | ProcessingState::Deferred => {
                    debug!(node = %self.id(), run, "completion for a node that is not processing");
                    return;
                }
            };
            state.processing = ProcessingState::Idle;
            state.started_at = None;
            (emit, std::mem::take(&mut state.pending))
        };

        if emit {
            let _path = runtime::enter_path(self.id());
            for port in self.inner.outputs.iter() {
                if let Some(value) = outputs.value_for(port.key()) {
                    port.emit(value);
                }
            }
        }

        if pending {
            let followup = {
                let mut state = self.inner.state.lock();
                self.raise(&mut state)
            };
            self.perform(followup);
        }
    }

    // ------------------------------------------------------------------
    // Locking
    // ------------------------------------------------------------------

    /// Suppress processing until the matching [`Node::unlock`].
    pub fn lock(&self) {
        let mut state = self.inner.state.lock();
        state.lock_count += 1;
        trace!(node = %self.id(), lock_count = state.lock_count, "locked");
    }

    /// Release one lock. When the last lock is released and a request was
    /// recorded meanwhile, the request is raised again.
    pub fn unlock(&self) -> Result<()> {
        let _batch = Batch::begin();
        let followup = {
            let mut state = self.inner.state.lock();
            if state.lock_count == 0 {
                return Err(NodeGraphError::precheck(
                    self.id(),
                    "unlock() called without a matching lock()",
                ));
            }
            state.lock_count -= 1;
            trace!(node = %self.id(), lock_count = state.lock_count, "unlocked");
            if state.lock_count == 0
                && state.processing == ProcessingState::Idle
                && std::mem::take(&mut state.pending)
            {
                self.raise(&mut state)
            } else {
                Followup::Nothing
            }
        };
        self.perform(followup);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------------

    /// Cancel the queued or in-flight run, then cancel every node reachable
    /// downstream.
    pub fn cancel(&self) {
        let mut visited = HashSet::new();
        self.cancel_visiting(&mut visited);
    }

    pub(crate) fn cancel_visiting(&self, visited: &mut HashSet<NodeId>) {
        if !visited.insert(self.id()) {
            return;
        }
        let previous = {
            let mut state = self.inner.state.lock();
            let previous = state.processing;
            match previous {
                ProcessingState::Deferred => {
                    // Nothing started yet: Cancelling resolves to Idle at once.
                    state.processing = ProcessingState::Idle;
                    state.pending = false;
                }
                ProcessingState::Processing => {
                    state.processing = ProcessingState::Cancelling;
                    state.pending = false;
                }
                ProcessingState::Idle | ProcessingState::Cancelling => {}
            }
            previous
        };
        if previous.is_busy() {
            debug!(node = %self.id(), ?previous, "cancelled");
        }
        for node in self.downstream() {
            node.cancel_visiting(visited);
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("trigger", &self.inner.trigger)
            .field("inputs", &self.inner.inputs.len())
            .field("outputs", &self.inner.outputs.len())
            .field("state", &self.processing_state())
            .finish()
    }
}
