//! Computation Capability
//!
//! Concrete node types plug into the engine by implementing [`Computation`].
//! The engine owns the trigger/state machine; the computation only turns an
//! input snapshot into output values and reports back through a
//! [`Completion`].
//!
//! # Completion contract
//!
//! Every call to [`Computation::run`] receives exactly one `Completion`.
//! It may be fired synchronously or moved to another thread and fired later.
//! Dropping it without firing counts as a completion that produced no
//! outputs, so a node can never get stuck in `Processing`.

use std::fmt;

use serde_json::{Map, Value as JsonValue};
use smallvec::SmallVec;
use tracing::warn;

use super::{Node, NodeId, WeakNode};
use crate::port::{validators, PortKey, Value};

/// The work a node performs when it runs.
pub trait Computation: Send + Sync + 'static {
    /// Compute outputs from `inputs` and fire `completion` when done.
    fn run(&self, inputs: &Inputs, completion: Completion);

    /// Called after every accepted input assignment on nodes with the
    /// `Custom` trigger policy. Call [`Node::process`] to run.
    fn input_did_update(&self, _node: &Node, _key: &PortKey) {}

    /// The serialization capability, if the node type supports it.
    fn serializable(&self) -> Option<&dyn Serializable> {
        None
    }
}

impl<F> Computation for F
where
    F: Fn(&Inputs, Completion) + Send + Sync + 'static,
{
    fn run(&self, inputs: &Inputs, completion: Completion) {
        self(inputs, completion)
    }
}

/// Pin a closure to the [`Computation`] signature.
///
/// Closures passed straight to a generic `impl Computation` parameter cannot
/// infer their argument types; routing them through here fixes that.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&Inputs, Completion) + Send + Sync + 'static,
{
    f
}

/// Self-description used by the codec.
pub trait Serializable {
    /// Type name used to find the factory on import.
    fn type_name(&self) -> &str;

    /// Free-form configuration needed to rebuild the node, excluding
    /// connections.
    fn self_data(&self) -> Option<Map<String, JsonValue>> {
        None
    }
}

/// Snapshot of a node's input values taken when a run starts.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    entries: SmallVec<[(PortKey, Option<Value>); 4]>,
}

impl Inputs {
    pub(crate) fn from_entries(entries: SmallVec<[(PortKey, Option<Value>); 4]>) -> Self {
        Self { entries }
    }

    /// The value of the input with `key`.
    pub fn get(&self, key: impl Into<PortKey>) -> Option<&Value> {
        let key = key.into();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.as_ref())
    }

    /// The value of the input with `key`, downcast to `T`.
    pub fn get_as<T: 'static>(&self, key: impl Into<PortKey>) -> Option<&T> {
        self.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// The value of the input with `key` read as a number.
    pub fn number(&self, key: impl Into<PortKey>) -> Option<f64> {
        self.get(key).and_then(validators::as_number)
    }

    /// The value of the only input, for single-input nodes.
    pub fn sole(&self) -> Option<&Value> {
        match self.entries.as_slice() {
            [(_, value)] => value.as_ref(),
            _ => None,
        }
    }

    /// Iterate over `(key, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&PortKey, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k, v.as_ref()))
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the node has no inputs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Values produced by one run, keyed by output.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    entries: SmallVec<[(PortKey, Value); 2]>,
    broadcast: Option<Value>,
}

impl Outputs {
    /// No values; nothing is emitted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A value for the unkeyed output.
    pub fn single(value: impl Into<Value>) -> Self {
        Self::new().with(PortKey::unkeyed(), value)
    }

    /// The same value for every output.
    pub fn broadcast(value: impl Into<Value>) -> Self {
        Self {
            entries: SmallVec::new(),
            broadcast: Some(value.into()),
        }
    }

    /// Add a value for the output with `key`.
    pub fn with(mut self, key: impl Into<PortKey>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set the value for the output with `key`, replacing any earlier one.
    pub fn set(&mut self, key: impl Into<PortKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// The value to emit on the output with `key`.
    pub fn value_for(&self, key: &PortKey) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| self.broadcast.clone())
    }

    /// Whether no output receives a value.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.broadcast.is_none()
    }
}

/// One-shot signal that a run has finished.
///
/// `Completion` is `Send`: a computation may hand it to a background thread
/// or task and fire it from there.
pub struct Completion {
    node: Option<WeakNode>,
    node_id: NodeId,
    run: u64,
}

impl Completion {
    pub(crate) fn new(node: WeakNode, node_id: NodeId, run: u64) -> Self {
        Self {
            node: Some(node),
            node_id,
            run,
        }
    }

    /// The node this completion belongs to.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Finish the run and emit `outputs`.
    ///
    /// If the run was cancelled in the meantime the outputs are discarded.
    pub fn complete(mut self, outputs: Outputs) {
        self.deliver(outputs);
    }

    /// Finish the run without emitting anything.
    pub fn finish(mut self) {
        self.deliver(Outputs::new());
    }

    fn deliver(&mut self, outputs: Outputs) {
        if let Some(node) = self.node.take().and_then(|weak| weak.upgrade()) {
            node.complete_run(self.run, outputs);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.node.is_some() {
            warn!(node = %self.node_id, run = self.run, "completion dropped without firing");
            self.deliver(Outputs::new());
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("node", &self.node_id)
            .field("run", &self.run)
            .field("pending", &self.node.is_some())
            .finish()
    }
}
