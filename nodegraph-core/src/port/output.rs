//! Output Ports
//!
//! An output keeps an ordered set of connections to downstream inputs.
//!
//! # Ownership
//!
//! A connection stores the target's [`NodeId`] and input key, never a strong
//! handle. At emission time the id is resolved through the node arena; if the
//! target has been dropped the connection is pruned and skipped. An output
//! therefore never keeps its downstream node alive.
//!
//! # Locking
//!
//! The connection set has its own lock, separate from the owning node's
//! state. Emission snapshots the live targets and releases the lock before
//! delivering, so a target may freely connect or emit back into this node.

use std::fmt;

use indexmap::IndexSet;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::trace;

use super::{PortKey, Value};
use crate::error::{NodeGraphError, Result};
use crate::node::{Node, NodeId};
use crate::runtime::arena;

/// A non-owning link from an output to a downstream input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    /// The downstream node.
    pub target: NodeId,
    /// The input on the downstream node.
    pub input: PortKey,
}

/// An output of a node.
pub struct OutputPort {
    key: PortKey,
    connections: Mutex<IndexSet<Connection>>,
}

type Targets = SmallVec<[(Node, PortKey); 4]>;

impl OutputPort {
    /// Declare an output.
    pub fn new(key: impl Into<PortKey>) -> Self {
        Self {
            key: key.into(),
            connections: Mutex::new(IndexSet::new()),
        }
    }

    /// The key of this output.
    pub fn key(&self) -> &PortKey {
        &self.key
    }

    /// Add a downstream connection. Connecting twice is a no-op.
    pub fn connect(&self, target: &Node, input: impl Into<PortKey>) -> Result<()> {
        let input = input.into();
        if target.input_index(&input).is_none() {
            return Err(NodeGraphError::UnknownPort {
                node: target.id(),
                direction: "input",
                key: input.to_string(),
            });
        }
        self.connections.lock().insert(Connection {
            target: target.id(),
            input,
        });
        Ok(())
    }

    /// Remove a downstream connection. Returns whether it existed.
    pub fn disconnect(&self, target: &Node, input: impl Into<PortKey>) -> bool {
        let connection = Connection {
            target: target.id(),
            input: input.into(),
        };
        self.connections.lock().shift_remove(&connection)
    }

    /// Remove every connection.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Connections whose target is still alive, in connection order.
    pub fn connections(&self) -> Vec<Connection> {
        self.prune();
        self.connections.lock().iter().cloned().collect()
    }

    /// Whether the output has at least one live connection.
    pub fn is_connected(&self) -> bool {
        !self.connections().is_empty()
    }

    /// Resolve the live targets, dropping connections to destroyed nodes.
    pub(crate) fn live_targets(&self) -> Targets {
        let mut connections = self.connections.lock();
        let mut targets = Targets::new();
        let before = connections.len();
        connections.retain(|connection| match arena::resolve(connection.target) {
            Some(node) => {
                targets.push((node, connection.input.clone()));
                true
            }
            None => false,
        });
        let pruned = before - connections.len();
        if pruned > 0 {
            trace!(output = %self.key, pruned, "pruned connections to dropped nodes");
        }
        targets
    }

    fn prune(&self) {
        let _ = self.live_targets();
    }

    /// Deliver `value` to every live connection, in connection order.
    ///
    /// Returns the number of inputs the value was delivered to.
    pub fn emit(&self, value: Value) -> usize {
        let targets = self.live_targets();
        let mut delivered = 0;
        for (node, input) in targets {
            if node.deliver(&input, value.clone()) {
                delivered += 1;
            }
        }
        trace!(output = %self.key, delivered, "emitted value");
        delivered
    }
}

impl fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPort")
            .field("key", &self.key)
            .field("connections", &self.connections.lock().len())
            .finish()
    }
}
