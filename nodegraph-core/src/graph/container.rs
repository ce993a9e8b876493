//! Graph Container
//!
//! A [`GraphContainer`] owns a set of nodes. It is what keeps a graph alive:
//! connections between nodes are non-owning, so a graph whose container is
//! dropped (and that nobody else holds) is torn down node by node.
//!
//! # Topology invariant
//!
//! Every live connection leaving a member must target another member.
//! [`GraphContainer::set_node_set`] validates the whole candidate set before
//! committing; on failure the previous membership is kept untouched.
//!
//! # Composite use
//!
//! A container can stand in for a single composite node: its entry nodes are
//! the members no other member feeds, and its exposed outputs are the member
//! outputs that feed nothing.

use std::collections::HashSet;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{NodeGraphError, Result};
use crate::node::{Node, NodeId};
use crate::port::PortKey;

/// An owning set of nodes whose connections stay within the set.
#[derive(Debug, Default)]
pub struct GraphContainer {
    nodes: RwLock<IndexMap<NodeId, Node>>,
}

impl GraphContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container holding `nodes`.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self> {
        let container = Self::new();
        container.set_node_set(nodes)?;
        Ok(container)
    }

    /// Replace the membership with `nodes`.
    ///
    /// Fails with [`NodeGraphError::TopologyViolation`] if a member has a live
    /// connection to a node outside the set; the container is unchanged then.
    pub fn set_node_set(&self, nodes: impl IntoIterator<Item = Node>) -> Result<()> {
        let candidate: IndexMap<NodeId, Node> =
            nodes.into_iter().map(|node| (node.id(), node)).collect();
        validate_topology(&candidate)?;

        debug!(nodes = candidate.len(), "container membership replaced");
        *self.nodes.write() = candidate;
        Ok(())
    }

    /// Members, in insertion order.
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.read().values().cloned().collect()
    }

    /// The member with `id`.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.nodes.read().get(&id).cloned()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.read().contains_key(&id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Whether every member supports the serialization capability.
    pub fn is_serializable(&self) -> bool {
        self.nodes.read().values().all(|node| node.serializable().is_some())
    }

    /// Cancel every member. Idle members are unaffected.
    pub fn cancel(&self) {
        let nodes = self.nodes();
        let mut visited = HashSet::new();
        for node in &nodes {
            node.cancel_visiting(&mut visited);
        }
        debug!(nodes = nodes.len(), "container cancelled");
    }

    /// Members that receive no connection from another member.
    pub fn entry_nodes(&self) -> Vec<Node> {
        let nodes = self.nodes();
        let fed: HashSet<NodeId> = nodes
            .iter()
            .flat_map(|node| {
                let id = node.id();
                node.downstream()
                    .into_iter()
                    .map(|target| target.id())
                    .filter(move |target| *target != id)
            })
            .collect();
        nodes
            .into_iter()
            .filter(|node| !fed.contains(&node.id()))
            .collect()
    }

    /// Process the container as one composite node: every entry node is
    /// asked to process.
    ///
    /// A closed cycle has no entry nodes; the first member is processed
    /// instead, so a cyclic composite can still be driven.
    pub fn process(&self) {
        let mut entries = self.entry_nodes();
        if entries.is_empty() {
            entries.extend(self.nodes().into_iter().take(1));
        }
        debug!(entries = entries.len(), "processing container");
        crate::runtime::batch(|| {
            for node in &entries {
                node.process();
            }
        });
    }

    /// Member outputs not consumed inside the container, as `(node, key)`.
    pub fn exposed_outputs(&self) -> Vec<(Node, PortKey)> {
        let mut exposed = Vec::new();
        for node in self.nodes() {
            for port in node.output_ports() {
                if !port.is_connected() {
                    exposed.push((node.clone(), port.key().clone()));
                }
            }
        }
        exposed
    }
}

fn validate_topology(nodes: &IndexMap<NodeId, Node>) -> Result<()> {
    for node in nodes.values() {
        for port in node.output_ports() {
            for connection in port.connections() {
                if !nodes.contains_key(&connection.target) {
                    return Err(NodeGraphError::TopologyViolation {
                        source_node: node.id(),
                        output: port.key().to_string(),
                        target: connection.target,
                    });
                }
            }
        }
    }
    Ok(())
}
