//! Node Arena
//!
//! A process-wide map from [`NodeId`] to a weak node handle. Output
//! connections name their targets by id and resolve them here, which keeps
//! downstream references non-owning: once the last strong handle to a node
//! is dropped, its id resolves to `None` and the connection is pruned on the
//! next emission.
//!
//! Nodes register themselves on construction and unregister when their
//! shared state is dropped.

use std::sync::OnceLock;

use dashmap::DashMap;

use crate::node::{Node, NodeId, WeakNode};

// Weak references only: the arena never keeps a node alive.
static ARENA: OnceLock<DashMap<NodeId, WeakNode>> = OnceLock::new();

fn arena() -> &'static DashMap<NodeId, WeakNode> {
    ARENA.get_or_init(DashMap::new)
}

/// Register a freshly constructed node.
pub(crate) fn register(node: &Node) {
    arena().insert(node.id(), node.downgrade());
}

/// Remove a node's slot. Called when the node's state is dropped.
pub(crate) fn unregister(id: NodeId) {
    arena().remove(&id);
}

/// Resolve an id to a live node.
pub fn resolve(id: NodeId) -> Option<Node> {
    // Clone the weak handle out so the shard lock is released before upgrading.
    let weak = arena().get(&id).map(|entry| entry.value().clone())?;
    weak.upgrade()
}

/// Whether the id currently names a live node.
pub fn is_alive(id: NodeId) -> bool {
    resolve(id).is_some()
}
