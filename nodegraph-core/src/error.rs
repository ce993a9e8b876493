//! Error Types
//!
//! Every fallible operation in the engine reports a [`NodeGraphError`].
//!
//! Rejected input values are deliberately absent from this list: a validator
//! returning `false` leaves the input unchanged and is never surfaced to the
//! caller.

use thiserror::Error;

use crate::node::NodeId;

/// Result type alias using [`NodeGraphError`].
pub type Result<T> = std::result::Result<T, NodeGraphError>;

/// Errors that can occur in the node processing core.
#[derive(Debug, Error)]
pub enum NodeGraphError {
    /// An operation was called in a state that does not permit it,
    /// e.g. `unlock()` without a matching `lock()`.
    #[error("precheck violation on node {node}: {reason}")]
    PrecheckViolation { node: NodeId, reason: String },

    /// A container membership would contain a connection escaping the set.
    #[error("node {source_node} output '{output}' connects to node {target} outside the container")]
    TopologyViolation {
        source_node: NodeId,
        output: String,
        target: NodeId,
    },

    /// A node declaration is malformed (duplicate keys, unkeyed port among many).
    #[error("invalid node declaration: {0}")]
    InvalidDeclaration(String),

    /// A port key does not exist on the node.
    #[error("node {node} has no {direction} port '{key}'")]
    UnknownPort {
        node: NodeId,
        direction: &'static str,
        key: String,
    },

    /// A container member cannot describe itself for export.
    #[error("node {0} does not support serialization")]
    NotSerializable(NodeId),

    /// An import record names a type with no registered factory.
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),

    /// An import connection refers to a node id absent from the node list.
    #[error("connection refers to unknown node id '{0}'")]
    DanglingReference(String),

    /// Two import records share the same portable id.
    #[error("duplicate node id '{0}' in serialized graph")]
    DuplicateNodeId(String),

    /// A registered factory refused to build a node from its data.
    #[error("factory for node type '{node_type}' failed: {reason}")]
    Factory { node_type: String, reason: String },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MessagePack encoding failed.
    #[error("MessagePack encode error: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding failed.
    #[error("MessagePack decode error: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),
}

impl NodeGraphError {
    /// Create a precheck violation for the given node.
    pub fn precheck(node: NodeId, reason: impl Into<String>) -> Self {
        Self::PrecheckViolation {
            node,
            reason: reason.into(),
        }
    }

    /// Create a factory failure for the given type name.
    pub fn factory(node_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Factory {
            node_type: node_type.into(),
            reason: reason.into(),
        }
    }
}
