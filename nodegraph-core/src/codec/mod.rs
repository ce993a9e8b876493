//! Serialization Codec
//!
//! Converts a [`GraphContainer`](crate::graph::GraphContainer) to and from a
//! [`SerializedGraph`], a reference-free form that can be written as JSON or
//! MessagePack.
//!
//! # How Export Works
//!
//! 1. Every member gets a portable id, either from [`ExportOptions`] or a
//!    generated `node-<n>`.
//! 2. Each member describes itself through its
//!    [`Serializable`](crate::node::Serializable) capability: a type name and
//!    optional opaque data. Labels are recorded alongside.
//! 3. Output connections are written with portable target ids; connections
//!    leaving the container are dropped.
//!
//! # How Import Works
//!
//! 1. Each record is instantiated through a [`NodeRegistry`].
//! 2. Connections are wired through [`Node::connect`](crate::node::Node::connect).
//! 3. The nodes become the membership of a new container.
//!
//! Unknown types, references to ids not in the node list and duplicate ids
//! fail the whole import. No partial graph is ever returned.

mod export;
mod import;
mod registry;
mod representation;

pub use export::{export, export_with, ExportOptions};
pub use import::import;
pub use registry::{NodeFactory, NodeRegistry};
pub use representation::{
    OutputConnections, SerializedConnection, SerializedGraph, SerializedNode,
};

// ---- Tests ----
