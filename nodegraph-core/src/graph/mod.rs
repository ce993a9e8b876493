//! Graph Containers
//!
//! Nodes reference each other only weakly, through output connections. The
//! container is the owning side of a graph:
//!
//! - it holds strong handles to its members,
//! - it guarantees that connections never leave the member set,
//! - it cancels and processes its members as a unit.
//!
//! # Design Decisions
//!
//! 1. Membership is replaced as a whole (`set_node_set`) rather than edited
//!    node by node, so topology validation sees the complete candidate set
//!    and can reject it atomically.
//!
//! 2. Members are kept in insertion order. Export assigns portable ids in
//!    that order, which makes repeated exports of an unchanged container
//!    produce the same representation.

mod container;

pub use container::GraphContainer;
