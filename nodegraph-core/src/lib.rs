//! NodeGraph Core
//!
//! This crate provides the processing core for reactive node graphs.
//! It implements:
//!
//! - Nodes with keyed input/output ports and trigger policies
//! - A per-node processing state machine with locking and cancellation
//! - Deferred, coalesced processing within a batch
//! - Graph containers that own a node set and validate its topology
//! - A serialization codec with JSON and MessagePack encodings
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `node`: Node handles, the builder, trigger policies and the state machine
//! - `port`: Input and output ports, values and validators
//! - `runtime`: The node arena and the batch that drives deferred processing
//! - `graph`: Graph containers
//! - `codec`: Export, import and the node type registry
//! - `nodes`: Reference node types
//!
//! # Example
//!
//! ```rust
//! use nodegraph_core::node::TriggerPolicy;
//! use nodegraph_core::nodes::{Divide, PassThrough};
//! use nodegraph_core::port::validators;
//!
//! let divide = Divide::node(TriggerPolicy::All).unwrap();
//! let result = PassThrough::node().unwrap();
//! divide.connect("result", &result, "").unwrap();
//!
//! // The first assignment alone does not satisfy `All`.
//! divide.set_input("a", 20.0).unwrap();
//! divide.set_input("b", 4.0).unwrap();
//!
//! let value = result.sole_input().unwrap().get();
//! assert_eq!(value.as_ref().and_then(validators::as_number), Some(5.0));
//! ```

pub mod codec;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod port;
pub mod runtime;

pub use codec::{export, import, NodeRegistry, SerializedGraph};
pub use error::{NodeGraphError, Result};
pub use graph::GraphContainer;
pub use node::{Completion, Computation, Node, NodeId, Outputs, ProcessingState, TriggerPolicy};
pub use runtime::batch;
