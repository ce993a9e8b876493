//! Nodes
//!
//! A node is a processing unit with keyed inputs, keyed outputs and a
//! trigger policy. Take a divide node as the simplest example:
//!
//! ```text
//!   20         4
//!    \        /
//!   --a------b--
//!  |            |
//!  |   Divide   |
//!  |  O = A / B |
//!  |            |
//!   ---result---
//!        |
//!        5
//! ```
//!
//! # How a node runs
//!
//! 1. Setting an input stores the value, marks the input touched and runs
//!    trigger evaluation.
//!
//! 2. If the policy raises a request and the node is unlocked, the node
//!    either runs immediately or, when it defers, waits for the end of the
//!    current batch.
//!
//! 3. The computation receives a snapshot of the inputs and a completion
//!    signal. When the signal fires, each output emits its value to its
//!    connections and the node returns to `Idle`.
//!
//! Requests that arrive while the node is locked or already running are
//! remembered and raised again afterwards; at most one run per node is ever
//! in flight.
//!
//! While a node emits, it is on the thread's propagation path. A value that
//! travels around a cycle and arrives back at the node is stored but does
//! not start another run, so feeding a cyclic graph always returns.

mod builder;
mod computation;
mod handle;
mod id;
mod state;
mod trigger;

pub use builder::NodeBuilder;
pub use computation::{from_fn, Completion, Computation, Inputs, Outputs, Serializable};
pub use handle::{Node, WeakNode};
pub use id::NodeId;
pub use state::ProcessingState;
pub use trigger::TriggerPolicy;
