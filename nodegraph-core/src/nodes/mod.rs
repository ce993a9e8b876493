//! Reference Nodes
//!
//! A handful of small, serializable node types. They exercise the engine
//! and the codec end to end and serve as templates for real node types;
//! [`NodeRegistry::with_builtins`](crate::codec::NodeRegistry::with_builtins)
//! registers all of them.

mod arithmetic;
mod color;
mod passthrough;

pub use arithmetic::{Add, Divide};
pub use color::{AssembleColor, Color};
pub use passthrough::{Constant, PassThrough};
