//! Engine Runtime
//!
//! Process- and thread-wide machinery shared by all nodes:
//!
//! - `arena`: weak id → node lookup backing non-owning connections
//! - `batch`: the deferred-processing boundary

pub mod arena;
mod batch;

pub use batch::{batch, Batch};
pub(crate) use batch::{enter_path, on_path, schedule};
