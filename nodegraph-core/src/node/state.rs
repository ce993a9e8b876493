//! Processing State
//!
//! ```text
//!            request (deferred)        batch closes
//!   Idle ─────────────────────▶ Deferred ───────────▶ Processing
//!    ▲  ╲                          │                      │
//!    │   ╲ request (direct)        │ cancel               │ completion
//!    │    ╲────────────────────────┼─────────────────────▶│
//!    │                             ▼                      │
//!    │◀──────────────────────── Cancelling ◀── cancel ────┤
//!    │       late completion (discarded)                  │
//!    └────────────────────────────────────────────────────┘
//! ```
//!
//! A cancelled `Deferred` node has nothing in flight and returns to `Idle`
//! immediately. A cancelled `Processing` node waits in `Cancelling` for the
//! completion of the run already started, discards it, then returns to `Idle`.

use std::time::{Duration, Instant};

use smallvec::{smallvec, SmallVec};

use crate::port::Value;

/// Where a node is in its processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessingState {
    /// Nothing scheduled or running.
    #[default]
    Idle,

    /// A run is queued for the end of the current batch.
    Deferred,

    /// The computation is running; its completion has not fired yet.
    Processing,

    /// A run was cancelled; its completion will be discarded.
    Cancelling,
}

impl ProcessingState {
    /// Whether a run is scheduled or in flight.
    pub fn is_busy(&self) -> bool {
        !matches!(self, ProcessingState::Idle)
    }
}

/// Mutable state of a node, guarded by the node's mutex.
#[derive(Debug)]
pub(crate) struct NodeState {
    pub processing: ProcessingState,
    pub lock_count: usize,
    /// A request arrived while locked or busy and must be raised again.
    pub pending: bool,
    pub values: SmallVec<[Option<Value>; 4]>,
    pub touched: SmallVec<[bool; 4]>,
    pub seen: SmallVec<[bool; 4]>,
    /// Sequence number of the most recently started run.
    pub run: u64,
    pub started_at: Option<Instant>,
    pub duration: Option<Duration>,
    pub completed_runs: u64,
}

impl NodeState {
    pub fn new(input_count: usize) -> Self {
        Self {
            processing: ProcessingState::Idle,
            lock_count: 0,
            pending: false,
            values: smallvec![None; input_count],
            touched: smallvec![false; input_count],
            seen: smallvec![false; input_count],
            run: 0,
            started_at: None,
            duration: None,
            completed_runs: 0,
        }
    }

    pub fn reset_touched(&mut self) {
        self.touched.iter_mut().for_each(|t| *t = false);
    }
}
