//! Deferred Processing Batches
//!
//! A batch is the boundary at which deferred nodes run. Nodes that defer
//! (see [`TriggerPolicy::defers_by_default`](crate::node::TriggerPolicy))
//! do not process as soon as a request is raised; they move to `Deferred`
//! and are queued here. The queue drains when the outermost batch on the
//! current thread closes, so several input assignments made inside one batch
//! collapse into a single run that sees the latest values.
//!
//! # Implementation
//!
//! We use a thread-local depth counter and queue. Every top-level engine
//! operation (setting an input, `process()`, `unlock()`, delivering a
//! completion) opens a batch, so a single assignment outside any caller
//! batch still runs its deferred nodes before returning.
//!
//! # Cycles
//!
//! The thread also tracks the propagation path: the nodes whose emission is
//! currently being delivered, outermost first. A deferred node remembers the
//! path it was queued from and runs with that path restored. A request that
//! reaches a node already on the path is absorbed (the value is stored, no
//! run starts), so a value travelling around a cycle stops when it gets back
//! to a node it already passed through.
//!
//! Draining is re-entrant safe: runs started by the drain open their own
//! nested batches, and nodes they defer are appended to the queue being
//! drained rather than starting a second drain.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::marker::PhantomData;

use smallvec::SmallVec;
use tracing::trace;

use crate::node::{Node, NodeId, WeakNode};

/// Nodes whose emission is being delivered, outermost first.
type Path = SmallVec<[NodeId; 8]>;

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

#[derive(Default)]
struct BatchState {
    /// Number of open [`Batch`] guards.
    depth: usize,
    /// Whether a drain loop is running on this thread.
    flushing: bool,
    /// Deferred nodes waiting for the batch to close, in request order.
    queue: VecDeque<Queued>,
    /// Current propagation path.
    path: Path,
}

/// A deferred node and the propagation path it was requested from.
struct Queued {
    node: WeakNode,
    path: Path,
}

/// Guard that keeps a batch open; deferred nodes run when the outermost
/// guard on the thread is dropped.
///
/// ```rust,ignore
/// let _batch = Batch::begin();
/// divide.set_input("a", 20.0)?;
/// divide.set_input("b", 4.0)?;
/// // `divide` runs once, when `_batch` goes out of scope.
/// ```
pub struct Batch {
    // Batches are bound to the thread whose queue they guard.
    _not_send: PhantomData<*const ()>,
}

impl Batch {
    /// Open a batch on the current thread.
    pub fn begin() -> Self {
        BATCH.with(|state| state.borrow_mut().depth += 1);
        Self {
            _not_send: PhantomData,
        }
    }

    /// Whether a batch is open on the current thread.
    pub fn is_active() -> bool {
        BATCH.with(|state| state.borrow().depth > 0)
    }

    /// Number of deferred nodes queued on the current thread.
    pub fn queued() -> usize {
        BATCH.with(|state| state.borrow().queue.len())
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        let outermost = BATCH.with(|state| {
            let mut state = state.borrow_mut();
            state.depth = state.depth.saturating_sub(1);
            state.depth == 0
        });
        if !outermost {
            return;
        }
        if std::thread::panicking() {
            abandon();
        } else {
            flush();
        }
    }
}

/// Run `f` inside a batch.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _batch = Batch::begin();
    f()
}

/// Queue a deferred node.
pub(crate) fn schedule(node: &Node) {
    let run_now = BATCH.with(|state| {
        let mut state = state.borrow_mut();
        let path = state.path.clone();
        state.queue.push_back(Queued {
            node: node.downgrade(),
            path,
        });
        state.depth == 0 && !state.flushing
    });
    trace!(node = %node.id(), "deferred processing scheduled");
    if run_now {
        flush();
    }
}

/// Whether `id` is on the current propagation path.
pub(crate) fn on_path(id: NodeId) -> bool {
    BATCH.with(|state| state.borrow().path.contains(&id))
}

/// Put `id` on the propagation path until the guard is dropped.
pub(crate) fn enter_path(id: NodeId) -> PathGuard {
    let depth = BATCH.with(|state| {
        let mut state = state.borrow_mut();
        let depth = state.path.len();
        state.path.push(id);
        depth
    });
    PathGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Truncates the propagation path back to where it was when entered.
pub(crate) struct PathGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        BATCH.with(|state| state.borrow_mut().path.truncate(self.depth));
    }
}

/// Swaps a queued run's path in, restoring the previous path on drop.
struct RestorePath(Path);

impl Drop for RestorePath {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.0);
        BATCH.with(|state| state.borrow_mut().path = previous);
    }
}

/// Resets the flushing flag even if a run panics mid-drain.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        BATCH.with(|state| state.borrow_mut().flushing = false);
    }
}

fn flush() {
    let started = BATCH.with(|state| {
        let mut state = state.borrow_mut();
        if state.flushing {
            false
        } else {
            state.flushing = true;
            true
        }
    });
    if !started {
        return;
    }

    let _guard = FlushGuard;
    let mut drained = 0usize;
    loop {
        // The borrow must end before the node runs: runs re-enter this module.
        let next = BATCH.with(|state| state.borrow_mut().queue.pop_front());
        let Some(queued) = next else { break };
        if let Some(node) = queued.node.upgrade() {
            let previous =
                BATCH.with(|state| std::mem::replace(&mut state.borrow_mut().path, queued.path));
            let _restore = RestorePath(previous);
            node.run_deferred();
            drained += 1;
        }
    }
    if drained > 0 {
        trace!(drained, "batch flushed");
    }
}

/// Drop queued work while unwinding; the nodes fall back to `Idle`.
fn abandon() {
    let queued: Vec<Queued> = BATCH.with(|state| state.borrow_mut().queue.drain(..).collect());
    for queued in queued {
        if let Some(node) = queued.node.upgrade() {
            node.abandon_deferred();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_batches_track_depth() {
        assert!(!Batch::is_active());
        {
            let _outer = Batch::begin();
            assert!(Batch::is_active());
            {
                let _inner = Batch::begin();
                assert!(Batch::is_active());
            }
            assert!(Batch::is_active());
        }
        assert!(!Batch::is_active());
    }

    #[test]
    fn path_guards_nest_and_unwind() {
        let outer = NodeId::new();
        let inner = NodeId::new();
        {
            let _outer = enter_path(outer);
            {
                let _inner = enter_path(inner);
                assert!(on_path(outer));
                assert!(on_path(inner));
            }
            assert!(on_path(outer));
            assert!(!on_path(inner));
        }
        assert!(!on_path(outer));
    }

    #[test]
    fn batch_closure_returns_value() {
        let value = batch(|| {
            assert!(Batch::is_active());
            7
        });
        assert_eq!(value, 7);
        assert!(!Batch::is_active());
        assert_eq!(Batch::queued(), 0);
    }
}
