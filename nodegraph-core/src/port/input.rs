//! Input Ports
//!
//! An [`InputPort`] is the immutable declaration of an input: its key and its
//! optional validator. The value and touched flag live in the owning node's
//! state so that storing a value and evaluating the trigger policy happen
//! under the same lock.
//!
//! [`Input`] is a borrowed handle that pairs a declaration with its node.
//! It is the back-reference from port to node: it cannot be re-pointed at a
//! different node.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::{PortKey, Value};
use crate::node::Node;

/// Predicate deciding whether a value may be stored in an input.
///
/// Validators must be pure. A validator that panics rejects the value.
pub type Validator = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// Declaration of a node input.
#[derive(Clone)]
pub struct InputPort {
    key: PortKey,
    validator: Option<Validator>,
}

impl InputPort {
    /// Declare an input without validation.
    pub fn new(key: impl Into<PortKey>) -> Self {
        Self {
            key: key.into(),
            validator: None,
        }
    }

    /// Declare an input guarded by a validator.
    pub fn with_validator<F>(key: impl Into<PortKey>, validator: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            validator: Some(Arc::new(validator)),
        }
    }

    /// The key of this input.
    pub fn key(&self) -> &PortKey {
        &self.key
    }

    /// Whether a validator is attached.
    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Check if `value` may be stored in this input.
    pub fn accepts(&self, value: Option<&Value>) -> bool {
        match &self.validator {
            None => true,
            Some(validator) => {
                catch_unwind(AssertUnwindSafe(|| validator(value))).unwrap_or(false)
            }
        }
    }
}

impl fmt::Debug for InputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPort")
            .field("key", &self.key)
            .field("validated", &self.has_validator())
            .finish()
    }
}

/// Handle to one input of a live node.
#[derive(Clone, Copy)]
pub struct Input<'a> {
    node: &'a Node,
    index: usize,
}

impl<'a> Input<'a> {
    pub(crate) fn new(node: &'a Node, index: usize) -> Self {
        Self { node, index }
    }

    /// The key of this input.
    pub fn key(&self) -> &'a PortKey {
        self.node.input_ports()[self.index].key()
    }

    /// The node owning this input.
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Store a value and notify the node.
    ///
    /// Returns `false` if the validator rejected the value, in which case
    /// nothing changed.
    pub fn set(&self, value: impl Into<Value>) -> bool {
        self.node.assign_input(self.index, Some(value.into()))
    }

    /// Store the absent value and notify the node.
    pub fn clear(&self) -> bool {
        self.node.assign_input(self.index, None)
    }

    /// The current value, if any.
    pub fn get(&self) -> Option<Value> {
        self.node.input_value(self.index)
    }

    /// Whether the input was set since the node's last run started.
    pub fn is_touched(&self) -> bool {
        self.node.input_touched(self.index)
    }
}

impl fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("node", &self.node.id())
            .field("key", self.key())
            .finish()
    }
}
