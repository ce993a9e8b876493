//! Node Construction
//!
//! A node's ports are fixed at construction. [`NodeBuilder`] collects the
//! declarations and per-node configuration, validates them, and produces a
//! registered [`Node`].

use std::collections::HashSet;

use super::{Computation, Node, TriggerPolicy};
use crate::error::{NodeGraphError, Result};
use crate::port::{InputPort, OutputPort, PortKey, Value};

/// Builder for [`Node`].
///
/// # Example
///
/// ```rust,ignore
/// let divide = Node::builder()
///     .input("a")
///     .input("b")
///     .output("result")
///     .trigger(TriggerPolicy::All)
///     .name("Divide")
///     .build(DivideComputation)?;
/// ```
#[derive(Debug, Default)]
pub struct NodeBuilder {
    inputs: Vec<InputPort>,
    outputs: Vec<PortKey>,
    trigger: TriggerPolicy,
    deferred: Option<bool>,
    name: Option<String>,
    description: Option<String>,
}

impl NodeBuilder {
    /// Start a declaration with the `Any` trigger policy and no ports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an input without validation.
    pub fn input(mut self, key: impl Into<PortKey>) -> Self {
        self.inputs.push(InputPort::new(key));
        self
    }

    /// Declare an input guarded by `validator`.
    pub fn validated_input<F>(mut self, key: impl Into<PortKey>, validator: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.inputs.push(InputPort::with_validator(key, validator));
        self
    }

    /// Declare a prepared input port.
    pub fn input_port(mut self, port: InputPort) -> Self {
        self.inputs.push(port);
        self
    }

    /// Declare an output.
    pub fn output(mut self, key: impl Into<PortKey>) -> Self {
        self.outputs.push(key.into());
        self
    }

    /// Set the trigger policy.
    pub fn trigger(mut self, trigger: TriggerPolicy) -> Self {
        self.trigger = trigger;
        self
    }

    /// Override the default deferral decision.
    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = Some(deferred);
        self
    }

    /// Set the human readable name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate the declarations and construct the node.
    pub fn build(self, computation: impl Computation) -> Result<Node> {
        check_keys("input", self.inputs.iter().map(InputPort::key))?;
        check_keys("output", self.outputs.iter())?;

        let deferred = self
            .deferred
            .unwrap_or_else(|| self.trigger.defers_by_default(self.inputs.len()));
        let outputs = self.outputs.into_iter().map(OutputPort::new).collect();

        Ok(Node::from_parts(
            self.inputs.into_iter().collect(),
            outputs,
            self.trigger,
            deferred,
            self.name,
            self.description,
            Box::new(computation),
        ))
    }
}

fn check_keys<'a>(direction: &str, keys: impl Iterator<Item = &'a PortKey>) -> Result<()> {
    let keys: Vec<&PortKey> = keys.collect();
    if keys.len() > 1 && keys.iter().any(|k| k.is_unkeyed()) {
        return Err(NodeGraphError::InvalidDeclaration(format!(
            "an unkeyed {direction} is only allowed when it is the only {direction}"
        )));
    }
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(NodeGraphError::InvalidDeclaration(format!(
                "duplicate {direction} key '{key}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Completion, Inputs};

    fn noop(_: &Inputs, completion: Completion) {
        completion.finish();
    }

    #[test]
    fn rejects_duplicate_input_keys() {
        let result = NodeBuilder::new().input("a").input("a").build(noop);
        assert!(matches!(result, Err(NodeGraphError::InvalidDeclaration(_))));
    }

    #[test]
    fn rejects_unkeyed_port_among_many() {
        let result = NodeBuilder::new().input("").input("b").build(noop);
        assert!(matches!(result, Err(NodeGraphError::InvalidDeclaration(_))));

        let result = NodeBuilder::new().output("x").output("").build(noop);
        assert!(matches!(result, Err(NodeGraphError::InvalidDeclaration(_))));
    }

    #[test]
    fn single_unkeyed_ports_are_valid() {
        let node = NodeBuilder::new().input("").output("").build(noop).unwrap();
        assert!(node.sole_input().is_some());
        assert!(node.sole_output().is_some());
    }

    #[test]
    fn deferral_defaults_from_policy() {
        let two_any = NodeBuilder::new().input("a").input("b").build(noop).unwrap();
        assert!(two_any.uses_deferred_processing());

        let one_any = NodeBuilder::new().input("a").build(noop).unwrap();
        assert!(!one_any.uses_deferred_processing());

        let custom = NodeBuilder::new()
            .input("a")
            .input("b")
            .trigger(TriggerPolicy::Custom)
            .build(noop)
            .unwrap();
        assert!(!custom.uses_deferred_processing());

        let forced = NodeBuilder::new().input("a").deferred(true).build(noop).unwrap();
        assert!(forced.uses_deferred_processing());
    }

    #[test]
    fn labels_are_applied() {
        let node = NodeBuilder::new()
            .name("Divide")
            .description("O = A / B")
            .build(noop)
            .unwrap();
        assert_eq!(node.name().as_deref(), Some("Divide"));
        assert_eq!(node.description().as_deref(), Some("O = A / B"));
    }
}
