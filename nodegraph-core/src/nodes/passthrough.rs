//! Pass-through and constant nodes.

use serde_json::{Map, Value as JsonValue};

use crate::error::{NodeGraphError, Result};
use crate::node::{Completion, Computation, Inputs, Node, Outputs, Serializable, TriggerPolicy};

/// Forwards its single input value to every output.
///
/// This is the behaviour of a node that does not override its computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl PassThrough {
    pub const TYPE_NAME: &'static str = "PassThrough";

    /// One unkeyed input, one unkeyed output, `Any` policy.
    pub fn node() -> Result<Node> {
        Node::builder()
            .input("")
            .output("")
            .name(Self::TYPE_NAME)
            .build(PassThrough)
    }
}

impl Computation for PassThrough {
    fn run(&self, inputs: &Inputs, completion: Completion) {
        match inputs.sole() {
            Some(value) => completion.complete(Outputs::broadcast(value.clone())),
            None => completion.finish(),
        }
    }

    fn serializable(&self) -> Option<&dyn Serializable> {
        Some(self)
    }
}

impl Serializable for PassThrough {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }
}

/// Emits a fixed number when processed explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub const TYPE_NAME: &'static str = "Constant";

    /// No inputs, one unkeyed output, `NoAutomaticProcessing` policy.
    pub fn node(value: f64) -> Result<Node> {
        Node::builder()
            .output("")
            .trigger(TriggerPolicy::NoAutomaticProcessing)
            .name(Self::TYPE_NAME)
            .build(Constant { value })
    }

    /// Rebuild from exported data.
    pub fn from_data(data: Option<&Map<String, JsonValue>>) -> Result<Node> {
        let value = data
            .and_then(|data| data.get("value"))
            .and_then(JsonValue::as_f64)
            .ok_or_else(|| NodeGraphError::factory(Self::TYPE_NAME, "missing numeric 'value'"))?;
        Self::node(value)
    }

    /// The emitted number.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Computation for Constant {
    fn run(&self, _inputs: &Inputs, completion: Completion) {
        completion.complete(Outputs::broadcast(self.value));
    }

    fn serializable(&self) -> Option<&dyn Serializable> {
        Some(self)
    }
}

impl Serializable for Constant {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn self_data(&self) -> Option<Map<String, JsonValue>> {
        let mut data = Map::new();
        data.insert("value".to_string(), JsonValue::from(self.value));
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::validators;

    #[test]
    fn pass_through_forwards_value() {
        let first = PassThrough::node().unwrap();
        let second = PassThrough::node().unwrap();
        first.connect("", &second, "").unwrap();

        first.sole_input().unwrap().set(42.0);

        let forwarded = second.sole_input().unwrap().get();
        assert_eq!(forwarded.as_ref().and_then(validators::as_number), Some(42.0));
    }

    #[test]
    fn constant_emits_on_process_only() {
        let constant = Constant::node(2.5).unwrap();
        let target = PassThrough::node().unwrap();
        constant.connect("", &target, "").unwrap();

        assert!(target.sole_input().unwrap().get().is_none());
        constant.process();
        let received = target.sole_input().unwrap().get();
        assert_eq!(received.as_ref().and_then(validators::as_number), Some(2.5));
    }

    #[test]
    fn constant_data_round_trip() {
        let data = Constant { value: 4.0 }.self_data();
        let node = Constant::from_data(data.as_ref()).unwrap();
        let data = node.serializable().and_then(|s| s.self_data()).unwrap();
        assert_eq!(data.get("value").and_then(JsonValue::as_f64), Some(4.0));

        assert!(matches!(
            Constant::from_data(None),
            Err(NodeGraphError::Factory { .. })
        ));
    }
}
