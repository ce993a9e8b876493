//! Arithmetic nodes.
//!
//! Both nodes take numeric inputs `a` and `b` and carry their trigger policy
//! in their exported data, so an imported graph keeps the same firing
//! behaviour.

use serde_json::{Map, Value as JsonValue};

use crate::error::{NodeGraphError, Result};
use crate::node::{Completion, Computation, Inputs, Node, Outputs, Serializable, TriggerPolicy};
use crate::port::validators;

fn trigger_data(trigger: TriggerPolicy) -> Option<Map<String, JsonValue>> {
    let mut data = Map::new();
    data.insert("trigger".to_string(), serde_json::to_value(trigger).ok()?);
    Some(data)
}

fn trigger_from_data(
    type_name: &str,
    data: Option<&Map<String, JsonValue>>,
    default: TriggerPolicy,
) -> Result<TriggerPolicy> {
    match data.and_then(|data| data.get("trigger")) {
        None => Ok(default),
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|err| NodeGraphError::factory(type_name, format!("invalid trigger: {err}"))),
    }
}

fn binary_node(
    name: &str,
    output: &str,
    trigger: TriggerPolicy,
    computation: impl Computation,
) -> Result<Node> {
    Node::builder()
        .validated_input("a", validators::number)
        .validated_input("b", validators::number)
        .output(output)
        .trigger(trigger)
        .name(name)
        .build(computation)
}

/// `result = a / b`. Emits nothing when `b` is zero or an input is missing.
#[derive(Debug, Clone, Copy)]
pub struct Divide {
    trigger: TriggerPolicy,
}

impl Divide {
    pub const TYPE_NAME: &'static str = "Divide";

    /// A divide node with the given trigger policy.
    pub fn node(trigger: TriggerPolicy) -> Result<Node> {
        binary_node(Self::TYPE_NAME, "result", trigger, Divide { trigger })
    }

    /// Rebuild from exported data; defaults to `All`.
    pub fn from_data(data: Option<&Map<String, JsonValue>>) -> Result<Node> {
        let trigger = trigger_from_data(Self::TYPE_NAME, data, TriggerPolicy::All)?;
        Self::node(trigger)
    }
}

impl Computation for Divide {
    fn run(&self, inputs: &Inputs, completion: Completion) {
        match (inputs.number("a"), inputs.number("b")) {
            (Some(a), Some(b)) if b != 0.0 => {
                completion.complete(Outputs::new().with("result", a / b));
            }
            _ => completion.finish(),
        }
    }

    fn serializable(&self) -> Option<&dyn Serializable> {
        Some(self)
    }
}

impl Serializable for Divide {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn self_data(&self) -> Option<Map<String, JsonValue>> {
        trigger_data(self.trigger)
    }
}

/// `sum = a + b`, treating a missing input as zero.
#[derive(Debug, Clone, Copy)]
pub struct Add {
    trigger: TriggerPolicy,
}

impl Add {
    pub const TYPE_NAME: &'static str = "Add";

    /// An add node with the given trigger policy.
    pub fn node(trigger: TriggerPolicy) -> Result<Node> {
        binary_node(Self::TYPE_NAME, "sum", trigger, Add { trigger })
    }

    /// Rebuild from exported data; defaults to `Any`.
    pub fn from_data(data: Option<&Map<String, JsonValue>>) -> Result<Node> {
        let trigger = trigger_from_data(Self::TYPE_NAME, data, TriggerPolicy::Any)?;
        Self::node(trigger)
    }
}

impl Computation for Add {
    fn run(&self, inputs: &Inputs, completion: Completion) {
        let sum = inputs.number("a").unwrap_or(0.0) + inputs.number("b").unwrap_or(0.0);
        completion.complete(Outputs::new().with("sum", sum));
    }

    fn serializable(&self) -> Option<&dyn Serializable> {
        Some(self)
    }
}

impl Serializable for Add {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn self_data(&self) -> Option<Map<String, JsonValue>> {
        trigger_data(self.trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::PassThrough;

    fn result_of(node: &Node, output: &str) -> Node {
        let probe = PassThrough::node().unwrap();
        node.connect(output, &probe, "").unwrap();
        probe
    }

    fn probed(probe: &Node) -> Option<f64> {
        probe
            .sole_input()
            .and_then(|input| input.get())
            .as_ref()
            .and_then(validators::as_number)
    }

    #[test]
    fn divide_with_all_policy() {
        let divide = Divide::node(TriggerPolicy::All).unwrap();
        let probe = result_of(&divide, "result");

        divide.set_input("a", 20.0).unwrap();
        divide.set_input("b", 4.0).unwrap();
        assert_eq!(probed(&probe), Some(5.0));
        assert_eq!(divide.completed_runs(), 1);

        divide.set_input("a", 30.0).unwrap();
        assert_eq!(divide.completed_runs(), 1);
        assert_eq!(probed(&probe), Some(5.0));

        divide.set_input("b", 4.0).unwrap();
        assert_eq!(divide.completed_runs(), 2);
        assert_eq!(probed(&probe), Some(7.5));
    }

    #[test]
    fn divide_by_zero_emits_nothing() {
        let divide = Divide::node(TriggerPolicy::All).unwrap();
        let probe = result_of(&divide, "result");

        divide.set_input("a", 1.0).unwrap();
        divide.set_input("b", 0.0).unwrap();

        assert_eq!(divide.completed_runs(), 1);
        assert_eq!(probed(&probe), None);
    }

    #[test]
    fn non_numeric_inputs_are_rejected() {
        let add = Add::node(TriggerPolicy::Any).unwrap();
        assert!(!add.set_input("a", "one").unwrap());
        assert_eq!(add.completed_runs(), 0);
    }

    #[test]
    fn add_treats_missing_input_as_zero() {
        let add = Add::node(TriggerPolicy::Any).unwrap();
        let probe = result_of(&add, "sum");

        add.set_input("a", 2_i32).unwrap();
        assert_eq!(probed(&probe), Some(2.0));

        add.set_input("b", 3.5).unwrap();
        assert_eq!(probed(&probe), Some(5.5));
    }

    #[test]
    fn trigger_survives_data_round_trip() {
        let data = Divide {
            trigger: TriggerPolicy::AllAtLeastOnce,
        }
        .self_data();
        assert_eq!(
            data.as_ref().and_then(|d| d.get("trigger")),
            Some(&JsonValue::from("all_at_least_once"))
        );

        let node = Divide::from_data(data.as_ref()).unwrap();
        assert_eq!(node.trigger_policy(), TriggerPolicy::AllAtLeastOnce);

        let node = Add::from_data(None).unwrap();
        assert_eq!(node.trigger_policy(), TriggerPolicy::Any);
    }

    #[test]
    fn invalid_trigger_data_is_a_factory_error() {
        let mut data = Map::new();
        data.insert("trigger".to_string(), JsonValue::from("sometimes"));
        assert!(matches!(
            Divide::from_data(Some(&data)),
            Err(NodeGraphError::Factory { .. })
        ));
    }
}
