//! Color assembly.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::{Completion, Computation, Inputs, Node, Outputs, Serializable, TriggerPolicy};
use crate::port::validators;

/// An RGBA color with unit-range channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    /// An opaque color.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Takes `r`, `g` and `b` channel inputs and emits a [`Color`] on `color`.
///
/// Uses `AllAtLeastOnce`: once every channel has been set, changing a single
/// channel emits a new color built from the last known values of the others.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleColor;

impl AssembleColor {
    pub const TYPE_NAME: &'static str = "AssembleColor";

    pub fn node() -> Result<Node> {
        let unit = || validators::number_in_range(0.0, 1.0);
        Node::builder()
            .validated_input("r", unit())
            .validated_input("g", unit())
            .validated_input("b", unit())
            .output("color")
            .trigger(TriggerPolicy::AllAtLeastOnce)
            .name(Self::TYPE_NAME)
            .description("Takes RGB input and turns it into a color")
            .build(AssembleColor)
    }
}

impl Computation for AssembleColor {
    fn run(&self, inputs: &Inputs, completion: Completion) {
        match (inputs.number("r"), inputs.number("g"), inputs.number("b")) {
            (Some(r), Some(g), Some(b)) => {
                completion.complete(Outputs::new().with("color", Color::rgb(r, g, b)));
            }
            _ => completion.finish(),
        }
    }

    fn serializable(&self) -> Option<&dyn Serializable> {
        Some(self)
    }
}

impl Serializable for AssembleColor {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }
}

impl From<Color> for crate::port::Value {
    fn from(color: Color) -> Self {
        crate::port::Value::new(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::PassThrough;
    use crate::runtime::batch;

    fn received_color(probe: &Node) -> Option<Color> {
        probe
            .sole_input()
            .and_then(|input| input.get())
            .and_then(|value| value.downcast_ref::<Color>().copied())
    }

    #[test]
    fn assembles_after_every_channel_was_set() {
        let node = AssembleColor::node().unwrap();
        let probe = PassThrough::node().unwrap();
        node.connect("color", &probe, "").unwrap();

        node.set_input("r", 1.0).unwrap();
        node.set_input("g", 0.5).unwrap();
        assert!(received_color(&probe).is_none());

        node.set_input("b", 0.0).unwrap();
        assert_eq!(received_color(&probe), Some(Color::rgb(1.0, 0.5, 0.0)));

        node.set_input("g", 1.0).unwrap();
        assert_eq!(received_color(&probe), Some(Color::rgb(1.0, 1.0, 0.0)));
    }

    #[test]
    fn channels_set_together_produce_one_color() {
        let node = AssembleColor::node().unwrap();
        batch(|| {
            node.set_input("r", 0.1).unwrap();
            node.set_input("g", 0.2).unwrap();
            node.set_input("b", 0.3).unwrap();
        });
        assert_eq!(node.completed_runs(), 1);
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        let node = AssembleColor::node().unwrap();
        assert!(!node.set_input("r", 2.0).unwrap());
        assert!(node.input("r").and_then(|input| input.get()).is_none());
    }
}
