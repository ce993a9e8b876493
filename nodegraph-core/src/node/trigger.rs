//! Trigger Policies
//!
//! A trigger policy decides, from the "touched" flags of a node's inputs,
//! whether an input notification should raise a processing request.
//!
//! Evaluation is a pure function of two flag slices:
//!
//! - `touched[i]`: input `i` was set since the node's last run started
//! - `seen[i]`: input `i` has been set at least once since construction
//!
//! | Policy                  | Raises a request when                           |
//! |-------------------------|-------------------------------------------------|
//! | `NoAutomaticProcessing` | never                                           |
//! | `Any`                   | any input is touched                            |
//! | `All`                   | every input is touched                          |
//! | `AllAtLeastOnce`        | every input was seen and at least one touched   |
//! | `Custom`                | never; the computation decides                  |

use serde::{Deserialize, Serialize};

/// Decides what inputs need to be set in order for a node to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// The node never processes on its own; call `process()` explicitly.
    NoAutomaticProcessing,

    /// Process as soon as any input is set.
    #[default]
    Any,

    /// Every input has to be set between two runs.
    All,

    /// Like `All` for the first run; afterwards any single input set runs the
    /// node again with the last known values of the others.
    AllAtLeastOnce,

    /// Processing is driven by the node's computation itself.
    Custom,
}

impl TriggerPolicy {
    /// Evaluate the policy against the current touched/seen flags.
    pub fn should_raise(&self, touched: &[bool], seen: &[bool]) -> bool {
        match self {
            TriggerPolicy::NoAutomaticProcessing | TriggerPolicy::Custom => false,
            TriggerPolicy::Any => touched.iter().any(|t| *t),
            TriggerPolicy::All => touched.iter().all(|t| *t),
            TriggerPolicy::AllAtLeastOnce => {
                seen.iter().all(|s| *s) && touched.iter().any(|t| *t)
            }
        }
    }

    /// Whether the engine resets touched flags when a run starts.
    ///
    /// `Custom` nodes manage their own bookkeeping and keep the flags.
    pub fn resets_touched(&self) -> bool {
        !matches!(self, TriggerPolicy::Custom)
    }

    /// Whether the policy can raise requests from input notifications.
    pub fn is_automatic(&self) -> bool {
        matches!(
            self,
            TriggerPolicy::Any | TriggerPolicy::All | TriggerPolicy::AllAtLeastOnce
        )
    }

    /// Default deferral decision for a node with `input_count` inputs.
    ///
    /// Nodes with several inputs and an automatic policy defer their run to
    /// the end of the current batch, so that setting several inputs in a row
    /// produces one run with the latest values.
    pub fn defers_by_default(&self, input_count: usize) -> bool {
        input_count > 1 && self.is_automatic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_policies_never_raise() {
        for policy in [TriggerPolicy::NoAutomaticProcessing, TriggerPolicy::Custom] {
            assert!(!policy.should_raise(&[true, true], &[true, true]));
        }
    }

    #[test]
    fn any_raises_on_single_touch() {
        let policy = TriggerPolicy::Any;
        assert!(policy.should_raise(&[false, true], &[false, true]));
        assert!(!policy.should_raise(&[false, false], &[true, true]));
    }

    #[test]
    fn all_requires_every_input_touched() {
        let policy = TriggerPolicy::All;
        assert!(!policy.should_raise(&[true, false], &[true, true]));
        assert!(policy.should_raise(&[true, true], &[true, true]));
    }

    #[test]
    fn all_at_least_once_reuses_seen_inputs() {
        let policy = TriggerPolicy::AllAtLeastOnce;
        // Before every input was seen once, behaves like All.
        assert!(!policy.should_raise(&[true, false], &[true, false]));
        // Afterwards a single touch is enough.
        assert!(policy.should_raise(&[false, true], &[true, true]));
        assert!(!policy.should_raise(&[false, false], &[true, true]));
    }

    #[test]
    fn default_deferral() {
        assert!(!TriggerPolicy::Any.defers_by_default(1));
        assert!(TriggerPolicy::Any.defers_by_default(2));
        assert!(TriggerPolicy::All.defers_by_default(3));
        assert!(TriggerPolicy::AllAtLeastOnce.defers_by_default(2));
        assert!(!TriggerPolicy::Custom.defers_by_default(4));
        assert!(!TriggerPolicy::NoAutomaticProcessing.defers_by_default(4));
    }
}
