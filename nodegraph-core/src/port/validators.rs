//! Ready-made input validators.
//!
//! These cover the typed inputs the reference nodes need. Any closure with
//! the [`Validator`](super::Validator) signature works just as well.

use super::Value;
use crate::nodes::Color;

/// Accept numeric payloads (`f64`, `f32`, `i64`, `i32`, `u64`, `u32`).
pub fn number(value: Option<&Value>) -> bool {
    value.and_then(as_number).is_some()
}

/// Accept numeric payloads within `min..=max`.
pub fn number_in_range(min: f64, max: f64) -> impl Fn(Option<&Value>) -> bool + Send + Sync {
    move |value| {
        value
            .and_then(as_number)
            .is_some_and(|n| (min..=max).contains(&n))
    }
}

/// Accept [`Color`] payloads.
pub fn color(value: Option<&Value>) -> bool {
    value.is_some_and(|v| v.is::<Color>())
}

/// Accept anything but the absent value.
pub fn present(value: Option<&Value>) -> bool {
    value.is_some()
}

/// Read a numeric payload as `f64`.
pub fn as_number(value: &Value) -> Option<f64> {
    if let Some(n) = value.downcast_ref::<f64>() {
        return Some(*n);
    }
    if let Some(n) = value.downcast_ref::<f32>() {
        return Some(f64::from(*n));
    }
    if let Some(n) = value.downcast_ref::<i64>() {
        return Some(*n as f64);
    }
    if let Some(n) = value.downcast_ref::<i32>() {
        return Some(f64::from(*n));
    }
    if let Some(n) = value.downcast_ref::<u64>() {
        return Some(*n as f64);
    }
    value.downcast_ref::<u32>().map(|n| f64::from(*n))
}
