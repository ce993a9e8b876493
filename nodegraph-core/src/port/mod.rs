//! Ports
//!
//! Ports are the attachment points of a node.
//!
//! - An **input** holds the last value delivered to it, optionally guarded by
//!   a validator. Setting an input notifies the owning node, which runs its
//!   trigger evaluation.
//! - An **output** multiplexes a node's result to any number of downstream
//!   inputs. Its connections are non-owning: they name the target node by id
//!   and resolve it through the node arena at emission time.
//!
//! Ports are keyed by an optional string. An unkeyed port is written as the
//! empty string in the portable representation.

mod input;
mod output;
mod value;
pub mod validators;

use std::fmt;

pub use input::{Input, InputPort, Validator};
pub use output::{Connection, OutputPort};
pub use value::Value;

/// The optional key of a port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PortKey(Option<String>);

impl PortKey {
    /// The key of an anonymous port.
    pub fn unkeyed() -> Self {
        Self(None)
    }

    /// Key as an optional string slice.
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether this is the anonymous key.
    pub fn is_unkeyed(&self) -> bool {
        self.0.is_none()
    }

    /// String form used in the portable representation.
    pub fn as_portable(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }

    /// Parse the portable string form; the empty string is the anonymous key.
    pub fn from_portable(key: &str) -> Self {
        Self::from(key)
    }
}

impl From<&str> for PortKey {
    fn from(key: &str) -> Self {
        if key.is_empty() {
            Self(None)
        } else {
            Self(Some(key.to_string()))
        }
    }
}

impl From<String> for PortKey {
    fn from(key: String) -> Self {
        if key.is_empty() {
            Self(None)
        } else {
            Self(Some(key))
        }
    }
}

impl From<Option<&str>> for PortKey {
    fn from(key: Option<&str>) -> Self {
        key.map(PortKey::from).unwrap_or_default()
    }
}

impl From<&PortKey> for PortKey {
    fn from(key: &PortKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(key) => f.write_str(key),
            None => f.write_str("<unkeyed>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_unkeyed() {
        assert!(PortKey::from("").is_unkeyed());
        assert!(PortKey::from(String::new()).is_unkeyed());
        assert!(PortKey::from(None::<&str>).is_unkeyed());
    }

    #[test]
    fn portable_form_round_trips() {
        let keyed = PortKey::from("r");
        assert_eq!(PortKey::from_portable(keyed.as_portable()), keyed);

        let unkeyed = PortKey::unkeyed();
        assert_eq!(unkeyed.as_portable(), "");
        assert_eq!(PortKey::from_portable(""), unkeyed);
    }
}
