//! Node Type Registry
//!
//! Maps the `type` string of a serialized node to a factory that rebuilds a
//! node from its optional `data`. Import is driven entirely by the registry;
//! the codec never knows about concrete node types.
//!
//! ```rust,ignore
//! let mut registry = NodeRegistry::with_builtins();
//! registry.register("Scale", |data| Scale::from_data(data));
//! let graph = import(&repr, &registry)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::error::{NodeGraphError, Result};
use crate::node::Node;
use crate::nodes::{Add, AssembleColor, Constant, Divide, PassThrough};

/// Builds a node from its exported data.
pub type NodeFactory = Arc<dyn Fn(Option<&Map<String, JsonValue>>) -> Result<Node> + Send + Sync>;

/// Registry of node factories, keyed by type name.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every node type in [`crate::nodes`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(PassThrough::TYPE_NAME, |_| PassThrough::node());
        registry.register(Constant::TYPE_NAME, Constant::from_data);
        registry.register(Divide::TYPE_NAME, Divide::from_data);
        registry.register(Add::TYPE_NAME, Add::from_data);
        registry.register(AssembleColor::TYPE_NAME, |_| AssembleColor::node());
        registry
    }

    /// Register (or replace) the factory for `node_type`.
    pub fn register<F>(&mut self, node_type: impl Into<String>, factory: F)
    where
        F: Fn(Option<&Map<String, JsonValue>>) -> Result<Node> + Send + Sync + 'static,
    {
        self.factories.insert(node_type.into(), Arc::new(factory));
    }

    /// Add every entry of `other`, replacing entries with the same type.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.factories.extend(other.factories);
    }

    /// Whether a factory exists for `node_type`.
    pub fn has_type(&self, node_type: &str) -> bool {
        self.factories.contains_key(node_type)
    }

    /// Registered type names, sorted.
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Build a node of `node_type` from `data`.
    pub fn create(&self, node_type: &str, data: Option<&Map<String, JsonValue>>) -> Result<Node> {
        let factory = self
            .factories
            .get(node_type)
            .ok_or_else(|| NodeGraphError::UnknownNodeType(node_type.to_string()))?;
        factory(data)
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.node_types())
            .finish()
    }
}
