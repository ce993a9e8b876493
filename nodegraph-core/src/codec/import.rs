//! Import: portable representation → container.

use std::collections::HashMap;

use tracing::debug;

use super::registry::NodeRegistry;
use super::representation::SerializedGraph;
use crate::error::{NodeGraphError, Result};
use crate::graph::GraphContainer;
use crate::node::Node;
use crate::port::PortKey;

/// Rebuild a container from `graph`, instantiating nodes through `registry`.
///
/// Any failure aborts the whole import and drops every node created so far.
pub fn import(graph: &SerializedGraph, registry: &NodeRegistry) -> Result<GraphContainer> {
    let mut lookup: HashMap<&str, Node> = HashMap::with_capacity(graph.nodes.len());
    let mut nodes = Vec::with_capacity(graph.nodes.len());

    for record in &graph.nodes {
        if lookup.contains_key(record.id.as_str()) {
            return Err(NodeGraphError::DuplicateNodeId(record.id.clone()));
        }
        let node = registry.create(&record.node_type, record.data.as_ref())?;
        if record.name.is_some() {
            node.set_name(record.name.clone());
        }
        if record.description.is_some() {
            node.set_description(record.description.clone());
        }
        lookup.insert(record.id.as_str(), node.clone());
        nodes.push(node);
    }

    for (source_id, outputs) in &graph.connections {
        let source = lookup
            .get(source_id.as_str())
            .ok_or_else(|| NodeGraphError::DanglingReference(source_id.clone()))?;
        for (output, connections) in outputs {
            let output = PortKey::from_portable(output);
            for connection in connections {
                let target = lookup
                    .get(connection.target_node_id.as_str())
                    .ok_or_else(|| {
                        NodeGraphError::DanglingReference(connection.target_node_id.clone())
                    })?;
                source.connect(
                    output.clone(),
                    target,
                    PortKey::from_portable(&connection.target_input_key),
                )?;
            }
        }
    }

    let container = GraphContainer::with_nodes(nodes)?;
    debug!(
        nodes = container.len(),
        connections = graph.connection_count(),
        "imported graph"
    );
    Ok(container)
}
