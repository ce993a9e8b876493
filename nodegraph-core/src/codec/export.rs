//! Export: container → portable representation.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::representation::{
    OutputConnections, SerializedConnection, SerializedGraph, SerializedNode,
};
use crate::error::{NodeGraphError, Result};
use crate::graph::GraphContainer;
use crate::node::{Node, NodeId};

/// Caller-supplied export settings.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Portable ids to use for specific members. Members without an entry
    /// get a generated `node-<n>` id.
    pub id_mapping: HashMap<NodeId, String>,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `portable` as the exported id of `node`.
    pub fn with_id(mut self, node: NodeId, portable: impl Into<String>) -> Self {
        self.id_mapping.insert(node, portable.into());
        self
    }
}

impl Node {
    /// This node's downstream connections keyed by output, using portable
    /// ids from `mapping`. Targets missing from `mapping` are omitted, as are
    /// outputs left without connections.
    pub fn output_connections(&self, mapping: &HashMap<NodeId, String>) -> OutputConnections {
        let mut outputs = OutputConnections::new();
        for port in self.output_ports() {
            let connections: Vec<SerializedConnection> = port
                .connections()
                .into_iter()
                .filter_map(|connection| {
                    mapping
                        .get(&connection.target)
                        .map(|target| SerializedConnection {
                            target_node_id: target.clone(),
                            target_input_key: connection.input.as_portable().to_string(),
                        })
                })
                .collect();
            if !connections.is_empty() {
                outputs.insert(port.key().as_portable().to_string(), connections);
            }
        }
        outputs
    }
}

/// Export `container` with generated ids.
pub fn export(container: &GraphContainer) -> Result<SerializedGraph> {
    export_with(container, &ExportOptions::default())
}

/// Export `container`, honoring the id mapping in `options`.
///
/// Fails with [`NodeGraphError::NotSerializable`] if any member lacks the
/// serialization capability; partial exports are never produced.
pub fn export_with(container: &GraphContainer, options: &ExportOptions) -> Result<SerializedGraph> {
    let members = container.nodes();
    if let Some(node) = members.iter().find(|node| node.serializable().is_none()) {
        return Err(NodeGraphError::NotSerializable(node.id()));
    }

    let mapping = assign_ids(&members, options)?;

    let mut nodes = Vec::with_capacity(members.len());
    let mut connections = BTreeMap::new();
    for node in &members {
        let Some(description) = node.serializable() else {
            return Err(NodeGraphError::NotSerializable(node.id()));
        };
        let id = mapping[&node.id()].clone();

        let outputs = node.output_connections(&mapping);
        if !outputs.is_empty() {
            connections.insert(id.clone(), outputs);
        }

        nodes.push(SerializedNode {
            id,
            node_type: description.type_name().to_string(),
            name: node.name(),
            description: node.description(),
            data: description.self_data(),
        });
    }

    let graph = SerializedGraph { nodes, connections };
    debug!(
        nodes = graph.nodes.len(),
        connections = graph.connection_count(),
        "exported graph"
    );
    Ok(graph)
}

/// Member id → portable id, preferring caller-supplied ids.
fn assign_ids(members: &[Node], options: &ExportOptions) -> Result<HashMap<NodeId, String>> {
    let mut taken = HashSet::new();
    let mut mapping = HashMap::with_capacity(members.len());

    for node in members {
        if let Some(portable) = options.id_mapping.get(&node.id()) {
            if !taken.insert(portable.clone()) {
                return Err(NodeGraphError::DuplicateNodeId(portable.clone()));
            }
            mapping.insert(node.id(), portable.clone());
        }
    }

    let mut counter = 0usize;
    for node in members {
        if mapping.contains_key(&node.id()) {
            continue;
        }
        let portable = loop {
            let candidate = format!("node-{counter}");
            counter += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(portable.clone());
        mapping.insert(node.id(), portable);
    }

    Ok(mapping)
}
