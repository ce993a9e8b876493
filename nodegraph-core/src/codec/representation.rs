//! Portable Representation
//!
//! The serialized form of a graph. It contains only strings, ordered lists,
//! key-ordered maps and scalars; nodes refer to each other by portable id,
//! never by live identity, so cycles need no special handling.
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": "node-0", "type": "Constant", "data": { "value": 20.0 } },
//!     { "id": "node-1", "type": "Divide", "name": "Divide" }
//!   ],
//!   "connections": {
//!     "node-0": { "": [ { "targetNodeId": "node-1", "targetInputKey": "a" } ] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;

/// Output key → ordered downstream connections.
pub type OutputConnections = BTreeMap<String, Vec<SerializedConnection>>;

/// A complete serialized graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedGraph {
    /// Node records, in export order.
    pub nodes: Vec<SerializedNode>,

    /// Connections, by source node id.
    #[serde(default)]
    pub connections: BTreeMap<String, OutputConnections>,
}

/// One node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    /// Portable id, unique within the representation.
    pub id: String,

    /// Type name used to find the factory on import.
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Opaque node configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, JsonValue>>,
}

/// One downstream connection of an output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedConnection {
    pub target_node_id: String,
    pub target_input_key: String,
}

impl SerializedGraph {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as MessagePack, with field names.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decode from MessagePack.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Total number of recorded connections.
    pub fn connection_count(&self) -> usize {
        self.connections
            .values()
            .flat_map(|outputs| outputs.values())
            .map(Vec::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SerializedGraph {
        let mut data = Map::new();
        data.insert("value".to_string(), JsonValue::from(20.0));

        let mut outputs = OutputConnections::new();
        outputs.insert(
            String::new(),
            vec![SerializedConnection {
                target_node_id: "node-1".to_string(),
                target_input_key: "a".to_string(),
            }],
        );

        SerializedGraph {
            nodes: vec![
                SerializedNode {
                    id: "node-0".to_string(),
                    node_type: "Constant".to_string(),
                    name: None,
                    description: None,
                    data: Some(data),
                },
                SerializedNode {
                    id: "node-1".to_string(),
                    node_type: "Divide".to_string(),
                    name: Some("Divide".to_string()),
                    description: None,
                    data: None,
                },
            ],
            connections: BTreeMap::from([("node-0".to_string(), outputs)]),
        }
    }

    #[test]
    fn json_field_names() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"type\":\"Constant\""));
        assert!(json.contains("\"targetNodeId\":\"node-1\""));
        assert!(json.contains("\"targetInputKey\":\"a\""));
        assert!(!json.contains("description"));
    }

    #[test]
    fn json_round_trip() {
        let graph = sample();
        let decoded = SerializedGraph::from_json(&graph.to_json_pretty().unwrap()).unwrap();
        assert_eq!(decoded, graph);
    }

    #[test]
    fn msgpack_round_trip() {
        let graph = sample();
        let decoded = SerializedGraph::from_msgpack(&graph.to_msgpack().unwrap()).unwrap();
        assert_eq!(decoded, graph);
    }

    #[test]
    fn missing_connections_default_to_empty() {
        let graph =
            SerializedGraph::from_json(r#"{"nodes":[{"id":"x","type":"PassThrough"}]}"#).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(SerializedGraph::from_json("{").is_err());
    }
}
