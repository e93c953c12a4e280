//! Blueprint nodes.
//!
//! On the wire a node nests everything interesting under `data`, alongside
//! canvas-only fields (`position`, `type`) that the graph never looks at.
//! [`Node`] flattens that into the parts the graph and the mapping store use,
//! and serializes back into the same nested shape.

use serde::{Deserialize, Serialize};

use crate::id::{FormId, NodeId};
use crate::mapping::{MappingTable, SourceRef};

/// A graph vertex instantiating a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNode", into = "WireNode")]
pub struct Node {
    /// Unique id within the blueprint.
    pub id: NodeId,
    /// The form this node instantiates.
    pub component_id: FormId,
    pub component_key: String,
    pub component_type: String,
    /// Display name; also used as the source form name of mappings.
    pub name: String,
    /// Mappings that arrived with the blueprint. Moved into the
    /// [`MappingStore`](crate::mapping::MappingStore) when a session loads,
    /// so nodes held by a loaded graph carry an empty seed.
    pub(crate) seed_mapping: MappingTable,
}

impl Node {
    /// Creates a form node with no initial mappings.
    pub fn new(
        id: impl Into<NodeId>,
        component_id: impl Into<FormId>,
        name: impl Into<String>,
    ) -> Self {
        Node {
            id: id.into(),
            component_id: component_id.into(),
            component_key: String::new(),
            component_type: "form".to_string(),
            name: name.into(),
            seed_mapping: MappingTable::new(),
        }
    }

    /// Adds a mapping the node starts out with, as if it came in the
    /// blueprint's `input_mapping`.
    pub fn with_input(mut self, field_key: impl Into<String>, source: SourceRef) -> Self {
        self.seed_mapping.insert(field_key.into(), source);
        self
    }

    pub(crate) fn take_seed(&mut self) -> MappingTable {
        std::mem::take(&mut self.seed_mapping)
    }
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct WireNode {
    id: NodeId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
    data: WireNodeData,
}

#[derive(Serialize, Deserialize)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Serialize, Deserialize)]
struct WireNodeData {
    component_id: FormId,
    #[serde(default)]
    component_key: String,
    #[serde(default)]
    component_type: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_mapping: Option<MappingTable>,
}

impl From<WireNode> for Node {
    fn from(wire: WireNode) -> Self {
        Node {
            id: wire.id,
            component_id: wire.data.component_id,
            component_key: wire.data.component_key,
            component_type: wire.data.component_type,
            name: wire.data.name,
            seed_mapping: wire.data.input_mapping.unwrap_or_default(),
        }
    }
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        let input_mapping = if node.seed_mapping.is_empty() {
            None
        } else {
            Some(node.seed_mapping)
        };
        WireNode {
            id: node.id,
            kind: Some("form".to_string()),
            position: None,
            data: WireNodeData {
                component_id: node.component_id,
                component_key: node.component_key,
                component_type: node.component_type,
                name: node.name,
                input_mapping,
            },
        }
    }
}
