//! Data-flow edges between blueprint nodes.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Directed data-flow edge: `target` may consume data produced upstream by
/// `source`.
///
/// Edges are taken as given. Duplicates are not removed; they end up as
/// repeated entries in the adjacency lists and the ancestor search absorbs
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_source_and_target() {
        let edge: Edge =
            serde_json::from_str(r#"{"source":"form-a","target":"form-b"}"#).unwrap();
        assert_eq!(edge, Edge::new("form-a", "form-b"));
    }

    #[test]
    fn direction_matters() {
        assert_ne!(Edge::new("a", "b"), Edge::new("b", "a"));
    }
}
