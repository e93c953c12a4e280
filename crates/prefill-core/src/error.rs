//! Error types for prefill-core.
//!
//! Only construction can fail. Lookup misses (no form for a node, no
//! mapping for a field, no ancestors) are ordinary `Option` or empty
//! results and never show up here.

use thiserror::Error;

use crate::id::NodeId;

/// Errors produced by the prefill-core crate.
#[derive(Debug, Error)]
pub enum PrefillError {
    /// The blueprint's node/edge lists do not describe a usable graph.
    /// Construction of the whole blueprint is aborted.
    #[error("malformed graph: {reason}")]
    MalformedGraph { reason: String },

    /// The blueprint document could not be decoded.
    #[error("blueprint parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PrefillError {
    pub(crate) fn unknown_endpoint(source: &NodeId, target: &NodeId, missing: &NodeId) -> Self {
        PrefillError::MalformedGraph {
            reason: format!("edge {source} -> {target} references unknown node '{missing}'"),
        }
    }

    pub(crate) fn duplicate_node(id: &NodeId) -> Self {
        PrefillError::MalformedGraph {
            reason: format!("duplicate node id '{id}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_graph_message_names_missing_node() {
        let err = PrefillError::unknown_endpoint(
            &NodeId::from("a"),
            &NodeId::from("ghost"),
            &NodeId::from("ghost"),
        );
        assert_eq!(
            err.to_string(),
            "malformed graph: edge a -> ghost references unknown node 'ghost'"
        );
    }

    #[test]
    fn parse_error_converts_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PrefillError = serde_err.into();
        assert!(matches!(err, PrefillError::Parse(_)));
    }
}
