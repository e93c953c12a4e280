//! BlueprintGraph: node index plus forward and reverse adjacency.
//!
//! [`BlueprintGraph::build`] turns the blueprint's flat node and edge lists
//! into an id-keyed node index and a forward adjacency index. The reverse
//! index is derived once during construction with [`reverse`] and reused by
//! every ancestor query against this graph version.
//!
//! # Invariants
//!
//! - Forward and reverse adjacency are exact duals: `b` appears in
//!   `forward[a]` exactly as many times as `a` appears in `reverse[b]`.
//! - Every id referenced by an edge exists in the node index. Edges with an
//!   unknown endpoint reject construction with
//!   [`PrefillError::MalformedGraph`]; a partially built graph is never
//!   returned.
//!
//! The graph is assumed to be acyclic. [`BlueprintGraph::is_acyclic`] lets
//! callers check that assumption; nothing is repaired.

use indexmap::IndexMap;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::ancestors::ancestors_of;
use crate::edge::Edge;
use crate::error::PrefillError;
use crate::id::NodeId;
use crate::node::Node;

/// Neighbor list of one node. Most form nodes have a handful of direct
/// neighbors, so these stay inline.
pub type NeighborList = SmallVec<[NodeId; 4]>;

/// Node id -> ordered list of direct neighbors.
///
/// Keys are kept in first-insertion order and each list keeps insertion
/// order with duplicates, so iteration is deterministic and mirrors the
/// edge input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AdjacencyIndex {
    lists: IndexMap<NodeId, NeighborList>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `to` to the neighbor list of `from`.
    pub fn push(&mut self, from: NodeId, to: NodeId) {
        self.lists.entry(from).or_default().push(to);
    }

    /// Returns the direct neighbors of `id`; empty if it has none.
    pub fn neighbors(&self, id: &NodeId) -> &[NodeId] {
        self.lists.get(id).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Returns `true` if `to` is a direct neighbor of `from`.
    pub fn contains(&self, from: &NodeId, to: &NodeId) -> bool {
        self.neighbors(from).contains(to)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &[NodeId])> {
        self.lists.iter().map(|(id, list)| (id, list.as_slice()))
    }

    /// Number of nodes with at least one neighbor.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Total number of (from, to) entries, duplicates included.
    pub fn pair_count(&self) -> usize {
        self.lists.values().map(|list| list.len()).sum()
    }
}

/// Derives the reverse adjacency index: for every `source -> target` entry
/// of `forward`, records `target -> source`.
///
/// Sources are visited in index order and targets in list order, so the
/// parents of a node end up ordered by their first appearance as an edge
/// source.
pub fn reverse(forward: &AdjacencyIndex) -> AdjacencyIndex {
    let mut rev = AdjacencyIndex::new();
    for (parent, children) in forward.iter() {
        for child in children {
            rev.push(child.clone(), parent.clone());
        }
    }
    rev
}

/// The blueprint graph for one loaded blueprint version.
#[derive(Debug, Clone)]
pub struct BlueprintGraph {
    /// Nodes indexed by id, in blueprint order.
    nodes: IndexMap<NodeId, Node>,
    forward: AdjacencyIndex,
    reverse: AdjacencyIndex,
}

impl BlueprintGraph {
    /// Builds the graph from the blueprint's node and edge lists.
    ///
    /// Returns [`PrefillError::MalformedGraph`] if a node id is repeated or
    /// if an edge references an id that is not in `nodes`.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Result<Self, PrefillError> {
        let mut index = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            if index.insert(node.id.clone(), node.clone()).is_some() {
                return Err(PrefillError::duplicate_node(&node.id));
            }
        }

        let mut forward = AdjacencyIndex::new();
        for edge in edges {
            for endpoint in [&edge.source, &edge.target] {
                if !index.contains_key(endpoint) {
                    return Err(PrefillError::unknown_endpoint(
                        &edge.source,
                        &edge.target,
                        endpoint,
                    ));
                }
            }
            forward.push(edge.source.clone(), edge.target.clone());
        }

        let reverse = reverse(&forward);
        let graph = BlueprintGraph {
            nodes: index,
            forward,
            reverse,
        };

        #[cfg(debug_assertions)]
        graph.assert_consistency();

        Ok(graph)
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Nodes in blueprint order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn forward(&self) -> &AdjacencyIndex {
        &self.forward
    }

    pub fn reverse(&self) -> &AdjacencyIndex {
        &self.reverse
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges as given, duplicates included.
    pub fn edge_count(&self) -> usize {
        self.forward.pair_count()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Direct parents of `id`, in reverse-index order.
    pub fn parents(&self, id: &NodeId) -> &[NodeId] {
        self.reverse.neighbors(id)
    }

    /// Direct children of `id`, in edge input order.
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.forward.neighbors(id)
    }

    /// Transitive ancestors of `id`, nearest first. See
    /// [`ancestors_of`](crate::ancestors::ancestors_of).
    pub fn ancestors_of(&self, id: &NodeId) -> Vec<NodeId> {
        ancestors_of(id, &self.reverse)
    }

    /// Returns `true` if no node can reach itself by following edges.
    pub fn is_acyclic(&self) -> bool {
        let mut g = DiGraphMap::<&str, ()>::with_capacity(self.nodes.len(), self.edge_count());
        for id in self.nodes.keys() {
            g.add_node(id.as_str());
        }
        for (from, tos) in self.forward.iter() {
            for to in tos {
                g.add_edge(from.as_str(), to.as_str(), ());
            }
        }
        !is_cyclic_directed(&g)
    }

    /// Verifies forward/reverse duality.
    ///
    /// Only called in debug builds (via `cfg(debug_assertions)`).
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        assert_eq!(
            self.forward.pair_count(),
            self.reverse.pair_count(),
            "forward and reverse adjacency disagree on edge count"
        );
        for (from, tos) in self.forward.iter() {
            for to in tos {
                assert!(
                    self.reverse.contains(to, from),
                    "edge {} -> {} missing from reverse adjacency",
                    from,
                    to
                );
            }
        }
    }
}
