//! Transitive ancestor discovery over the reverse adjacency index.

use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::graph::AdjacencyIndex;
use crate::id::NodeId;

/// Returns every node reachable from `target` by following edges backward,
/// each exactly once, in breadth-first discovery order.
///
/// Nearer ancestors come before farther ones; ancestors at the same distance
/// keep the order of the reverse index. The queue is seeded with the
/// deduplicated direct parents of `target`, and a visited set keeps deeper
/// levels from revisiting a node reached along several paths (or looping on
/// a cycle). `target` itself is never part of the result.
///
/// A node with no parents, or an id the index has never seen, has no
/// ancestors.
///
/// Runs in O(V + E) over the part of the graph reachable backward from
/// `target`; `reverse` is expected to be built once per graph and reused.
pub fn ancestors_of(target: &NodeId, reverse: &AdjacencyIndex) -> Vec<NodeId> {
    let seeds: IndexSet<&NodeId> = reverse.neighbors(target).iter().collect();
    let mut queue: VecDeque<&NodeId> = seeds.into_iter().collect();
    let mut visited: IndexSet<&NodeId> = IndexSet::new();

    while let Some(node) = queue.pop_front() {
        if node == target || !visited.insert(node) {
            continue;
        }
        for parent in reverse.neighbors(node) {
            if !visited.contains(parent) {
                queue.push_back(parent);
            }
        }
    }

    visited.into_iter().cloned().collect()
}
