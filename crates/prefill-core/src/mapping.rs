//! Per-node prefill mappings.
//!
//! A mapping says "downstream field `key` of this node takes its value from
//! field `source_field` of the upstream form named `source_form_name`". Each
//! node owns one [`MappingTable`]; the [`MappingStore`] holds all of them.
//!
//! # Copy-on-write
//!
//! Tables are held behind `Arc`. A write goes through [`Arc::make_mut`], so a
//! table that is still referenced by a [`MappingStore::snapshot`] is cloned
//! before being modified and the snapshot keeps seeing the old value. A
//! table nobody else holds is updated without copying.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::node::Node;

/// Which upstream field supplies a downstream field's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Display name of the upstream node's form.
    #[serde(rename = "sourceFormName")]
    pub source_form_name: String,
    /// Field key on the upstream form.
    #[serde(rename = "sourceField")]
    pub source_field: String,
}

impl SourceRef {
    pub fn new(source_form_name: &str, source_field: &str) -> Self {
        SourceRef {
            source_form_name: source_form_name.to_string(),
            source_field: source_field.to_string(),
        }
    }
}

/// Downstream field key -> source. A key present here is mapped; an absent
/// key is unmapped. There is no "null" state.
pub type MappingTable = IndexMap<String, SourceRef>;

/// All mapping tables of a session, keyed by node.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    tables: HashMap<NodeId, Arc<MappingTable>>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with the mappings that arrived on the nodes, moving
    /// them out so the store is the only place they live.
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a mut Node>) -> Self {
        let tables = nodes
            .into_iter()
            .filter_map(|n| {
                let seed = n.take_seed();
                (!seed.is_empty()).then(|| (n.id.clone(), Arc::new(seed)))
            })
            .collect();
        MappingStore { tables }
    }

    /// Maps `field_key` of `node` to `source`, replacing any previous source.
    ///
    /// Any `SourceRef` is accepted; whether it names a real upstream field is
    /// up to the caller.
    pub fn set(&mut self, node: &NodeId, field_key: &str, source: SourceRef) {
        tracing::debug!(
            node = %node,
            field = field_key,
            source_form = %source.source_form_name,
            source_field = %source.source_field,
            "set mapping"
        );
        let table = self.tables.entry(node.clone()).or_default();
        Arc::make_mut(table).insert(field_key.to_string(), source);
    }

    /// Unmaps `field_key` of `node`. Clearing an unmapped field does nothing.
    pub fn clear(&mut self, node: &NodeId, field_key: &str) {
        let Some(table) = self.tables.get_mut(node) else {
            return;
        };
        if !table.contains_key(field_key) {
            return;
        }

        tracing::debug!(node = %node, field = field_key, "clear mapping");
        Arc::make_mut(table).shift_remove(field_key);
        if table.is_empty() {
            self.tables.remove(node);
        }
    }

    /// Returns the source mapped to `field_key` of `node`, if any.
    pub fn get(&self, node: &NodeId, field_key: &str) -> Option<&SourceRef> {
        self.tables.get(node).and_then(|t| t.get(field_key))
    }

    pub fn is_mapped(&self, node: &NodeId, field_key: &str) -> bool {
        self.get(node, field_key).is_some()
    }

    /// Returns the node's whole table, or `None` if nothing is mapped.
    pub fn table(&self, node: &NodeId) -> Option<&MappingTable> {
        self.tables.get(node).map(Arc::as_ref)
    }

    /// Total number of mapped fields across all nodes.
    pub fn len(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns a frozen view of the store. Later writes to `self` never show
    /// up in the snapshot.
    pub fn snapshot(&self) -> MappingStore {
        self.clone()
    }
}
