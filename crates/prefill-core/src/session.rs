//! Session: one loaded blueprint plus the mappings made against it.
//!
//! The graph and forms of a session are immutable and shared behind `Arc`;
//! the [`MappingStore`] is the only thing that changes. Loading a new
//! blueprint means building a new `Session`, which drops every mapping made
//! against the old one.
//!
//! Mutations take `&mut self`, so there is a single writer at a time. Callers
//! that share a session between threads put it behind a mutex.
//! [`Session::snapshot`] hands out a value that later writes never affect.

use std::sync::Arc;

use serde::Serialize;

use crate::blueprint::Blueprint;
use crate::error::PrefillError;
use crate::form::{Control, Form, FormSet};
use crate::graph::BlueprintGraph;
use crate::id::{FormId, NodeId};
use crate::mapping::{MappingStore, SourceRef};
use crate::node::Node;

/// An ancestor node able to supply a requested field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub node_id: NodeId,
    /// Display name of the ancestor node; becomes the mapping's source form
    /// name when selected.
    pub node_name: String,
    pub form_id: FormId,
}

/// One field of a node's form as presented for prefilling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub field_key: String,
    pub label: String,
    /// Current source, `None` when the field is not prefilled.
    pub mapping: Option<SourceRef>,
}

#[derive(Debug, Clone)]
pub struct Session {
    graph: Arc<BlueprintGraph>,
    forms: Arc<FormSet>,
    mappings: MappingStore,
}

impl Session {
    /// Builds the graph for `blueprint` and moves any `input_mapping`
    /// already present on its nodes into the mapping store. Nodes held by
    /// the graph carry no mappings afterwards; [`Session::node_view`] joins
    /// a node with its live table.
    ///
    /// Fails with [`PrefillError::MalformedGraph`] without building anything
    /// if the node/edge lists are inconsistent.
    pub fn load(blueprint: Blueprint) -> Result<Self, PrefillError> {
        let Blueprint {
            mut nodes,
            edges,
            forms,
        } = blueprint;
        let mappings = MappingStore::from_nodes(&mut nodes);

        let graph = BlueprintGraph::build(&nodes, &edges)?;
        if !graph.is_acyclic() {
            tracing::warn!("blueprint graph contains a cycle; ancestor lists may be ill-defined");
        }

        let forms = FormSet::new(forms);

        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            forms = forms.len(),
            mapped_fields = mappings.len(),
            "loaded blueprint"
        );

        Ok(Session {
            graph: Arc::new(graph),
            forms: Arc::new(forms),
            mappings,
        })
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &BlueprintGraph {
        &self.graph
    }

    pub fn forms(&self) -> &FormSet {
        &self.forms
    }

    pub fn mappings(&self) -> &MappingStore {
        &self.mappings
    }

    /// Nodes in blueprint order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.nodes()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.graph.node(id)
    }

    /// The node as it would appear in a blueprint document right now: its
    /// `input_mapping` is the current table from the mapping store.
    pub fn node_view(&self, id: &NodeId) -> Option<Node> {
        let mut node = self.graph.node(id)?.clone();
        if let Some(table) = self.mappings.table(id) {
            node.seed_mapping = table.clone();
        }
        Some(node)
    }

    /// The form the node instantiates, if both exist.
    pub fn form_for(&self, id: &NodeId) -> Option<&Form> {
        self.node(id).and_then(|n| self.forms.form_for(n))
    }

    pub fn ancestors_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.graph.ancestors_of(id)
    }

    // -----------------------------------------------------------------------
    // Prefill queries
    // -----------------------------------------------------------------------

    /// Ancestors of `id` whose form defines `field_key`, nearest first.
    ///
    /// Ancestors without a form, or whose form lacks the field, are skipped;
    /// the remaining ones keep their breadth-first order.
    pub fn candidates(&self, id: &NodeId, field_key: &str) -> Vec<Candidate> {
        self.ancestors_of(id)
            .into_iter()
            .filter_map(|ancestor_id| {
                let ancestor = self.graph.node(&ancestor_id)?;
                let form = self.forms.form_for(ancestor)?;
                form.has_field(field_key).then(|| Candidate {
                    node_name: ancestor.name.clone(),
                    form_id: form.id.clone(),
                    node_id: ancestor_id,
                })
            })
            .collect()
    }

    /// Every control of the node's form with its current mapping. Empty when
    /// the node or its form is unknown.
    pub fn field_rows(&self, id: &NodeId) -> Vec<FieldRow> {
        let Some(form) = self.form_for(id) else {
            return Vec::new();
        };
        form.controls()
            .into_iter()
            .map(|control| FieldRow {
                mapping: self.mappings.get(id, &control.field_key).cloned(),
                field_key: control.field_key,
                label: control.label,
            })
            .collect()
    }

    /// The node form's controls that have no mapping yet, in UI order.
    pub fn unmapped_fields(&self, id: &NodeId) -> Vec<Control> {
        let Some(form) = self.form_for(id) else {
            return Vec::new();
        };
        form.controls()
            .into_iter()
            .filter(|control| !self.mappings.is_mapped(id, &control.field_key))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mapping store
    // -----------------------------------------------------------------------

    pub fn mapping(&self, id: &NodeId, field_key: &str) -> Option<&SourceRef> {
        self.mappings.get(id, field_key)
    }

    /// Maps `field_key` of `id` to `source`.
    ///
    /// A mapping cannot outlive its node, so writes for a node that is not in
    /// the graph are dropped and `false` is returned.
    pub fn set_mapping(&mut self, id: &NodeId, field_key: &str, source: SourceRef) -> bool {
        if !self.graph.contains_node(id) {
            tracing::debug!(node = %id, field = field_key, "mapping for unknown node dropped");
            return false;
        }
        self.mappings.set(id, field_key, source);
        true
    }

    pub fn clear_mapping(&mut self, id: &NodeId, field_key: &str) {
        self.mappings.clear(id, field_key);
    }

    /// Maps `field_key` of `id` to the same field on `ancestor`, recording
    /// the ancestor's display name as the source form name.
    ///
    /// Returns `false` and writes nothing if `ancestor` is not a candidate
    /// for that field.
    pub fn map_from_candidate(&mut self, id: &NodeId, field_key: &str, ancestor: &NodeId) -> bool {
        let Some(candidate) = self
            .candidates(id, field_key)
            .into_iter()
            .find(|c| &c.node_id == ancestor)
        else {
            tracing::debug!(node = %id, field = field_key, ancestor = %ancestor, "not a candidate");
            return false;
        };

        self.mappings.set(
            id,
            field_key,
            SourceRef::new(&candidate.node_name, field_key),
        );
        true
    }

    /// A frozen copy of this session. Graph and forms are shared; mapping
    /// tables are copied only when this session writes to them again.
    pub fn snapshot(&self) -> Session {
        Session {
            graph: Arc::clone(&self.graph),
            forms: Arc::clone(&self.forms),
            mappings: self.mappings.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::form::{FieldMeta, FieldSchema, UiElement, UiSchema};

    fn form(id: &str, fields: &[&str]) -> Form {
        Form {
            id: id.into(),
            name: id.to_string(),
            description: String::new(),
            is_reusable: false,
            field_schema: FieldSchema {
                kind: "object".into(),
                properties: fields
                    .iter()
                    .map(|f| (f.to_string(), FieldMeta::default()))
                    .collect(),
                required: Vec::new(),
            },
            ui_schema: UiSchema {
                kind: "VerticalLayout".into(),
                elements: fields
                    .iter()
                    .map(|f| UiElement {
                        kind: "Control".into(),
                        scope: format!("#/properties/{f}"),
                        label: None,
                    })
                    .collect(),
            },
        }
    }

    /// A -> B, A -> C, B -> D, C -> D, each node on its own form.
    /// Only A and C define `email`; D defines `email` and `phone`.
    fn diamond() -> Session {
        Session::load(Blueprint {
            nodes: vec![
                Node::new("a", "f_a", "Form A"),
                Node::new("b", "f_b", "Form B"),
                Node::new("c", "f_c", "Form C"),
                Node::new("d", "f_d", "Form D"),
            ],
            edges: vec![
                Edge::new("a", "b"),
                Edge::new("a", "c"),
                Edge::new("b", "d"),
                Edge::new("c", "d"),
            ],
            forms: vec![
                form("f_a", &["email", "name"]),
                form("f_b", &["name"]),
                form("f_c", &["email"]),
                form("f_d", &["email", "phone"]),
            ],
        })
        .unwrap()
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.node_id.as_str()).collect()
    }

    #[test]
    fn candidates_filter_keeps_bfs_order() {
        let session = diamond();
        let d = NodeId::from("d");
        let ancestors: Vec<_> = session.ancestors_of(&d).into_iter().map(|id| id.0).collect();
        assert_eq!(ancestors, vec!["b", "c", "a"]);

        assert_eq!(ids(&session.candidates(&d, "email")), vec!["c", "a"]);
        assert_eq!(ids(&session.candidates(&d, "name")), vec!["b", "a"]);
        assert!(session.candidates(&d, "phone").is_empty());
    }

    #[test]
    fn candidate_carries_node_name_and_form() {
        let session = diamond();
        let candidates = session.candidates(&"d".into(), "email");
        assert_eq!(candidates[0].node_name, "Form C");
        assert_eq!(candidates[0].form_id, FormId::from("f_c"));
    }

    #[test]
    fn ancestors_without_forms_are_skipped() {
        let session = Session::load(Blueprint {
            nodes: vec![
                Node::new("a", "f_missing", "Orphan"),
                Node::new("b", "f_b", "Form B"),
            ],
            edges: vec![Edge::new("a", "b")],
            forms: vec![form("f_b", &["email"])],
        })
        .unwrap();
        assert!(session.candidates(&"b".into(), "email").is_empty());
    }

    #[test]
    fn field_rows_show_mapping_state() {
        let mut session = diamond();
        let d = NodeId::from("d");
        session.set_mapping(&d, "email", SourceRef::new("Form C", "email"));

        let rows = session.field_rows(&d);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field_key, "email");
        assert_eq!(rows[0].mapping, Some(SourceRef::new("Form C", "email")));
        assert_eq!(rows[1].field_key, "phone");
        assert_eq!(rows[1].mapping, None);
    }

    #[test]
    fn unmapped_fields_exclude_mapped_keys() {
        let mut session = diamond();
        let d = NodeId::from("d");
        let keys = |s: &Session| -> Vec<String> {
            s.unmapped_fields(&d).into_iter().map(|c| c.field_key).collect()
        };

        assert_eq!(keys(&session), vec!["email", "phone"]);
        session.set_mapping(&d, "email", SourceRef::new("Form A", "email"));
        assert_eq!(keys(&session), vec!["phone"]);
        session.clear_mapping(&d, "email");
        assert_eq!(keys(&session), vec!["email", "phone"]);
    }

    #[test]
    fn unknown_node_has_no_fields() {
        let session = diamond();
        assert!(session.field_rows(&"zzz".into()).is_empty());
        assert!(session.unmapped_fields(&"zzz".into()).is_empty());
        assert!(session.form_for(&"zzz".into()).is_none());
    }

    #[test]
    fn map_from_candidate_records_ancestor_name() {
        let mut session = diamond();
        let d = NodeId::from("d");
        assert!(session.map_from_candidate(&d, "email", &"a".into()));
        assert_eq!(
            session.mapping(&d, "email"),
            Some(&SourceRef::new("Form A", "email"))
        );
    }

    #[test]
    fn map_from_non_candidate_is_refused() {
        let mut session = diamond();
        let d = NodeId::from("d");
        // b is an ancestor but its form has no `email`.
        assert!(!session.map_from_candidate(&d, "email", &"b".into()));
        // d is not its own ancestor.
        assert!(!session.map_from_candidate(&d, "email", &"d".into()));
        assert_eq!(session.mapping(&d, "email"), None);
    }

    #[test]
    fn snapshot_survives_later_writes() {
        let mut session = diamond();
        let d = NodeId::from("d");
        session.set_mapping(&d, "email", SourceRef::new("Form A", "email"));

        let before = session.snapshot();
        session.set_mapping(&d, "email", SourceRef::new("Form C", "email"));
        session.clear_mapping(&d, "email");

        assert_eq!(
            before.mapping(&d, "email"),
            Some(&SourceRef::new("Form A", "email"))
        );
        assert_eq!(session.mapping(&d, "email"), None);
    }

    #[test]
    fn load_seeds_existing_mappings() {
        let b = Node::new("b", "f_b", "Form B").with_input("email", SourceRef::new("Form A", "email"));
        let session = Session::load(Blueprint {
            nodes: vec![Node::new("a", "f_a", "Form A"), b],
            edges: vec![Edge::new("a", "b")],
            forms: vec![form("f_a", &["email"]), form("f_b", &["email"])],
        })
        .unwrap();

        assert_eq!(
            session.mapping(&"b".into(), "email"),
            Some(&SourceRef::new("Form A", "email"))
        );
    }

    #[test]
    fn mapping_for_unknown_node_is_dropped() {
        let mut session = diamond();
        let ghost = NodeId::from("ghost");
        assert!(!session.set_mapping(&ghost, "email", SourceRef::new("Form A", "email")));
        assert_eq!(session.mapping(&ghost, "email"), None);
        assert!(session.mappings().is_empty());
    }

    #[test]
    fn node_view_tracks_the_store() {
        let b = Node::new("b", "f_b", "Form B").with_input("email", SourceRef::new("Form A", "email"));
        let mut session = Session::load(Blueprint {
            nodes: vec![Node::new("a", "f_a", "Form A"), b],
            edges: vec![Edge::new("a", "b")],
            forms: vec![form("f_a", &["email", "name"]), form("f_b", &["email", "name"])],
        })
        .unwrap();
        let b = NodeId::from("b");

        // The graph's node no longer carries the seed.
        assert!(session.node(&b).unwrap().seed_mapping.is_empty());

        let view = |s: &Session| s.node_view(&b).unwrap().seed_mapping;
        assert_eq!(Some(&view(&session)), session.mappings().table(&b));

        assert!(session.set_mapping(&b, "name", SourceRef::new("Form A", "name")));
        assert_eq!(Some(&view(&session)), session.mappings().table(&b));

        session.clear_mapping(&b, "email");
        session.clear_mapping(&b, "name");
        assert!(view(&session).is_empty());
        assert!(session.mappings().table(&b).is_none());

        let wire = serde_json::to_value(session.node_view(&b).unwrap()).unwrap();
        assert!(wire["data"].get("input_mapping").is_none());
    }

    #[test]
    fn malformed_blueprint_does_not_load() {
        let result = Session::load(Blueprint {
            nodes: vec![Node::new("a", "f_a", "Form A")],
            edges: vec![Edge::new("a", "missing")],
            forms: Vec::new(),
        });
        assert!(matches!(result, Err(PrefillError::MalformedGraph { .. })));
    }

    #[test]
    fn cyclic_blueprint_still_loads() {
        let session = Session::load(Blueprint {
            nodes: vec![Node::new("a", "f", "A"), Node::new("b", "f", "B")],
            edges: vec![Edge::new("a", "b"), Edge::new("b", "a")],
            forms: vec![form("f", &["x"])],
        })
        .unwrap();
        assert!(!session.graph().is_acyclic());
        assert_eq!(ids(&session.candidates(&"a".into(), "x")), vec!["b"]);
    }
}
