//! Form definitions and the lookups the prefill flow needs from them.
//!
//! A [`Form`] pairs a field schema (what fields exist) with a UI schema (the
//! order and labels in which fields are presented). Forms are immutable once
//! loaded and are shared: many nodes may instantiate the same form.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::FormId;
use crate::node::Node;

/// Prefix of a UI control's scope pointing into the field schema.
pub const SCOPE_PREFIX: &str = "#/properties/";

/// A reusable form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_reusable: bool,
    pub field_schema: FieldSchema,
    #[serde(default)]
    pub ui_schema: UiSchema,
}

/// Field key -> metadata, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub properties: IndexMap<String, FieldMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Descriptive metadata for one field. Not validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avantos_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSchema {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub elements: Vec<UiElement>,
}

/// One element of the UI layout. Only `Control` elements describe fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl UiElement {
    pub fn is_control(&self) -> bool {
        self.kind == "Control"
    }

    /// The field schema key this element points at.
    pub fn field_key(&self) -> &str {
        self.scope.strip_prefix(SCOPE_PREFIX).unwrap_or(&self.scope)
    }
}

/// A field control as presented to the user: which field, under what label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub field_key: String,
    pub label: String,
}

impl Form {
    /// Returns `true` if the field schema defines `field_key`.
    pub fn has_field(&self, field_key: &str) -> bool {
        self.field_schema.properties.contains_key(field_key)
    }

    /// Returns the form's field controls in UI order.
    ///
    /// The label is the control's own label, falling back to the field's
    /// schema title and finally to the bare key.
    pub fn controls(&self) -> Vec<Control> {
        self.ui_schema
            .elements
            .iter()
            .filter(|el| el.is_control())
            .map(|el| {
                let key = el.field_key();
                let label = el
                    .label
                    .clone()
                    .or_else(|| {
                        self.field_schema
                            .properties
                            .get(key)
                            .and_then(|meta| meta.title.clone())
                    })
                    .unwrap_or_else(|| key.to_string());
                Control {
                    field_key: key.to_string(),
                    label,
                }
            })
            .collect()
    }
}

/// Resolves the form a node instantiates. The first form with a matching id
/// wins; `None` is an ordinary outcome.
pub fn form_for<'a>(node: &Node, forms: &'a [Form]) -> Option<&'a Form> {
    forms.iter().find(|f| f.id == node.component_id)
}

/// Returns `true` if `form` defines `field_key`.
pub fn has_field(form: &Form, field_key: &str) -> bool {
    form.has_field(field_key)
}

/// The loaded forms, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct FormSet {
    forms: IndexMap<FormId, Form>,
}

impl FormSet {
    pub fn new(forms: Vec<Form>) -> Self {
        let mut index = IndexMap::with_capacity(forms.len());
        for form in forms {
            // Keep the first definition, matching `form_for`.
            index.entry(form.id.clone()).or_insert(form);
        }
        FormSet { forms: index }
    }

    pub fn form_for(&self, node: &Node) -> Option<&Form> {
        self.forms.get(&node.component_id)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
