//! The blueprint document: nodes, edges and forms as delivered by the
//! blueprint graph API.
//!
//! Fetching the document is somebody else's job. This module only decodes an
//! already-retrieved JSON body. Fields the graph does not use are ignored.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::PrefillError;
use crate::form::Form;
use crate::node::Node;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub forms: Vec<Form>,
}

impl Blueprint {
    pub fn from_json(json: &str) -> Result<Self, PrefillError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PrefillError> {
        Ok(serde_json::from_reader(reader)?)
    }
}
