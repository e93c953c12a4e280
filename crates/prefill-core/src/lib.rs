pub mod ancestors;
pub mod blueprint;
pub mod edge;
pub mod error;
pub mod form;
pub mod graph;
pub mod id;
pub mod mapping;
pub mod node;
pub mod session;

// Re-export commonly used types
pub use ancestors::ancestors_of;
pub use blueprint::Blueprint;
pub use edge::Edge;
pub use error::PrefillError;
pub use form::{form_for, has_field, Control, Form, FormSet};
pub use graph::{reverse, AdjacencyIndex, BlueprintGraph};
pub use id::{FormId, NodeId};
pub use mapping::{MappingStore, MappingTable, SourceRef};
pub use node::Node;
pub use session::{Candidate, FieldRow, Session};
