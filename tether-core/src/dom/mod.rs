//! Document Model
//!
//! An in-memory stand-in for the host page's DOM. The binding engine only
//! needs a small slice of it:
//!
//! - elements with lowercased tag names and ordered attributes
//! - a value slot for form controls, separate from the text content
//! - text nodes, so bound content is always inserted as text and never
//!   parsed as markup
//! - tree edits (append, remove) with connectedness checks
//! - mutation records queued per observer registration
//!
//! There is no parser and no selector engine; queries are predicates over
//! element data evaluated in document order.

mod document;
mod mutation;
mod node;

pub use document::Document;
pub use mutation::{AttributeFilter, MutationRecord, ObserveOptions, ObserverId};
pub use node::{ElementData, Node, NodeData, NodeId, NodeKind};
