//! Document Nodes
//!
//! This module defines the node types that live in a [`Document`](super::Document).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

/// Unique identifier for a node in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of node in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Exactly one per document, never detached.
    Document,

    /// An element with a tag name, attributes and children.
    Element,

    /// A text node. Leaves of the tree.
    Text,
}

/// Tags whose bound content goes to the value slot rather than the text.
const VALUE_TAGS: &[&str] = &["input", "textarea", "select", "option", "button", "output"];

/// Element-specific data.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercased tag name.
    tag: String,

    /// Attributes in insertion order. Names are lowercased.
    attributes: IndexMap<String, String>,

    /// The value slot of form controls. Not reflected as an attribute.
    value: String,
}

impl ElementData {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether content bindings write into the value slot.
    pub fn is_value_control(&self) -> bool {
        VALUE_TAGS.contains(&self.tag.as_str())
    }

    pub(super) fn set_attribute(&mut self, name: String, value: String) -> Option<String> {
        self.attributes.insert(name, value)
    }

    pub(super) fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    pub(super) fn set_value(&mut self, value: String) {
        self.value = value;
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

/// A node in the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// Tree position. `None` for the document root and detached nodes.
    parent: Option<NodeId>,

    /// Children in document order.
    children: Vec<NodeId>,

    data: NodeData,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    /// Create the document root node.
    pub fn document() -> Self {
        Self::new(NodeData::Document)
    }

    /// Create a detached element. The tag name is lowercased.
    pub fn element(tag: &str) -> Self {
        Self::new(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            value: String::new(),
        }))
    }

    /// Create a detached text node.
    pub fn text(text: &str) -> Self {
        Self::new(NodeData::Text(text.to_string()))
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's kind.
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
        }
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(super) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The text of a text node.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(super) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(super) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(super) fn remove_child(&mut self, child: NodeId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != child);
        self.children.len() != before
    }

    pub(super) fn set_text(&mut self, text: &str) {
        if let NodeData::Text(data) = &mut self.data {
            *data = text.to_string();
        }
    }

    pub(super) fn take_children(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn element_tag_is_lowercased() {
        let node = Node::element("TEXTAREA");
        assert_eq!(node.kind(), NodeKind::Element);
        assert_eq!(node.as_element().unwrap().tag(), "textarea");
        assert!(node.as_element().unwrap().is_value_control());
    }

    #[test]
    fn plain_elements_are_not_value_controls() {
        for tag in ["span", "div", "td", "li"] {
            assert!(!Node::element(tag).as_element().unwrap().is_value_control());
        }
    }

    #[test]
    fn child_management() {
        let mut node = Node::element("ul");
        let a = NodeId::new();
        let b = NodeId::new();

        node.push_child(a);
        node.push_child(b);
        assert_eq!(node.children(), [a, b]);

        assert!(node.remove_child(a));
        assert!(!node.remove_child(a));
        assert_eq!(node.children(), [b]);
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let mut node = Node::element("img");
        let element = node.as_element_mut().unwrap();
        element.set_attribute("src".into(), "a.png".into());
        element.set_attribute("alt".into(), "avatar".into());
        element.set_attribute("src".into(), "b.png".into());

        let names: Vec<&str> = element.attributes().map(|(k, _)| k).collect();
        assert_eq!(names, ["src", "alt"]);
        assert_eq!(element.attribute("src"), Some("b.png"));
        assert_eq!(element.remove_attribute("src").as_deref(), Some("b.png"));
        assert_eq!(element.attribute("src"), None);
    }
}
