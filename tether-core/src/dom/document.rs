//! Document
//!
//! The document owns every node and coordinates tree edits. It is indexed by
//! node ID for O(1) lookups, and each node keeps both its parent link and its
//! ordered child list so traversal works in both directions.
//!
//! A [`Document`] is a cheap handle: clones share the same tree, the same
//! way clones of a host page's `document` reference all see one DOM.
//!
//! # Observers
//!
//! Edits made through this API produce [`MutationRecord`]s. Each observer
//! registration has its own queue; a record is queued for a registration
//! when the changed node is the registration's target, or lies below it and
//! the registration asked for the subtree. Writes to an element's value slot
//! and to a text node's data are not recorded.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::{smallvec, SmallVec};

use super::mutation::{MutationRecord, ObserveOptions, ObserverId, Registration};
use super::node::{ElementData, Node, NodeId, NodeKind};
use crate::error::{BindError, Result};

/// The node arena plus observer registrations.
struct Tree {
    /// All nodes, attached or not, indexed by ID.
    nodes: HashMap<NodeId, Node>,

    /// The document root.
    root: NodeId,

    /// The `<body>` element created with the document.
    body: NodeId,

    observers: HashMap<ObserverId, Registration>,
}

impl Tree {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        let mut root = Node::document();
        let mut body = Node::element("body");
        let (root_id, body_id) = (root.id(), body.id());

        root.push_child(body_id);
        body.set_parent(Some(root_id));
        nodes.insert(root_id, root);
        nodes.insert(body_id, body);

        Self {
            nodes,
            root: root_id,
            body: body_id,
            observers: HashMap::new(),
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(BindError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(BindError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData> {
        self.node(id)?.as_element().ok_or(BindError::NotAnElement(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(BindError::NotAnElement(id))
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(Node::parent);
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    /// Nodes below `scope` in document order, excluding `scope` itself.
    fn descendants(&self, scope: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.node(scope)?.children().iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            result.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children().iter().rev().copied());
            }
        }

        Ok(result)
    }

    fn text_content(&self, id: NodeId) -> Result<String> {
        if let Some(text) = self.node(id)?.as_text() {
            return Ok(text.to_string());
        }
        let mut content = String::new();
        for descendant in self.descendants(id)? {
            if let Some(text) = self.nodes.get(&descendant).and_then(Node::as_text) {
                content.push_str(text);
            }
        }
        Ok(content)
    }

    /// Queue `record` for every registration that covers its target.
    fn record(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }

        let target = record.target();
        let interested: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|(_, reg)| {
                reg.wants(&record, |id| self.nodes.get(&id).is_some_and(Node::is_element))
                    && (reg.target == target
                        || (reg.options.subtree && self.is_inclusive_ancestor(reg.target, target)))
            })
            .map(|(id, _)| *id)
            .collect();

        for id in interested {
            if let Some(reg) = self.observers.get_mut(&id) {
                reg.queue.push(record.clone());
            }
        }
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.node(child)?.parent() != Some(parent) {
            return Err(BindError::NotAChild { parent, child });
        }
        self.node_mut(parent)?.remove_child(child);
        self.node_mut(child)?.set_parent(None);
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_kind = self.node(parent)?.kind();
        let child_kind = self.node(child)?.kind();

        if parent_kind == NodeKind::Text
            || child_kind == NodeKind::Document
            || self.is_inclusive_ancestor(child, parent)
        {
            return Err(BindError::HierarchyRequest { parent, child });
        }

        if let Some(old_parent) = self.node(child)?.parent() {
            self.detach(old_parent, child)?;
            self.record(MutationRecord::ChildList {
                target: old_parent,
                added: SmallVec::new(),
                removed: smallvec![child],
            });
        }

        self.node_mut(parent)?.push_child(child);
        self.node_mut(child)?.set_parent(Some(parent));
        self.record(MutationRecord::ChildList {
            target: parent,
            added: smallvec![child],
            removed: SmallVec::new(),
        });

        Ok(())
    }

    /// Remove `id` and everything below it from the arena. Returns the
    /// number of nodes freed.
    fn discard(&mut self, id: NodeId) -> usize {
        let mut freed = 0;
        if let Ok(below) = self.descendants(id) {
            for node in below {
                freed += usize::from(self.nodes.remove(&node).is_some());
            }
        }
        freed + usize::from(self.nodes.remove(&id).is_some())
    }
}

/// A shared handle to an in-memory document.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<Tree>>,
}

impl Document {
    /// Create a document containing an empty `<body>`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Tree::new())),
        }
    }

    /// The document root node.
    pub fn root(&self) -> NodeId {
        self.inner.read().root
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.inner.read().body
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.write().insert(Node::element(tag))
    }

    /// Create a detached element with the given attributes already set.
    ///
    /// No mutation records are produced since the element is not yet in
    /// any observed tree.
    pub fn create_element_with(&self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut node = Node::element(tag);
        if let Some(element) = node.as_element_mut() {
            for (name, value) in attributes {
                element.set_attribute(name.to_ascii_lowercase(), (*value).to_string());
            }
        }
        self.inner.write().insert(node)
    }

    /// Create a detached text node.
    pub fn create_text_node(&self, text: &str) -> NodeId {
        self.inner.write().insert(Node::text(text))
    }

    /// Whether the node exists in this document's arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.read().nodes.contains_key(&id)
    }

    /// Whether the node is attached under the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.inner.read().is_connected(id)
    }

    /// Get the total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Run `f` with read access to a node.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> Result<R> {
        let tree = self.inner.read();
        Ok(f(tree.node(id)?))
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        self.with_node(id, Node::kind)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.with_node(id, Node::parent)
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.with_node(id, |node| node.children().to_vec())
    }

    pub fn tag_name(&self, id: NodeId) -> Result<String> {
        Ok(self.inner.read().element(id)?.tag().to_string())
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// A child that is already attached elsewhere is detached first, which
    /// is recorded as a separate removal.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.inner.write().append_child(parent, child)
    }

    /// Detach `child` from `parent`. The child stays in the arena and can be
    /// inserted again.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut tree = self.inner.write();
        tree.detach(parent, child)?;
        tree.record(MutationRecord::ChildList {
            target: parent,
            added: SmallVec::new(),
            removed: smallvec![child],
        });
        Ok(())
    }

    /// Detach the node from its parent, if it has one. The node stays in
    /// the arena; see [`drop_node`](Self::drop_node) to free it.
    pub fn remove(&self, id: NodeId) -> Result<()> {
        match self.parent(id)? {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(()),
        }
    }

    /// Detach `id` if it is attached, then free it and everything below it.
    /// Returns the number of nodes freed. The root and body cannot be
    /// dropped.
    pub fn drop_node(&self, id: NodeId) -> Result<usize> {
        let mut tree = self.inner.write();
        if id == tree.root || id == tree.body {
            return Err(BindError::InvalidState(format!("node {id} cannot be dropped")));
        }

        if let Some(parent) = tree.node(id)?.parent() {
            tree.detach(parent, id)?;
            tree.record(MutationRecord::ChildList {
                target: parent,
                added: SmallVec::new(),
                removed: smallvec![id],
            });
        }
        Ok(tree.discard(id))
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Result<Option<String>> {
        let name = name.to_ascii_lowercase();
        Ok(self
            .inner
            .read()
            .element(id)?
            .attribute(&name)
            .map(str::to_string))
    }

    /// All attributes of an element, in insertion order.
    pub fn attributes(&self, id: NodeId) -> Result<Vec<(String, String)>> {
        Ok(self
            .inner
            .read()
            .element(id)?
            .attributes()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }

    /// Set an attribute. The name is lowercased.
    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let mut tree = self.inner.write();
        let old_value = tree
            .element_mut(id)?
            .set_attribute(name.clone(), value.to_string());
        tree.record(MutationRecord::Attributes {
            target: id,
            name,
            old_value,
        });
        Ok(())
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&self, id: NodeId, name: &str) -> Result<Option<String>> {
        let name = name.to_ascii_lowercase();
        let mut tree = self.inner.write();
        let old_value = tree.element_mut(id)?.remove_attribute(&name);
        if old_value.is_some() {
            tree.record(MutationRecord::Attributes {
                target: id,
                name,
                old_value: old_value.clone(),
            });
        }
        Ok(old_value)
    }

    /// The concatenated text of all text nodes under `id`.
    pub fn text_content(&self, id: NodeId) -> Result<String> {
        self.inner.read().text_content(id)
    }

    /// Replace the children of `id` with a single text node.
    ///
    /// The text is never interpreted as markup. Replaced children are
    /// discarded from the arena. On a text node this rewrites its data.
    pub fn set_text_content(&self, id: NodeId, text: &str) -> Result<()> {
        let mut tree = self.inner.write();

        if tree.node(id)?.kind() == NodeKind::Text {
            tree.node_mut(id)?.set_text(text);
            return Ok(());
        }

        let removed: SmallVec<[NodeId; 1]> = tree.node_mut(id)?.take_children().into();
        for child in &removed {
            tree.discard(*child);
        }

        let mut added = SmallVec::new();
        if !text.is_empty() {
            let mut node = Node::text(text);
            node.set_parent(Some(id));
            let text_id = tree.insert(node);
            tree.node_mut(id)?.push_child(text_id);
            added.push(text_id);
        }

        if !added.is_empty() || !removed.is_empty() {
            tree.record(MutationRecord::ChildList {
                target: id,
                added,
                removed,
            });
        }
        Ok(())
    }

    /// The value slot of an element.
    pub fn value(&self, id: NodeId) -> Result<String> {
        Ok(self.inner.read().element(id)?.value().to_string())
    }

    /// Write the value slot of an element. Not recorded.
    pub fn set_value(&self, id: NodeId, value: &str) -> Result<()> {
        self.inner.write().element_mut(id)?.set_value(value.to_string());
        Ok(())
    }

    /// Nodes below `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Result<Vec<NodeId>> {
        self.inner.read().descendants(scope)
    }

    /// Elements in `scope`'s subtree matching `predicate`, in document order.
    ///
    /// `scope` itself is a candidate only when `include_scope` is set.
    pub fn select<F>(&self, scope: NodeId, include_scope: bool, predicate: F) -> Result<Vec<NodeId>>
    where
        F: Fn(&ElementData) -> bool,
    {
        let tree = self.inner.read();
        let mut candidates = tree.descendants(scope)?;
        if include_scope {
            candidates.insert(0, scope);
        }

        Ok(candidates
            .into_iter()
            .filter(|id| {
                tree.nodes
                    .get(id)
                    .and_then(Node::as_element)
                    .is_some_and(&predicate)
            })
            .collect())
    }

    /// Register an observer for changes at or below `target`.
    pub fn observe(&self, target: NodeId, options: ObserveOptions) -> Result<ObserverId> {
        let mut tree = self.inner.write();
        tree.node(target)?;
        let id = ObserverId::new();
        tree.observers.insert(id, Registration::new(target, options));
        Ok(id)
    }

    /// Drain the records queued for an observer.
    pub fn take_records(&self, observer: ObserverId) -> Vec<MutationRecord> {
        self.inner
            .write()
            .observers
            .get_mut(&observer)
            .map(|reg| std::mem::take(&mut reg.queue))
            .unwrap_or_default()
    }

    /// Number of records waiting for an observer.
    pub fn pending_records(&self, observer: ObserverId) -> usize {
        self.inner
            .read()
            .observers
            .get(&observer)
            .map_or(0, |reg| reg.queue.len())
    }

    /// Remove an observer registration and its queued records.
    pub fn disconnect(&self, observer: ObserverId) -> bool {
        self.inner.write().observers.remove(&observer).is_some()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.inner.read();
        f.debug_struct("Document")
            .field("root", &tree.root)
            .field("node_count", &tree.nodes.len())
            .field("observer_count", &tree.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_connected_body() {
        let doc = Document::new();
        assert_eq!(doc.kind(doc.root()).unwrap(), NodeKind::Document);
        assert_eq!(doc.tag_name(doc.body()).unwrap(), "body");
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn append_and_remove_children() {
        let doc = Document::new();
        let list = doc.create_element("ul");
        let item = doc.create_element("li");

        assert!(!doc.is_connected(list));
        doc.append_child(doc.body(), list).unwrap();
        doc.append_child(list, item).unwrap();
        assert!(doc.is_connected(item));
        assert_eq!(doc.descendants(doc.body()).unwrap(), vec![list, item]);

        doc.remove(list).unwrap();
        assert!(!doc.is_connected(item));
        assert!(doc.contains(item));
        assert_eq!(doc.parent(list).unwrap(), None);
    }

    #[test]
    fn append_rejects_cycles() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        assert!(matches!(
            doc.append_child(inner, outer),
            Err(BindError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            doc.append_child(outer, outer),
            Err(BindError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            doc.append_child(outer, doc.root()),
            Err(BindError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn remove_child_requires_parent() {
        let doc = Document::new();
        let stray = doc.create_element("p");
        assert!(matches!(
            doc.remove_child(doc.body(), stray),
            Err(BindError::NotAChild { .. })
        ));
    }

    #[test]
    fn drop_node_frees_subtree() {
        let doc = Document::new();
        let baseline = doc.node_count();

        for _ in 0..1_000 {
            let row = doc.create_element("tr");
            let cell = doc.create_element_with("td", &[("data-bind", "a")]);
            doc.append_child(row, cell).unwrap();
            doc.set_text_content(cell, "x").unwrap();
            doc.append_child(doc.body(), row).unwrap();
            assert_eq!(doc.drop_node(row).unwrap(), 3);
        }

        assert_eq!(doc.node_count(), baseline);
        assert!(doc.children(doc.body()).unwrap().is_empty());
    }

    #[test]
    fn drop_node_records_removal_and_guards_body() {
        let doc = Document::new();
        let span = doc.create_element("span");
        doc.append_child(doc.body(), span).unwrap();
        let observer = doc.observe(doc.body(), ObserveOptions::default()).unwrap();

        doc.drop_node(span).unwrap();
        assert!(!doc.contains(span));
        assert!(matches!(
            doc.take_records(observer).as_slice(),
            [MutationRecord::ChildList { removed, .. }] if removed.as_slice() == [span]
        ));

        assert!(matches!(doc.drop_node(doc.body()), Err(BindError::InvalidState(_))));
        assert!(matches!(doc.drop_node(span), Err(BindError::UnknownNode(_))));
    }

    #[test]
    fn text_content_is_not_markup() {
        let doc = Document::new();
        let span = doc.create_element("span");
        doc.set_text_content(span, "<b>bold</b>").unwrap();

        let children = doc.children(span).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.kind(children[0]).unwrap(), NodeKind::Text);
        assert_eq!(doc.text_content(span).unwrap(), "<b>bold</b>");
    }

    #[test]
    fn set_text_content_discards_replaced_children() {
        let doc = Document::new();
        let span = doc.create_element("span");
        doc.set_text_content(span, "one").unwrap();
        let count = doc.node_count();

        doc.set_text_content(span, "two").unwrap();
        assert_eq!(doc.node_count(), count);

        doc.set_text_content(span, "").unwrap();
        assert!(doc.children(span).unwrap().is_empty());
        assert_eq!(doc.text_content(span).unwrap(), "");
    }

    #[test]
    fn attributes_and_value_slot() {
        let doc = Document::new();
        let input = doc.create_element_with("input", &[("Data-Bind", "user.name")]);

        assert_eq!(doc.attribute(input, "data-bind").unwrap().as_deref(), Some("user.name"));
        doc.set_value(input, "Ada").unwrap();
        assert_eq!(doc.value(input).unwrap(), "Ada");
        assert_eq!(doc.remove_attribute(input, "data-bind").unwrap().as_deref(), Some("user.name"));
        assert!(doc.attributes(input).unwrap().is_empty());

        let text = doc.create_text_node("x");
        assert!(matches!(doc.set_value(text, "y"), Err(BindError::NotAnElement(_))));
    }

    #[test]
    fn select_filters_elements_in_document_order() {
        let doc = Document::new();
        let section = doc.create_element_with("section", &[("data-bind", "a")]);
        let first = doc.create_element_with("span", &[("data-bind", "a")]);
        let second = doc.create_element_with("span", &[("data-bind", "b")]);
        doc.append_child(doc.body(), section).unwrap();
        doc.append_child(section, first).unwrap();
        doc.append_child(section, second).unwrap();

        let bound_to_a = |el: &ElementData| el.attribute("data-bind") == Some("a");
        assert_eq!(doc.select(section, false, bound_to_a).unwrap(), vec![first]);
        assert_eq!(doc.select(section, true, bound_to_a).unwrap(), vec![section, first]);
    }

    #[test]
    fn observers_receive_records_for_their_subtree() {
        let doc = Document::new();
        let observed = doc.create_element("main");
        let elsewhere = doc.create_element("aside");
        doc.append_child(doc.body(), observed).unwrap();
        doc.append_child(doc.body(), elsewhere).unwrap();

        let observer = doc.observe(observed, ObserveOptions::default()).unwrap();

        let child = doc.create_element("p");
        doc.append_child(observed, child).unwrap();
        doc.set_attribute(child, "data-bind", "x").unwrap();
        doc.set_attribute(elsewhere, "data-bind", "y").unwrap();
        doc.set_value(child, "ignored").unwrap();

        let records = doc.take_records(observer);
        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], MutationRecord::ChildList { added, .. } if added[..] == [child]));
        assert!(matches!(
            &records[1],
            MutationRecord::Attributes { target, name, old_value: None } if *target == child && name == "data-bind"
        ));
        assert_eq!(doc.pending_records(observer), 0);

        assert!(doc.disconnect(observer));
        doc.set_attribute(child, "data-bind", "z").unwrap();
        assert!(doc.take_records(observer).is_empty());
    }

    #[test]
    fn moving_a_node_records_removal_then_insertion() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let item = doc.create_element("span");
        doc.append_child(doc.body(), a).unwrap();
        doc.append_child(doc.body(), b).unwrap();
        doc.append_child(a, item).unwrap();

        let observer = doc.observe(doc.body(), ObserveOptions::default()).unwrap();
        doc.append_child(b, item).unwrap();

        let records = doc.take_records(observer);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target(), a);
        assert_eq!(records[1].target(), b);
    }
}
