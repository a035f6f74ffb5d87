//! DOM Observer
//!
//! Keeps markup that appears or changes after initialization in sync with the
//! store. The observer registers with the document for child-list and
//! attribute changes across a whole subtree, then reacts to two kinds of
//! record:
//!
//! - inserted elements: every declaration on the element and on its
//!   descendants is resolved, so a template injected in one piece binds all
//!   at once;
//! - changed binding attributes: the declaration is resolved again using the
//!   attribute's current value, which re-points the element at a new path.
//!
//! Everything else is ignored, including the text nodes and plain attributes
//! the resolver itself writes. The registration filters those out before they
//! are queued, so writes made between turns do not pile up records.
//!
//! # Turns
//!
//! Records queue up in the document. [`DomObserver::process`] drains and
//! handles them synchronously; records produced while handling are left for
//! the next call.

use std::fmt;

use tracing::{debug, warn};

use super::declaration::BindingDeclaration;
use crate::dom::{AttributeFilter, MutationRecord, NodeId, NodeKind, ObserveOptions, ObserverId};
use crate::error::Result;
use crate::reactive::Store;

/// Watches a document subtree and re-resolves bindings as it changes.
///
/// Dropping the observer disconnects it.
pub struct DomObserver {
    id: ObserverId,
    store: Store,
}

impl DomObserver {
    /// Start observing `target` and everything below it.
    pub fn observe(store: &Store, target: NodeId) -> Result<Self> {
        let config = store.config();
        let options = ObserveOptions {
            element_insertions_only: true,
            attribute_filter: Some(AttributeFilter {
                names: vec![config.content_attribute.clone()],
                prefixes: vec![config.attribute_prefix.clone()],
            }),
            ..ObserveOptions::default()
        };
        let id = store.document().observe(target, options)?;
        debug!(target = %target, "observer connected");
        Ok(Self {
            id,
            store: store.clone(),
        })
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Number of records waiting for the next turn.
    pub fn pending(&self) -> usize {
        self.store.document().pending_records(self.id)
    }

    /// Drain queued records and handle them. Returns the number of element
    /// writes performed.
    pub fn process(&self) -> usize {
        let records = self.store.document().take_records(self.id);
        if records.is_empty() {
            return 0;
        }
        let written = self.handle(&records);
        debug!(records = records.len(), written, "observer turn");
        written
    }

    /// Handle a batch of records. A failing record never stops the rest.
    pub fn handle(&self, records: &[MutationRecord]) -> usize {
        records.iter().map(|record| self.handle_record(record)).sum()
    }

    /// Stop observing. Queued records are discarded.
    pub fn disconnect(self) {}

    fn handle_record(&self, record: &MutationRecord) -> usize {
        match record {
            MutationRecord::ChildList { added, .. } => added
                .iter()
                .filter(|node| self.is_attached_element(**node))
                .map(|node| self.store.resolve_tree(*node))
                .sum(),
            MutationRecord::Attributes { target, name, .. } => {
                if !self.store.config().is_binding_attribute(name) || !self.is_attached_element(*target) {
                    return 0;
                }
                self.resolve_attribute(*target, name)
            }
        }
    }

    fn resolve_attribute(&self, node: NodeId, attribute: &str) -> usize {
        let config = self.store.config();
        let declaration = self.store.document().with_node(node, |n| {
            n.as_element()
                .and_then(|el| BindingDeclaration::from_attribute(config, el, attribute))
        });

        match declaration {
            Ok(Some(declaration)) => match self.store.resolve_declaration(node, &declaration) {
                Ok(()) => 1,
                Err(err) => {
                    warn!(node = %node, attribute, error = %err, "re-pointed binding skipped");
                    0
                }
            },
            // Attribute was removed again before this turn.
            Ok(None) => 0,
            Err(err) => {
                warn!(node = %node, attribute, error = %err, "mutation target vanished");
                0
            }
        }
    }

    fn is_attached_element(&self, node: NodeId) -> bool {
        let document = self.store.document();
        document.kind(node).is_ok_and(|kind| kind == NodeKind::Element) && document.is_connected(node)
    }
}

impl Drop for DomObserver {
    fn drop(&mut self) {
        self.store.document().disconnect(self.id);
    }
}

impl fmt::Debug for DomObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomObserver")
            .field("id", &self.id)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindConfig;
    use crate::dom::Document;
    use crate::reactive::Value;
    use serde_json::json;

    fn fixture() -> (Store, Document, DomObserver) {
        let doc = Document::new();
        let state = Value::from(json!({
            "meals": { "pizza": "pepperoni", "vegetarian": "salad" },
            "user": { "avatarUrl": "a.png" }
        }));
        let store = Store::new(doc.clone(), state, BindConfig::default()).unwrap();
        let observer = DomObserver::observe(&store, doc.body()).unwrap();
        (store, doc, observer)
    }

    #[test]
    fn inserted_subtree_is_bound() {
        let (_store, doc, observer) = fixture();
        let card = doc.create_element("article");
        let title = doc.create_element_with("h2", &[("data-bind", "meals.pizza")]);
        let img = doc.create_element_with("img", &[("data-bind-attr-src", "user.avatarUrl")]);
        doc.append_child(card, title).unwrap();
        doc.append_child(card, img).unwrap();

        doc.append_child(doc.body(), card).unwrap();
        assert_eq!(doc.text_content(title).unwrap(), "");

        assert_eq!(observer.process(), 2);
        assert_eq!(doc.text_content(title).unwrap(), "pepperoni");
        assert_eq!(doc.attribute(img, "src").unwrap().as_deref(), Some("a.png"));
    }

    #[test]
    fn re_pointing_a_binding_resolves_new_path() {
        let (_store, doc, observer) = fixture();
        let span = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        doc.append_child(doc.body(), span).unwrap();
        observer.process();

        doc.set_attribute(span, "data-bind", "meals.vegetarian").unwrap();
        observer.process();

        assert_eq!(doc.text_content(span).unwrap(), "salad");
    }

    #[test]
    fn own_writes_are_ignored_on_next_turn() {
        let (store, doc, observer) = fixture();
        let span = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        doc.append_child(doc.body(), span).unwrap();
        observer.process();

        store.set("meals.pizza", "funghi").unwrap();
        assert_eq!(observer.pending(), 0);
        assert_eq!(observer.process(), 0);
    }

    #[test]
    fn queue_stays_empty_across_unflushed_writes() {
        let (store, doc, observer) = fixture();
        let span = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        let img = doc.create_element_with("img", &[("data-bind-attr-src", "user.avatarUrl")]);
        doc.append_child(doc.body(), span).unwrap();
        doc.append_child(doc.body(), img).unwrap();
        observer.process();

        for i in 0..1_000 {
            store.set("meals.pizza", i).unwrap();
            store.set("user.avatarUrl", format!("{i}.png")).unwrap();
        }

        assert_eq!(doc.text_content(span).unwrap(), "999");
        assert_eq!(doc.attribute(img, "src").unwrap().as_deref(), Some("999.png"));
        assert_eq!(observer.pending(), 0);
    }

    #[test]
    fn removed_before_turn_is_skipped() {
        let (_store, doc, observer) = fixture();
        let span = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        doc.append_child(doc.body(), span).unwrap();
        doc.remove(span).unwrap();

        assert_eq!(observer.process(), 0);
        assert_eq!(doc.text_content(span).unwrap(), "");
    }

    #[test]
    fn dropped_before_turn_is_skipped() {
        let (_store, doc, observer) = fixture();
        let span = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        doc.append_child(doc.body(), span).unwrap();
        doc.drop_node(span).unwrap();

        assert_eq!(observer.process(), 0);
        assert!(!doc.contains(span));
    }

    #[test]
    fn plain_attribute_changes_are_ignored() {
        let (_store, doc, observer) = fixture();
        let span = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        doc.append_child(doc.body(), span).unwrap();
        observer.process();
        doc.set_text_content(span, "edited").unwrap();

        doc.set_attribute(span, "class", "highlight").unwrap();
        assert_eq!(observer.process(), 0);
        assert_eq!(doc.text_content(span).unwrap(), "edited");
    }

    #[test]
    fn removed_binding_attribute_is_ignored() {
        let (_store, doc, observer) = fixture();
        let span = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        doc.append_child(doc.body(), span).unwrap();
        observer.process();

        doc.remove_attribute(span, "data-bind").unwrap();
        assert_eq!(observer.process(), 0);
    }

    #[test]
    fn one_bad_record_does_not_stop_the_batch() {
        let (_store, doc, observer) = fixture();
        let broken = doc.create_element_with("span", &[("data-bind", "meals..pizza")]);
        let fine = doc.create_element_with("span", &[("data-bind", "meals.pizza")]);
        doc.append_child(doc.body(), broken).unwrap();
        doc.append_child(doc.body(), fine).unwrap();

        assert_eq!(observer.process(), 1);
        assert_eq!(doc.text_content(fine).unwrap(), "pepperoni");
    }

    #[test]
    fn dropping_disconnects() {
        let (_store, doc, observer) = fixture();
        let id = observer.id();
        observer.disconnect();
        assert!(!doc.disconnect(id));
    }
}
