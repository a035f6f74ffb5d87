//! Mutation Records
//!
//! Every structural or attribute change made through the document API is
//! described by a [`MutationRecord`] and queued for each observer whose
//! registration covers the changed node. Observers drain their queue with
//! [`Document::take_records`](super::Document::take_records); nothing is
//! delivered eagerly, mirroring how a host page batches observer callbacks
//! per turn.

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::node::NodeId;

/// Unique identifier for an observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which changes an observer receives, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Receive child insertions and removals.
    pub child_list: bool,

    /// Receive attribute changes.
    pub attributes: bool,

    /// Also receive changes made anywhere below the target, not only on it.
    pub subtree: bool,

    /// Only receive child-list changes that insert at least one element.
    pub element_insertions_only: bool,

    /// Only receive changes to matching attributes. `None` receives all.
    pub attribute_filter: Option<AttributeFilter>,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            child_list: true,
            attributes: true,
            subtree: true,
            element_insertions_only: false,
            attribute_filter: None,
        }
    }
}

/// Attribute names an observer cares about, by exact name or by prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    pub names: Vec<String>,
    pub prefixes: Vec<String>,
}

impl AttributeFilter {
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name) || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// A single change to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children of `target` were inserted or removed.
    ChildList {
        target: NodeId,
        added: SmallVec<[NodeId; 1]>,
        removed: SmallVec<[NodeId; 1]>,
    },

    /// Attribute `name` of `target` was set or removed.
    Attributes {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
}

impl MutationRecord {
    /// The node whose children or attributes changed.
    pub fn target(&self) -> NodeId {
        match self {
            MutationRecord::ChildList { target, .. } | MutationRecord::Attributes { target, .. } => {
                *target
            }
        }
    }

}

/// An observer's registration on a document.
#[derive(Debug)]
pub(super) struct Registration {
    pub(super) target: NodeId,
    pub(super) options: ObserveOptions,
    pub(super) queue: Vec<MutationRecord>,
}

impl Registration {
    pub(super) fn new(target: NodeId, options: ObserveOptions) -> Self {
        Self {
            target,
            options,
            queue: Vec::new(),
        }
    }

    /// Whether the record passes this registration's options, ignoring
    /// where it happened. `is_element` tells inserted elements apart from
    /// other nodes.
    pub(super) fn wants(&self, record: &MutationRecord, is_element: impl Fn(NodeId) -> bool) -> bool {
        match record {
            MutationRecord::ChildList { added, .. } => {
                self.options.child_list
                    && (!self.options.element_insertions_only || added.iter().any(|id| is_element(*id)))
            }
            MutationRecord::Attributes { name, .. } => {
                self.options.attributes
                    && self
                        .options
                        .attribute_filter
                        .as_ref()
                        .map_or(true, |filter| filter.matches(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn observer_ids_are_unique() {
        assert_ne!(ObserverId::new(), ObserverId::new());
    }

    #[test]
    fn registration_filters_by_kind() {
        let target = NodeId::new();
        let attrs_only = Registration::new(
            target,
            ObserveOptions {
                child_list: false,
                ..ObserveOptions::default()
            },
        );

        let child_list = MutationRecord::ChildList {
            target,
            added: smallvec![NodeId::new()],
            removed: SmallVec::new(),
        };
        let attribute = MutationRecord::Attributes {
            target,
            name: "data-bind".into(),
            old_value: None,
        };

        assert!(!attrs_only.wants(&child_list, |_| true));
        assert!(attrs_only.wants(&attribute, |_| true));
        assert_eq!(attribute.target(), target);
    }

    #[test]
    fn registration_filters_text_insertions_and_attributes() {
        let target = NodeId::new();
        let inserted = NodeId::new();
        let narrow = Registration::new(
            target,
            ObserveOptions {
                element_insertions_only: true,
                attribute_filter: Some(AttributeFilter {
                    names: vec!["data-bind".into()],
                    prefixes: vec!["data-bind-attr-".into()],
                }),
                ..ObserveOptions::default()
            },
        );

        let insertion = MutationRecord::ChildList {
            target,
            added: smallvec![inserted],
            removed: SmallVec::new(),
        };
        let removal = MutationRecord::ChildList {
            target,
            added: SmallVec::new(),
            removed: smallvec![inserted],
        };
        let attribute = |name: &str| MutationRecord::Attributes {
            target,
            name: name.into(),
            old_value: None,
        };

        assert!(narrow.wants(&insertion, |id| id == inserted));
        assert!(!narrow.wants(&insertion, |_| false));
        assert!(!narrow.wants(&removal, |_| true));
        assert!(narrow.wants(&attribute("data-bind"), |_| true));
        assert!(narrow.wants(&attribute("data-bind-attr-src"), |_| true));
        assert!(!narrow.wants(&attribute("src"), |_| true));
        assert!(!narrow.wants(&attribute("data-binder"), |_| true));
    }
}
