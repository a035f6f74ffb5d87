//! Binding Resolver
//!
//! The resolver pushes state into the document. Given a path it queries the
//! document for elements declaring that path, looks the path up in the state
//! tree, and writes the rendered value into each element.
//!
//! # Writes
//!
//! - Content bindings on form controls write the value slot.
//! - Other content bindings replace the element's children with one text
//!   node. Values are never parsed as markup.
//! - Attribute bindings write the named attribute.
//!
//! Null, absent and composite values are written as the empty string so
//! placeholder text never leaks into the page.
//!
//! # Failure containment
//!
//! A failure on one element (unknown node, malformed path in its markup) is
//! logged and skipped. The remaining elements are still written.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::declaration::{declares, BindingDeclaration, BindingTarget};
use crate::config::BindConfig;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::reactive::{path, Value};

/// Writes state values into bound elements of a document.
#[derive(Debug, Clone)]
pub struct Resolver {
    document: Document,
    config: Arc<BindConfig>,
}

impl Resolver {
    pub fn new(document: Document, config: Arc<BindConfig>) -> Self {
        Self { document, config }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Write the value of `path` into every element below `scope` that
    /// declares it. `None` searches the whole document.
    ///
    /// Returns the number of element writes performed.
    pub fn apply_binding(&self, tree: &Value, path: &str, scope: Option<NodeId>) -> usize {
        let scope = scope.unwrap_or_else(|| self.document.root());
        self.apply_matching(tree, path, scope, false)
    }

    /// Like [`apply_binding`](Self::apply_binding), with `node` itself also
    /// a candidate.
    pub fn apply_binding_subtree(&self, tree: &Value, node: NodeId, path: &str) -> usize {
        self.apply_matching(tree, path, node, true)
    }

    /// Resolve every declaration carried by one element.
    pub fn apply_element(&self, tree: &Value, node: NodeId) -> usize {
        let declarations = match self.document.with_node(node, |n| {
            n.as_element()
                .map(|el| BindingDeclaration::all(&self.config, el))
                .unwrap_or_default()
        }) {
            Ok(declarations) => declarations,
            Err(err) => {
                warn!(node = %node, error = %err, "cannot read binding declarations");
                return 0;
            }
        };

        let mut written = 0;
        for decl in &declarations {
            if self.contained(node, &decl.path, self.apply_declaration(tree, node, decl)) {
                written += 1;
            }
        }
        written
    }

    /// Resolve every declaration on `node` and on each element below it.
    pub fn apply_tree(&self, tree: &Value, node: NodeId) -> usize {
        let mut elements = vec![node];
        match self.document.descendants(node) {
            Ok(below) => elements.extend(below),
            Err(err) => {
                warn!(node = %node, error = %err, "cannot walk inserted subtree");
                return 0;
            }
        }

        elements
            .into_iter()
            .map(|element| self.apply_element(tree, element))
            .sum()
    }

    /// Resolve a single declaration on a single element.
    pub fn apply_declaration(&self, tree: &Value, node: NodeId, declaration: &BindingDeclaration) -> Result<()> {
        let text = render(tree, &declaration.path)?;
        self.write(node, &declaration.target, &text)?;
        trace!(node = %node, path = %declaration.path, attribute = %declaration.attribute, "binding written");
        Ok(())
    }

    fn apply_matching(&self, tree: &Value, path: &str, scope: NodeId, include_scope: bool) -> usize {
        let candidates = match self
            .document
            .select(scope, include_scope, |el| declares(&self.config, el, path))
        {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(scope = %scope, path, error = %err, "binding query failed");
                return 0;
            }
        };

        let mut written = 0;
        for node in candidates {
            let declarations = self
                .document
                .with_node(node, |n| {
                    n.as_element()
                        .map(|el| BindingDeclaration::all(&self.config, el))
                        .unwrap_or_default()
                })
                .unwrap_or_default();

            for decl in declarations.iter().filter(|d| d.path == path) {
                if self.contained(node, path, self.apply_declaration(tree, node, decl)) {
                    written += 1;
                }
            }
        }

        debug!(path, written, "path resolved");
        written
    }

    fn write(&self, node: NodeId, target: &BindingTarget, text: &str) -> Result<()> {
        match target {
            BindingTarget::Content => {
                let is_control = self.document.with_node(node, |n| {
                    n.as_element().is_some_and(|el| el.is_value_control())
                })?;
                if is_control {
                    self.document.set_value(node, text)
                } else {
                    self.document.set_text_content(node, text)
                }
            }
            BindingTarget::Attribute(name) => self.document.set_attribute(node, name, text),
        }
    }

    /// Log a per-element failure and report whether the write succeeded.
    fn contained(&self, node: NodeId, path: &str, outcome: Result<()>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!(node = %node, path, error = %err, "binding skipped");
                false
            }
        }
    }
}

/// The text written for `path`. Malformed paths are errors; missing, null
/// and composite values render as the empty string.
fn render(tree: &Value, path: &str) -> Result<String> {
    match path::get(tree, path)? {
        Some(value) => Ok(value.render().unwrap_or_else(|| {
            warn!(path, kind = value.type_name(), "rendering non-primitive value as empty string");
            String::new()
        })),
        None => {
            warn!(path, "rendering absent value as empty string");
            Ok(String::new())
        }
    }
}
