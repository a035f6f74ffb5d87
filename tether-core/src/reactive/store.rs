//! Reactive Store
//!
//! The store owns the state tree and is its only writer. Every write is
//! followed by a synchronization pass that pushes the new value into the
//! document through the [`Resolver`].
//!
//! # How Writes Propagate
//!
//! 1. The value is assigned at its path. If the parent of the final key does
//!    not exist the write is dropped and nothing else happens.
//!
//! 2. The written path is resolved: every element bound to it is updated.
//!
//! 3. If the value is a composite, every path nested inside it is resolved
//!    too, so replacing a whole sub-object refreshes everything bound below.
//!
//! Outside a batch this all happens before `set` returns. Inside a
//! [`batch`](Store::batch) the tree is still updated immediately but the
//! resolutions are collected and flushed once, when the outermost batch ends.
//!
//! # Locking
//!
//! The tree lock is released before the resolver runs for a write, and the
//! resolver never calls back into the store.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::batch::{BatchGuard, BatchState};
use super::path::Path;
use super::proxy::Proxy;
use super::value::Value;
use crate::binding::{BindingDeclaration, Resolver};
use crate::config::BindConfig;
use crate::dom::{Document, NodeId};
use crate::error::{BindError, Result};

struct StoreInner {
    tree: RwLock<Value>,
    resolver: Resolver,
    batch: Mutex<BatchState>,
}

/// Observable state bound to a document.
///
/// Clones share the same tree.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Wrap `state` and bind it to `document`.
    ///
    /// The state must be a composite; the configuration is validated.
    pub fn new(document: Document, state: Value, config: BindConfig) -> Result<Self> {
        config.validate()?;
        if !state.is_composite() {
            return Err(BindError::NotComposite(state.type_name()));
        }

        Ok(Self {
            inner: Arc::new(StoreInner {
                tree: RwLock::new(state),
                resolver: Resolver::new(document, Arc::new(config)),
                batch: Mutex::new(BatchState::default()),
            }),
        })
    }

    pub fn document(&self) -> &Document {
        self.inner.resolver.document()
    }

    pub fn config(&self) -> &BindConfig {
        self.inner.resolver.config()
    }

    /// A proxy over the whole tree.
    pub fn root(&self) -> Proxy {
        Proxy::new(self.clone(), Path::root())
    }

    /// A proxy over the node at `path`. The node need not exist yet.
    pub fn proxy(&self, path: &str) -> Result<Proxy> {
        Ok(Proxy::new(self.clone(), Path::parse(path)?))
    }

    /// A copy of the value at `path`.
    ///
    /// Null and absent values read as `""`, the same as through a
    /// [`Proxy`]. Use [`snapshot`](Self::snapshot) to see the raw tree.
    pub fn get(&self, path: &str) -> Result<Value> {
        let path = Path::parse(path)?;
        Ok(self.read(&path))
    }

    /// Assign `value` at `path` and synchronize the document.
    ///
    /// A missing parent is not an error; the state is left unchanged.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        let path = Path::parse(path)?;
        self.write(&path, value.into());
        Ok(())
    }

    /// Push the current value of `path` into elements bound to it below
    /// `scope` (the whole document when `None`).
    pub fn resolve_by_path(&self, path: &str, scope: Option<NodeId>) -> Result<usize> {
        let path = Path::parse(path)?;
        Ok(self.resolve(&path, scope))
    }

    /// Like [`resolve_by_path`](Self::resolve_by_path) with `node` itself
    /// also a candidate.
    pub fn resolve_subtree_by_path(&self, node: NodeId, path: &str) -> Result<usize> {
        let path = Path::parse(path)?;
        let tree = self.inner.tree.read();
        Ok(self
            .inner
            .resolver
            .apply_binding_subtree(&tree, node, &path.to_string()))
    }

    /// Resolve every declaration on `node` and on the elements below it.
    pub fn resolve_tree(&self, node: NodeId) -> usize {
        let tree = self.inner.tree.read();
        self.inner.resolver.apply_tree(&tree, node)
    }

    /// Resolve one declaration on one element.
    pub fn resolve_declaration(&self, node: NodeId, declaration: &BindingDeclaration) -> Result<()> {
        let tree = self.inner.tree.read();
        self.inner.resolver.apply_declaration(&tree, node, declaration)
    }

    /// A deep copy of the whole tree.
    pub fn snapshot(&self) -> Value {
        self.inner.tree.read().clone()
    }

    /// Run `f` with read access to the tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.tree.read())
    }

    /// Run `f` with resolutions deferred until it returns.
    ///
    /// Each distinct path written inside the batch is resolved once, in the
    /// order it was first written. Batches nest; only the outermost one
    /// flushes.
    pub fn batch<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        let _guard = self.begin_batch();
        f(self)
    }

    /// Open a batch that flushes when the returned guard is dropped.
    pub fn begin_batch(&self) -> BatchGuard<'_> {
        self.inner.batch.lock().enter();
        BatchGuard::new(self)
    }

    pub fn is_batching(&self) -> bool {
        self.inner.batch.lock().is_active()
    }

    pub(crate) fn lookup(&self, path: &Path) -> Option<Value> {
        path.lookup(&self.inner.tree.read()).cloned()
    }

    /// Read `path` with null and absent values normalized to `""`.
    pub(crate) fn read(&self, path: &Path) -> Value {
        match self.lookup(path) {
            Some(Value::Null) | None => Value::String(String::new()),
            Some(value) => value,
        }
    }

    /// Assign and propagate. Returns whether the tree changed.
    pub(crate) fn write(&self, path: &Path, value: Value) -> bool {
        let mut affected = vec![path.clone()];
        value.walk(path, &mut |nested, _| affected.push(nested.clone()));

        let written = path.assign(&mut self.inner.tree.write(), value);
        if !written {
            debug!(path = %path, "write dropped, parent does not exist");
            return false;
        }

        {
            let mut batch = self.inner.batch.lock();
            if batch.is_active() {
                debug!(path = %path, "write deferred to batch flush");
                batch.defer(affected);
                return true;
            }
        }

        for path in &affected {
            self.resolve(path, None);
        }
        true
    }

    pub(crate) fn resolve(&self, path: &Path, scope: Option<NodeId>) -> usize {
        let tree = self.inner.tree.read();
        self.inner
            .resolver
            .apply_binding(&tree, &path.to_string(), scope)
    }

    pub(crate) fn finish_batch(&self) {
        let flush = self.inner.batch.lock().exit();
        if !flush.is_empty() {
            debug!(paths = flush.len(), "flushing batch");
        }
        for path in flush {
            self.resolve(&path, None);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("tree", &*self.inner.tree.read())
            .field("batching", &self.is_batching())
            .finish()
    }
}
