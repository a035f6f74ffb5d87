//! Proxies
//!
//! A [`Proxy`] is a store handle positioned at a path. Reading a key that
//! holds a composite yields another proxy one level deeper, so nested data
//! picks up write propagation without any registration step: wrapping is
//! lazy and follows the reads.
//!
//! Proxies address the tree by path, not by reference. A proxy taken before
//! its node was replaced keeps operating on whatever now lives at its path.

use std::fmt;

use super::path::Path;
use super::store::Store;
use super::value::Value;
use crate::error::Result;

/// The result of reading through a proxy.
#[derive(Debug, Clone)]
pub enum Entry {
    /// The key holds a composite; reads and writes continue through it.
    Node(Proxy),

    /// The key holds a primitive. Null and absent keys read as `""`.
    Value(Value),
}

impl Entry {
    pub fn into_node(self) -> Option<Proxy> {
        match self {
            Entry::Node(proxy) => Some(proxy),
            Entry::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Node(_) => None,
        }
    }
}

/// A reactive view of one node in the state tree.
#[derive(Clone)]
pub struct Proxy {
    store: Store,
    path: Path,
}

impl Proxy {
    pub(crate) fn new(store: Store, path: Path) -> Self {
        Self { store, path }
    }

    /// The path this proxy is positioned at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Read `key`, a key or dot-delimited path relative to this proxy.
    pub fn get(&self, key: &str) -> Result<Entry> {
        let path = self.path.join(key)?;
        Ok(match self.store.read(&path) {
            value if value.is_composite() => Entry::Node(Proxy::new(self.store.clone(), path)),
            value => Entry::Value(value),
        })
    }

    /// Write `key`, a key or dot-delimited path relative to this proxy, and
    /// synchronize every element bound at or below it.
    ///
    /// Returns whether the write happened; it is dropped when the parent of
    /// the final key does not exist.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        let path = self.path.join(key)?;
        Ok(self.store.write(&path, value.into()))
    }

    /// Keys of the node under this proxy, in insertion order. Empty when the
    /// node is absent or not a composite.
    pub fn keys(&self) -> Vec<String> {
        self.store.with_tree(|tree| {
            self.path
                .lookup(tree)
                .and_then(Value::as_composite)
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default()
        })
    }

    /// A copy of the node under this proxy.
    pub fn snapshot(&self) -> Option<Value> {
        self.store.lookup(&self.path)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy").field("path", &self.path.to_string()).finish()
    }
}
