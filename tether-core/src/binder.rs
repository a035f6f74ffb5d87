//! Binder
//!
//! The entry point page scripts use. A [`Binder`] owns a [`Store`] over the
//! page state and a [`DomObserver`] on the document body, and exposes the
//! handful of operations page glue needs:
//!
//! ```rust,ignore
//! use tether_core::{Binder, Document};
//!
//! let document = Document::new();
//! let binder = Binder::from_json(document.clone(), r#"{"meals": {"pizza": "pepperoni"}}"#)?;
//!
//! // <span data-bind="meals.pizza"></span> shows "pepperoni" after init.
//! binder.init();
//!
//! // Updates every element bound to meals.pizza before returning.
//! binder.set("meals.pizza", "mushroom")?;
//!
//! // After inserting markup, let the observer bind it.
//! binder.flush_mutations();
//! ```
//!
//! The host calls [`flush_mutations`](Binder::flush_mutations) once per turn
//! of its event loop, the way it would deliver mutation observer callbacks.

use tracing::debug;

use crate::binding::{self, DomObserver};
use crate::config::BindConfig;
use crate::dom::{Document, NodeId};
use crate::error::{BindError, Result};
use crate::reactive::{Proxy, Store, Value};

/// A store bound to a document, plus the observer keeping late markup in sync.
#[derive(Debug)]
pub struct Binder {
    store: Store,
    observer: DomObserver,
}

impl Binder {
    /// Bind `state` to `document` with the default attribute names.
    pub fn new(document: Document, state: impl Into<Value>) -> Result<Self> {
        Self::with_config(document, state, BindConfig::default())
    }

    /// Bind state given as a JSON object.
    pub fn from_json(document: Document, json: &str) -> Result<Self> {
        let state: Value =
            serde_json::from_str(json).map_err(|e| BindError::InvalidState(e.to_string()))?;
        Self::new(document, state)
    }

    pub fn with_config(document: Document, state: impl Into<Value>, config: BindConfig) -> Result<Self> {
        let body = document.body();
        let store = Store::new(document, state.into(), config)?;
        let observer = DomObserver::observe(&store, body)?;
        debug!("binder ready");
        Ok(Self { store, observer })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn document(&self) -> &Document {
        self.store.document()
    }

    pub fn observer(&self) -> &DomObserver {
        &self.observer
    }

    /// A proxy over the whole state tree.
    pub fn root(&self) -> Proxy {
        self.store.root()
    }

    /// A copy of the value at `path`. Null and absent values read as `""`.
    pub fn get(&self, path: &str) -> Result<Value> {
        self.store.get(path)
    }

    /// Write `value` at `path` and update every bound element.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.store.set(path, value)
    }

    /// Push the current value of `path` into bound elements below `scope`.
    pub fn resolve_by_path(&self, path: &str, scope: Option<NodeId>) -> Result<usize> {
        self.store.resolve_by_path(path, scope)
    }

    /// Synchronize every leaf of the state tree into the document.
    pub fn init(&self) -> usize {
        binding::init(&self.store)
    }

    /// Handle the document changes recorded since the last call.
    pub fn flush_mutations(&self) -> usize {
        self.observer.process()
    }

    /// Run `f` with document synchronization deferred to its end.
    pub fn batch<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        self.store.batch(f)
    }
}
