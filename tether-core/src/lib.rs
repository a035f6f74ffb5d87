//! Tether Core
//!
//! This crate keeps a page's markup in sync with a nested state object.
//! It implements:
//!
//! - An observable state tree with path-based reads and writes
//! - Declarative bindings expressed as element attributes
//! - Immediate (or batched) propagation of writes into bound elements
//! - An observer that binds markup inserted or re-pointed at runtime
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: state values, paths, the store and its proxies
//! - `binding`: binding declarations, the resolver, the DOM observer and
//!   the initial synchronization pass
//! - `dom`: the in-memory document the bindings are written into
//! - `binder`: the facade tying a store and an observer to one document
//!
//! There is no binding registry. Which elements observe a path is answered
//! by querying the document whenever the path is written, so the document
//! is always the source of truth.
//!
//! # Example
//!
//! ```rust,ignore
//! use tether_core::{Binder, Document};
//!
//! let document = Document::new();
//! let img = document.create_element_with("img", &[("data-bind-attr-src", "user.avatarUrl")]);
//! document.append_child(document.body(), img)?;
//!
//! let binder = Binder::from_json(document.clone(), r#"{"user": {"avatarUrl": null}}"#)?;
//! binder.init();
//!
//! binder.set("user.avatarUrl", "a.png")?;
//! assert_eq!(document.attribute(img, "src")?.as_deref(), Some("a.png"));
//! ```

pub mod binder;
pub mod binding;
pub mod config;
pub mod dom;
pub mod error;
pub mod reactive;

pub use binder::Binder;
pub use config::BindConfig;
pub use dom::{Document, NodeId};
pub use error::{BindError, Result};
pub use reactive::{Entry, Path, Proxy, Store, Value};
