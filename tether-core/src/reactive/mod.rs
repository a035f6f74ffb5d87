//! Reactive State
//!
//! This module implements the observable state tree: values, paths, the
//! store that owns the tree, and the proxies that give path-positioned
//! access to it.
//!
//! # Concepts
//!
//! ## Values and Paths
//!
//! The state tree is a nested map of [`Value`]s. A [`Path`] such as
//! `meals.meat.1` names one node in it. The [`path`] module's `get` and `set`
//! are the plain accessors everything else is built on.
//!
//! ## Store
//!
//! A [`Store`] owns the tree and is bound to a document. Every write through
//! the store synchronizes the elements bound to the written path, and to
//! every path nested under it when the written value is a composite.
//!
//! ## Proxies
//!
//! A [`Proxy`] is the store seen from one path. Reading a composite through
//! a proxy yields a deeper proxy, so write interception follows reads down
//! the tree without registering anything.
//!
//! # Implementation Notes
//!
//! There is no subscription registry. Who observes a path is discovered by
//! querying the document at write time, so elements added or removed since
//! the last write are always accounted for.

mod batch;
pub mod path;
mod proxy;
mod store;
mod value;

pub use batch::BatchGuard;
pub use path::Path;
pub use proxy::{Entry, Proxy};
pub use store::Store;
pub use value::{Map, Value};
