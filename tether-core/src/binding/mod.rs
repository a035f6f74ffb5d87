//! Declarative DOM Binding
//!
//! Elements declare which state path they mirror through attributes; this
//! module finds those declarations and writes state into them.
//!
//! - [`declaration`](BindingDeclaration): reading declarations off elements
//! - [`Resolver`]: pushing the value of a path into every element bound to it
//! - [`DomObserver`]: re-resolving when bound markup is inserted or re-pointed
//! - [`init`]: the first full synchronization pass

mod declaration;
mod init;
mod observer;
mod resolver;

pub use declaration::{declares, BindingDeclaration, BindingTarget};
pub use init::init;
pub use observer::DomObserver;
pub use resolver::Resolver;
