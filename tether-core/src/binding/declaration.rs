//! Binding Declarations
//!
//! A declaration is an attribute on an element that names a state path.
//! There are two forms:
//!
//! - content: `data-bind="meals.pizza"` mirrors the value into the element's
//!   text, or into its value slot for form controls;
//! - attribute: `data-bind-attr-src="user.avatarUrl"` mirrors the value into
//!   the `src` attribute.
//!
//! Declarations are read off the element whenever a path is resolved. The
//! document is the only registry.

use smallvec::SmallVec;

use crate::config::BindConfig;
use crate::dom::ElementData;

/// Where a resolved value is written on the element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingTarget {
    /// Text content, or the value slot of a form control.
    Content,

    /// The named attribute.
    Attribute(String),
}

/// One binding attribute found on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDeclaration {
    /// The attribute carrying the declaration.
    pub attribute: String,

    pub target: BindingTarget,

    /// The raw path string, exactly as written in the attribute.
    pub path: String,
}

impl BindingDeclaration {
    /// Every declaration carried by `element`, in attribute order.
    pub fn all(config: &BindConfig, element: &ElementData) -> SmallVec<[Self; 2]> {
        element
            .attributes()
            .filter_map(|(name, value)| {
                config.classify(name).map(|target| Self {
                    attribute: name.to_string(),
                    target,
                    path: value.to_string(),
                })
            })
            .collect()
    }

    /// The declaration carried by one attribute, if it is a binding attribute
    /// and is currently set.
    pub fn from_attribute(config: &BindConfig, element: &ElementData, attribute: &str) -> Option<Self> {
        let target = config.classify(attribute)?;
        let path = element.attribute(attribute)?;
        Some(Self {
            attribute: attribute.to_string(),
            target,
            path: path.to_string(),
        })
    }
}

/// Whether `element` declares a binding of either form for `path`.
pub fn declares(config: &BindConfig, element: &ElementData, path: &str) -> bool {
    element
        .attributes()
        .any(|(name, value)| value == path && config.is_binding_attribute(name))
}
