//! Binding Configuration
//!
//! Names of the attributes that declare bindings. The defaults match the
//! markup conventions of the pages this engine was built for:
//!
//! ```html
//! <span data-bind="meals.pizza"></span>
//! <img data-bind-attr-src="user.avatarUrl">
//! ```

use serde::{Deserialize, Serialize};

use crate::binding::BindingTarget;
use crate::error::{BindError, Result};

/// Default attribute for content bindings.
pub const DEFAULT_CONTENT_ATTRIBUTE: &str = "data-bind";

/// Default marker prefix for attribute-target bindings.
pub const DEFAULT_ATTRIBUTE_PREFIX: &str = "data-bind-attr-";

/// Attribute naming used to discover binding declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindConfig {
    /// Attribute whose value is the path mirrored into the element's
    /// content or value slot.
    pub content_attribute: String,

    /// Prefix marking attribute-target bindings. The remainder of the
    /// attribute name is the attribute that receives the value.
    pub attribute_prefix: String,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            content_attribute: DEFAULT_CONTENT_ATTRIBUTE.to_string(),
            attribute_prefix: DEFAULT_ATTRIBUTE_PREFIX.to_string(),
        }
    }
}

impl BindConfig {
    /// Parse and validate a configuration from JSON.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BindError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both names are usable attribute names.
    pub fn validate(&self) -> Result<()> {
        check_name("content_attribute", &self.content_attribute)?;
        check_name("attribute_prefix", &self.attribute_prefix)?;
        if self.content_attribute == self.attribute_prefix {
            return Err(BindError::Config(
                "attribute_prefix must differ from content_attribute".to_string(),
            ));
        }
        Ok(())
    }

    /// Classify an attribute name as a binding declaration, if it is one.
    pub fn classify(&self, attribute: &str) -> Option<BindingTarget> {
        if attribute == self.content_attribute {
            return Some(BindingTarget::Content);
        }
        match attribute.strip_prefix(self.attribute_prefix.as_str()) {
            Some(target) if !target.is_empty() => Some(BindingTarget::Attribute(target.to_string())),
            _ => None,
        }
    }

    /// Whether the attribute name declares a binding of either form.
    pub fn is_binding_attribute(&self, attribute: &str) -> bool {
        self.classify(attribute).is_some()
    }
}

fn check_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BindError::Config(format!("{field} must not be empty")));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_uppercase()) {
        return Err(BindError::Config(format!(
            "{field} `{name}` must be lowercase without whitespace"
        )));
    }
    Ok(())
}
