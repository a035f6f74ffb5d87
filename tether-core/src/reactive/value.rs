//! State Tree Values
//!
//! The state tree is a nested ordered map of string keys to values. A value
//! is either a primitive or another map (a composite). This is the closed
//! set of shapes the store accepts; no other validation is performed.
//!
//! # Conversions
//!
//! Values convert to and from `serde_json::Value`, which is also how they
//! (de)serialize. JSON arrays become composites keyed by their decimal
//! index, so `["a", "b"]` is addressable as `list.0` and `list.1`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::path::Path;

/// Ordered map backing a composite value.
pub type Map = IndexMap<String, Value>;

/// A node in the state tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Composite(Map),
}

impl Value {
    /// An empty composite.
    pub fn composite() -> Self {
        Value::Composite(Map::new())
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Composite(_) => "composite",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Composite(_))
    }

    pub fn as_composite(&self) -> Option<&Map> {
        match self {
            Value::Composite(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_composite_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Composite(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text written into the document for this value.
    ///
    /// Returns `None` for null and composite values; the resolver
    /// substitutes an empty string for those.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null | Value::Composite(_) => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(format_number(*n)),
            Value::String(s) => Some(s.clone()),
        }
    }

    /// Visit every entry nested under this value, depth first.
    ///
    /// `base` is the path of `self`; each visited entry is reported with its
    /// full path. Composites are reported before their children.
    pub fn walk<F>(&self, base: &Path, visit: &mut F)
    where
        F: FnMut(&Path, &Value),
    {
        if let Value::Composite(map) = self {
            for (key, child) in map {
                let path = base.child(key);
                visit(&path, child);
                child.walk(&path, visit);
            }
        }
    }

    /// Paths of every non-composite value nested under this one.
    pub fn leaf_paths(&self, base: &Path) -> Vec<Path> {
        let mut leaves = Vec::new();
        self.walk(base, &mut |path, value| {
            if !value.is_composite() {
                leaves.push(path.clone());
            }
        });
        leaves
    }
}

/// Format a number the way a browser stringifies it for display.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Shortest digits in exponent form, with an explicit `+` on
        // positive exponents: `1e+21`, `1.5e-7`.
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        }
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => f.write_str(&text),
            None if self.is_null() => f.write_str("null"),
            None => f.write_str("{..}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Composite(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Composite(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), Value::from(item)))
                    .collect(),
            ),
            serde_json::Value::Object(fields) => Value::Composite(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serde_json::Value::from(n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::Composite(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
