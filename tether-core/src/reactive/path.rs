//! Path Accessor
//!
//! A path names exactly one node in the state tree as a sequence of keys,
//! written dot-joined: `meals.meat.1`. Paths are never stored alongside the
//! tree; a [`Proxy`](super::Proxy) rebuilds its path by appending the key it
//! traversed to its parent's path.
//!
//! # Reads and writes
//!
//! [`get`] walks key by key and yields `None` as soon as a key is missing.
//! [`set`] walks to the parent of the final key and assigns there. When the
//! parent chain does not resolve the write is dropped: intermediate nodes are
//! never created on the caller's behalf.

use std::fmt;

use smallvec::SmallVec;

use super::value::Value;
use crate::error::{BindError, Result};

/// A dot-delimited location in the state tree.
///
/// The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: SmallVec<[String; 4]>,
}

impl Path {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot-delimited path.
    ///
    /// Empty strings and empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(BindError::EmptyPath);
        }
        let segments: SmallVec<[String; 4]> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(BindError::EmptySegment(path.to_string()));
        }
        Ok(Self { segments })
    }

    /// This path extended by one key.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Self { segments }
    }

    /// This path extended by a relative dot-delimited path.
    pub fn join(&self, relative: &str) -> Result<Self> {
        let relative = Self::parse(relative)?;
        let mut segments = self.segments.clone();
        segments.extend(relative.segments);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of keys in the path.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The final key, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path without its final key, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(Self {
            segments: init.iter().cloned().collect(),
        })
    }

    /// Whether `self` equals `prefix` or lies beneath it.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Look this path up in `root`.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |node, key| node.as_composite()?.get(key))
    }

    /// Assign `value` at this path inside `root`.
    ///
    /// Returns `false`, leaving `root` untouched, when the parent of the
    /// final key does not resolve to a composite. The root path itself is
    /// not assignable.
    pub fn assign(&self, root: &mut Value, value: Value) -> bool {
        let Some((last, init)) = self.segments.split_last() else {
            return false;
        };
        let parent = init
            .iter()
            .try_fold(root, |node, key| node.as_composite_mut()?.get_mut(key));
        match parent.and_then(Value::as_composite_mut) {
            Some(map) => {
                map.insert(last.clone(), value);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn check_root(root: &Value) -> Result<()> {
    if root.is_composite() {
        Ok(())
    } else {
        Err(BindError::NotComposite(root.type_name()))
    }
}

/// Read the value at `path` inside `root`.
///
/// Missing keys yield `Ok(None)`. A non-composite root or a malformed path
/// is an invalid-argument error.
pub fn get<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>> {
    check_root(root)?;
    Ok(Path::parse(path)?.lookup(root))
}

/// Write `value` at `path` inside `root`.
///
/// Returns whether the write happened. A missing intermediate key is not an
/// error: the call is a no-op returning `false`.
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<bool> {
    check_root(root)?;
    Ok(Path::parse(path)?.assign(root, value))
}
