//! Hierarchical paths addressing nodes in a [`DataStructure`].
//!
//! A [`DataPath`] is an immutable ordered sequence of non-empty name
//! components, rooted at the implicit container root. It never holds data
//! itself; resolution always happens through
//! [`DataStructure::get`](crate::graph::DataStructure::get).
//!
//! The text form joins components with `/`. `Display` and `FromStr` are
//! exact inverses for every valid path. There is no escaping: a name that
//! contains the separator is rejected at construction time.
//!
//! The empty path denotes the root. `parent()` of a single-component path
//! returns the root path; `parent()` of the root returns `None`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator used in the canonical text form.
pub const PATH_SEPARATOR: char = '/';

/// Errors produced while constructing or parsing a [`DataPath`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path component must not be empty")]
    EmptyComponent,

    #[error("Path component '{0}' contains the separator '{PATH_SEPARATOR}'")]
    SeparatorInName(String),
}

/// An immutable hierarchical name sequence from the implicit root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataPath {
    components: Vec<String>,
}

impl DataPath {
    /// The root path (no components).
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Build a path from components, validating each name.
    pub fn new<I, S>(components: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for component in components {
            let name = component.into();
            validate_name(&name)?;
            out.push(name);
        }
        Ok(Self { components: out })
    }

    /// A single-component path directly under the root.
    pub fn from_name(name: impl Into<String>) -> Result<Self, PathError> {
        Self::new([name.into()])
    }

    /// Number of components.
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// The name components, in order from the root.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The final component, or `None` for the root path.
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// Extend this path by one child name.
    pub fn child(&self, name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        validate_name(&name)?;
        let mut components = self.components.clone();
        components.push(name);
        Ok(Self { components })
    }

    /// The parent path, or `None` for the root.
    ///
    /// A single-component path's parent is the root path.
    pub fn parent(&self) -> Option<Self> {
        if self.components.is_empty() {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Replace the final component, keeping the rest of the path.
    pub fn with_name(&self, name: impl Into<String>) -> Result<Self, PathError> {
        match self.parent() {
            Some(parent) => parent.child(name),
            None => Self::from_name(name),
        }
    }

    /// True if `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &DataPath) -> bool {
        self.components.len() >= prefix.components.len()
            && self.components[..prefix.components.len()] == prefix.components[..]
    }

    /// Rebase this path from `prefix` onto `replacement`.
    ///
    /// Returns `None` when this path does not start with `prefix`.
    pub fn replace_prefix(&self, prefix: &DataPath, replacement: &DataPath) -> Option<Self> {
        if !self.starts_with(prefix) {
            return None;
        }
        let mut components = replacement.components.clone();
        components.extend_from_slice(&self.components[prefix.components.len()..]);
        Some(Self { components })
    }
}

fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::EmptyComponent);
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(PathError::SeparatorInName(name.to_string()));
    }
    Ok(())
}

impl std::fmt::Display for DataPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

impl std::str::FromStr for DataPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        Self::new(s.split(PATH_SEPARATOR).map(str::to_string))
    }
}

impl TryFrom<String> for DataPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DataPath> for String {
    fn from(path: DataPath) -> String {
        path.to_string()
    }
}
