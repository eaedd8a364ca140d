//! Graph-specific error types.

use super::id::DataId;
use crate::path::{DataPath, PathError};
use thiserror::Error;

/// Errors from structure mutation and path resolution.
///
/// Codes are stable (−100..) so callers can react to specific failures
/// across process and serialization boundaries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("Path '{path}' is already occupied")]
    Occupied { path: DataPath },

    #[error("Parent path '{path}' does not exist")]
    ParentNotFound { path: DataPath },

    #[error("Object at '{path}' cannot hold children")]
    NotAContainer { path: DataPath },

    #[error("Sibling name '{name}' already exists")]
    NameCollision { name: String },

    #[error("No object exists at '{path}'")]
    NotFound { path: DataPath },

    #[error("Invalid object name: {0}")]
    InvalidName(#[from] PathError),

    #[error("Id {0} is already in use")]
    IdInUse(DataId),

    #[error("Id {0} does not refer to a live object")]
    UnknownId(DataId),

    #[error("Linking under '{path}' would create a cycle")]
    Cycle { path: DataPath },
}

impl StructureError {
    /// Stable negative code for this error.
    pub fn code(&self) -> i64 {
        match self {
            StructureError::Occupied { .. } => -100,
            StructureError::ParentNotFound { .. } => -101,
            StructureError::NotAContainer { .. } => -102,
            StructureError::NameCollision { .. } => -104,
            StructureError::NotFound { .. } => -106,
            StructureError::InvalidName(_) => -108,
            StructureError::IdInUse(_) => -109,
            StructureError::UnknownId(_) => -111,
            StructureError::Cycle { .. } => -112,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_stable() {
        let path: DataPath = "A/B".parse().unwrap();
        assert_eq!(StructureError::Occupied { path: path.clone() }.code(), -100);
        assert_eq!(StructureError::NotFound { path }.code(), -106);
        assert_eq!(StructureError::IdInUse(DataId(1)).code(), -109);
        let cycle: DataPath = "A/B".parse().unwrap();
        assert_eq!(StructureError::Cycle { path: cycle }.code(), -112);
    }
}
