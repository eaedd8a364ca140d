//! Error handling for strata-core.
//!
//! Each subsystem defines its own `thiserror` enum with stable negative
//! codes (see the subsystem modules). This module ties them together under
//! [`StrataError`] and provides a [`ResultExt`] trait for attaching context
//! as errors bubble up to the pipeline runner.

use thiserror::Error;

use crate::actions::ActionError;
use crate::graph::StructureError;
use crate::io::IoError;
use crate::path::PathError;
use crate::store::StoreError;

/// Top-level error type for strata-core operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// Errors constructing or parsing paths
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Errors from typed element stores
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Errors mutating or resolving the data structure graph
    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    /// Errors applying planned actions
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// Errors in the serialization layer
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// Raw filesystem errors
    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StrataError>,
    },
}

impl StrataError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StrataError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for strata-core operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<StrataError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StrataError::Path(PathError::EmptyComponent);
        assert_eq!(err.to_string(), "Path error: Path component must not be empty");
    }

    #[test]
    fn test_error_with_context() {
        let err = StrataError::Path(PathError::EmptyComponent);
        let with_ctx = err.with_context("Failed to build output path");
        assert!(with_ctx.to_string().contains("Failed to build output path"));
    }

    #[test]
    fn test_result_ext_context() {
        let res: std::result::Result<(), PathError> = Err(PathError::EmptyComponent);
        let wrapped = res.context("while parsing");
        assert!(wrapped.unwrap_err().to_string().contains("while parsing"));
    }
}
