//! Pluggable serialization of whole data structure graphs.
//!
//! Architecture:
//! - A [`FormatIoManager`] owns the container framing of one file format
//!   and a table of per-object-type [`IoStrategy`] values. Strategies
//!   turn one [`DataObject`](crate::graph::DataObject) into a JSON meta
//!   header plus an opaque payload, and back.
//! - Managers live in a process-wide registry (see [`manager`]), looked
//!   up by format name, so callers pick a format at runtime.
//! - Writers emit nodes in parent-before-child order; readers register
//!   nodes under their original ids and resolve multi-parent links and
//!   child ordering in a fix-up pass. Nodes whose type tag no manager
//!   strategy recognizes are skipped with a warning, never a hard error.
//!
//! The bundled format is the binary container in [`binary`].

mod binary;
mod manager;

pub use binary::{BinaryIoManager, FORMAT_NAME as BINARY_FORMAT_NAME};
pub use manager::{format, formats, register_format};

use crate::graph::{DataId, DataObject, DataStructure, StructureError};
use crate::store::{AnyStore, StoreError};
use crate::types::ScalarType;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

/// Failures of the serialization layer.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("file error: {0}")]
    File(#[from] std::io::Error),
    #[error("truncated input while reading {what}")]
    Truncated { what: &'static str },
    #[error("malformed header: {0}")]
    MalformedHeader(#[from] serde_json::Error),
    #[error("not a recognized container (bad magic)")]
    BadMagic,
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u32),
    #[error("duplicate object id {0:?} in input")]
    DuplicateId(DataId),
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IoError {
    /// Stable negative error code, for pipeline result reporting.
    pub fn code(&self) -> i64 {
        match self {
            IoError::File(_) => -200,
            IoError::Truncated { .. } => -201,
            IoError::MalformedHeader(_) => -202,
            IoError::BadMagic | IoError::UnsupportedVersion(_) => -203,
            IoError::DuplicateId(_) => -204,
            IoError::Structure(e) => e.code(),
            IoError::Store(e) => e.code(),
        }
    }
}

/// The per-node header every format serializes alongside the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeHeader {
    pub id: u64,
    /// Parent ids in link order; empty for top-level objects.
    pub parent_ids: Vec<u64>,
    pub type_tag: String,
    pub name: String,
    /// Per-type metadata, shaped by the strategy that wrote it.
    pub meta: serde_json::Value,
}

/// A node the reader left out because no strategy claimed its type tag.
#[derive(Debug, Clone)]
pub struct SkippedNode {
    pub id: u64,
    pub type_tag: String,
    pub name: String,
}

/// Result of reading a container: the reconstructed structure plus
/// everything that was tolerated rather than failed on.
#[derive(Debug)]
pub struct ReadReport {
    pub structure: DataStructure,
    pub skipped: Vec<SkippedNode>,
    pub warnings: Vec<String>,
}

impl ReadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.warnings.is_empty()
    }
}

/// Serialization of one object kind: meta + payload, both directions.
///
/// Strategies are stateless; a single instance serves every node of its
/// type tags. `read_data` reconstructs the payload object only; the
/// manager registers it and restores links and ordering.
pub trait IoStrategy: Send + Sync {
    /// The type tags this strategy claims.
    fn type_tags(&self) -> &'static [&'static str];

    /// Serialize the object into a meta value and payload bytes.
    fn write_data(&self, object: &DataObject) -> Result<(serde_json::Value, Vec<u8>), IoError>;

    /// Reconstruct the object from a record.
    fn read_data(&self, header: &NodeHeader, payload: &[u8]) -> Result<DataObject, IoError>;
}

/// One file format: container framing plus a strategy per object type.
pub trait FormatIoManager: Send + Sync {
    /// Registry key, e.g. `"strata-binary"`.
    fn format_name(&self) -> &'static str;

    /// The strategy claiming `type_tag`, if any.
    fn strategy_for(&self, type_tag: &str) -> Option<&dyn IoStrategy>;

    /// Allocate a placeholder store of the requested type and shape, so a
    /// reader can declare an array before its payload is available.
    fn create_empty_store(
        &self,
        element_type: ScalarType,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
    ) -> AnyStore {
        AnyStore::empty(element_type, tuple_shape, component_shape)
    }

    /// Serialize a whole structure to `writer`.
    fn write_structure(
        &self,
        structure: &DataStructure,
        writer: &mut dyn Write,
    ) -> Result<(), IoError>;

    /// Deserialize a whole structure from `reader`.
    fn read_structure(&self, reader: &mut dyn Read) -> Result<ReadReport, IoError>;
}

/// Write `structure` to a file in the named format.
pub fn write_file(
    format_name: &str,
    structure: &DataStructure,
    path: impl AsRef<std::path::Path>,
) -> Result<(), IoError> {
    let manager = manager::format(format_name).ok_or_else(|| unknown_format(format_name))?;
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    manager.write_structure(structure, &mut file)?;
    file.flush()?;
    Ok(())
}

/// Read a structure from a file in the named format.
pub fn read_file(
    format_name: &str,
    path: impl AsRef<std::path::Path>,
) -> Result<ReadReport, IoError> {
    let manager = manager::format(format_name).ok_or_else(|| unknown_format(format_name))?;
    let mut file = std::io::BufReader::new(std::fs::File::open(path)?);
    manager.read_structure(&mut file)
}

fn unknown_format(name: &str) -> IoError {
    IoError::File(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no IO manager registered for format {name:?}"),
    ))
}
