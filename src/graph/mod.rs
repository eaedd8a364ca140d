//! The data structure graph: named, identified nodes in a DAG.
//!
//! Nodes live in a flat arena keyed by [`DataId`] and are addressed by
//! [`DataPath`](crate::path::DataPath). Container nodes (groups,
//! geometries) hold ordered child ids; every node holds its parent ids as
//! back-references, so an object may be shared by several groups. An
//! object is destroyed when its last parent link disappears: explicit
//! reference counting, not garbage collection.
//!
//! # Design
//!
//! - **Flat arena**: `HashMap<DataId, DataNode>`, ids assigned
//!   monotonically and never reused.
//! - **Per-level name index**: each container carries a `ChildIndex`,
//!   keeping path resolution O(depth).
//! - **Closed payload enum**: [`DataObject`] dispatches by match; the
//!   supported node kinds are fixed.
//! - **Single-writer**: no internal synchronization; the enclosing
//!   runner serializes mutations.

pub mod error;
pub mod geometry;
pub mod id;
pub mod neighbor_list;
pub mod object;
pub mod structure;

pub use error::StructureError;
pub use geometry::Geometry;
pub use id::DataId;
pub use neighbor_list::{AnyNeighborList, NeighborList};
pub use object::{ChildIndex, DataObject, GeometryData, GroupData, GroupKind, StringArray};
pub use structure::{CopyReport, DataNode, DataStructure};
