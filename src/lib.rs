//! # Strata-Core: Hierarchical Data Container for Analysis Pipelines
//!
//! An in-memory data container for scientific pipelines: named, typed
//! objects arranged in a directed acyclic graph, addressed by slash
//! separated paths, mutated through planned actions and serialized
//! through pluggable per-format IO managers.
//!
//! ## Architecture
//!
//! - **Graph**: [`graph::DataStructure`] owns every object in a flat
//!   arena; containers index their children by name, so path resolution
//!   costs O(depth)
//! - **Stores**: bulk element data lives in typed [`store::DataStore`]
//!   buffers behind the [`store::AnyStore`] tag, including empty
//!   placeholder stores for validation passes
//! - **Actions**: filters describe mutations as [`actions::Action`]
//!   plans applied in a Preflight pass (shape checking, placeholder
//!   allocation) and an Execute pass (real data)
//! - **IO**: [`io::FormatIoManager`] implementations serialize whole
//!   graphs; the bundled [`io::BinaryIoManager`] writes a length-framed
//!   binary container
//!
//! ## Example
//!
//! ```
//! use strata_core::actions::{Action, ApplyMode, CancelToken, OutputActions};
//! use strata_core::graph::DataStructure;
//! use strata_core::types::ScalarType;
//!
//! let mut plan = OutputActions::new();
//! plan.push(Action::CreateGroup {
//!     path: "Scan".parse().unwrap(),
//! });
//! plan.push(Action::CreateArray {
//!     path: "Scan/Confidence".parse().unwrap(),
//!     element_type: ScalarType::F32,
//!     tuple_shape: vec![64],
//!     component_shape: vec![1],
//! });
//!
//! let cancel = CancelToken::new();
//! let mut structure = DataStructure::new();
//! // Validate without allocating element data, then run for real.
//! assert!(plan.apply_all(&mut structure, ApplyMode::Preflight, &cancel).is_ok());
//! let mut structure = DataStructure::new();
//! assert!(plan.apply_all(&mut structure, ApplyMode::Execute, &cancel).is_ok());
//!
//! let array = structure.array_at(&"Scan/Confidence".parse().unwrap()).unwrap();
//! assert_eq!(array.num_tuples(), 64);
//! ```

pub mod actions;
pub mod error;
pub mod graph;
pub mod io;
pub mod path;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use actions::{Action, ApplyMode, CancelToken, OutputActions};
pub use error::{Result, StrataError};
pub use graph::{DataId, DataObject, DataStructure};
pub use path::DataPath;
pub use store::{AnyStore, DataStore};
pub use types::{ScalarType, ScalarValue};
