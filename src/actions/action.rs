//! The closed set of planned mutations.

use super::{WARN_EXTERNAL_REFERENCE, WARN_OVERWROTE_SIBLING, WARN_REPLACED_EXISTING};
use crate::graph::{
    AnyNeighborList, DataObject, DataStructure, Geometry, GeometryData, GroupData, StringArray,
    StructureError,
};
use crate::path::DataPath;
use crate::store::{AnyStore, StoreError};
use crate::types::ScalarType;
use thiserror::Error;
use tracing::warn;

/// How an action is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Validate and register planned paths; never allocate element data.
    Preflight,
    /// Perform the real mutation.
    Execute,
}

/// Errors from applying an action. Codes are stable; Preflight failures
/// never mutate the structure.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Object at '{path}' is a {actual}, expected {expected}")]
    TypeMismatch {
        path: DataPath,
        expected: String,
        actual: String,
    },

    #[error("Invalid shape for '{path}': {reason}")]
    InvalidShape { path: DataPath, reason: String },

    #[error("Plan canceled")]
    Canceled,

    #[error("Cannot import object: {reason}")]
    InvalidImport { reason: String },
}

impl ActionError {
    /// Stable negative code for this error.
    pub fn code(&self) -> i64 {
        match self {
            ActionError::Structure(e) => e.code(),
            ActionError::Store(e) => e.code(),
            ActionError::TypeMismatch { .. } => -103,
            ActionError::InvalidShape { .. } => -105,
            ActionError::Canceled => -107,
            ActionError::InvalidImport { .. } => -110,
        }
    }
}

/// A non-fatal condition collected while applying actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionWarning {
    pub code: i64,
    pub message: String,
}

impl ActionWarning {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// One planned mutation against a [`DataStructure`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Create a generic group at `path`.
    CreateGroup { path: DataPath },

    /// Create an attribute matrix at `path`.
    CreateAttributeMatrix {
        path: DataPath,
        tuple_shape: Vec<usize>,
    },

    /// Create a geometry node at `path`.
    CreateGeometry { path: DataPath, geometry: Geometry },

    /// Materialize a typed array at `path`. Preflight inserts a
    /// placeholder store of the declared shape; Execute allocates.
    CreateArray {
        path: DataPath,
        element_type: ScalarType,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
    },

    /// Materialize a ragged list at `path`.
    CreateNeighborList {
        path: DataPath,
        element_type: ScalarType,
        tuple_count: usize,
    },

    /// Materialize a string array at `path`.
    CreateStringArray { path: DataPath, tuple_count: usize },

    /// Deep-copy the subtree at `source` to `destination`.
    CopyGroup {
        source: DataPath,
        destination: DataPath,
    },

    /// Rename the object at `path`. With `overwrite`, an existing sibling
    /// of that name is removed (with a warning); without it, a collision
    /// is a hard error already at Preflight.
    Rename {
        path: DataPath,
        new_name: String,
        overwrite: bool,
    },

    /// Graft a detached subtree at `destination`, replacing any existing
    /// occupant. The subtree is a structure holding exactly one top-level
    /// object.
    ImportObject {
        destination: DataPath,
        subtree: DataStructure,
    },

    /// Remove the object at `path`. Usually scheduled deferred so it runs
    /// only after every creation in the plan validated.
    DeleteData { path: DataPath },
}

impl Action {
    /// Apply this action in the given mode.
    ///
    /// Returns the warnings it produced, or the hard failure. Preflight
    /// failures leave the structure untouched.
    pub fn apply(
        &self,
        ds: &mut DataStructure,
        mode: ApplyMode,
    ) -> Result<Vec<ActionWarning>, ActionError> {
        match self {
            Action::CreateGroup { path } => {
                apply_create(ds, mode, path, |_| DataObject::Group(GroupData::generic()), |o| {
                    matches!(o, DataObject::Group(g)
                        if matches!(g.kind, crate::graph::GroupKind::Generic))
                })
            }
            Action::CreateAttributeMatrix { path, tuple_shape } => {
                let shape = tuple_shape.clone();
                apply_create(
                    ds,
                    mode,
                    path,
                    move |_| DataObject::Group(GroupData::attribute_matrix(shape.clone())),
                    |o| {
                        matches!(o, DataObject::Group(g)
                            if matches!(&g.kind,
                                crate::graph::GroupKind::AttributeMatrix { tuple_shape: t }
                                if t == tuple_shape))
                    },
                )
            }
            Action::CreateGeometry { path, geometry } => apply_create(
                ds,
                mode,
                path,
                |_| DataObject::Geometry(GeometryData::new(geometry.clone())),
                |o| matches!(o, DataObject::Geometry(g) if g.geometry == *geometry),
            ),
            Action::CreateArray {
                path,
                element_type,
                tuple_shape,
                component_shape,
            } => self.apply_create_array(
                ds,
                mode,
                path,
                *element_type,
                tuple_shape,
                component_shape,
            ),
            Action::CreateNeighborList {
                path,
                element_type,
                tuple_count,
            } => self.apply_create_neighbor_list(ds, mode, path, *element_type, *tuple_count),
            Action::CreateStringArray { path, tuple_count } => apply_create(
                ds,
                mode,
                path,
                |_| DataObject::StringArray(StringArray::new(*tuple_count)),
                |o| matches!(o, DataObject::StringArray(s) if s.num_tuples() == *tuple_count),
            ),
            Action::CopyGroup {
                source,
                destination,
            } => self.apply_copy_group(ds, mode, source, destination),
            Action::Rename {
                path,
                new_name,
                overwrite,
            } => self.apply_rename(ds, path, new_name, *overwrite),
            Action::ImportObject {
                destination,
                subtree,
            } => self.apply_import(ds, destination, subtree),
            Action::DeleteData { path } => {
                ds.remove(path)?;
                Ok(Vec::new())
            }
        }
    }

    fn apply_create_array(
        &self,
        ds: &mut DataStructure,
        mode: ApplyMode,
        path: &DataPath,
        element_type: ScalarType,
        tuple_shape: &[usize],
        component_shape: &[usize],
    ) -> Result<Vec<ActionWarning>, ActionError> {
        if component_shape.iter().product::<usize>() == 0 {
            return Err(ActionError::InvalidShape {
                path: path.clone(),
                reason: "component shape must describe at least one component".into(),
            });
        }
        let (parent, name) = split_path(path)?;
        ensure_container_parent(ds, &parent)?;

        match mode {
            ApplyMode::Preflight => {
                if ds.contains(path) {
                    return Err(StructureError::Occupied { path: path.clone() }.into());
                }
                let store =
                    AnyStore::empty(element_type, tuple_shape.to_vec(), component_shape.to_vec());
                ds.insert(name, DataObject::Array(store), &parent)?;
            }
            ApplyMode::Execute => match ds.get(path) {
                None => {
                    let store = AnyStore::new(
                        element_type,
                        tuple_shape.to_vec(),
                        component_shape.to_vec(),
                    );
                    ds.insert(name, DataObject::Array(store), &parent)?;
                }
                Some(DataObject::Array(existing)) if existing.is_placeholder() => {
                    let planned = AnyStore::empty(
                        element_type,
                        tuple_shape.to_vec(),
                        component_shape.to_vec(),
                    );
                    if !existing.same_layout(&planned) {
                        return Err(ActionError::TypeMismatch {
                            path: path.clone(),
                            expected: format!("{element_type} array"),
                            actual: format!("{} array", existing.scalar_type()),
                        });
                    }
                    if let Some(store) = ds.array_at_mut(path) {
                        store.materialize();
                    }
                }
                Some(_) => {
                    return Err(StructureError::Occupied { path: path.clone() }.into());
                }
            },
        }
        Ok(Vec::new())
    }

    /// Like arrays, a planned list is declared as a placeholder at
    /// Preflight and only allocates its per-tuple storage at Execute.
    fn apply_create_neighbor_list(
        &self,
        ds: &mut DataStructure,
        mode: ApplyMode,
        path: &DataPath,
        element_type: ScalarType,
        tuple_count: usize,
    ) -> Result<Vec<ActionWarning>, ActionError> {
        let (parent, name) = split_path(path)?;
        ensure_container_parent(ds, &parent)?;

        match mode {
            ApplyMode::Preflight => {
                if ds.contains(path) {
                    return Err(StructureError::Occupied { path: path.clone() }.into());
                }
                let lists = AnyNeighborList::placeholder(element_type, tuple_count)?;
                ds.insert(name, DataObject::NeighborList(lists), &parent)?;
            }
            ApplyMode::Execute => match ds.get(path) {
                None => {
                    let lists = AnyNeighborList::new(element_type, tuple_count)?;
                    ds.insert(name, DataObject::NeighborList(lists), &parent)?;
                }
                Some(DataObject::NeighborList(existing)) if existing.is_placeholder() => {
                    if existing.scalar_type() != element_type
                        || existing.num_tuples() != tuple_count
                    {
                        return Err(ActionError::TypeMismatch {
                            path: path.clone(),
                            expected: format!("{element_type} list of {tuple_count} tuples"),
                            actual: format!(
                                "{} list of {} tuples",
                                existing.scalar_type(),
                                existing.num_tuples()
                            ),
                        });
                    }
                    if let Some(lists) = ds.neighbor_list_at_mut(path) {
                        lists.materialize();
                    }
                }
                Some(_) => {
                    return Err(StructureError::Occupied { path: path.clone() }.into());
                }
            },
        }
        Ok(Vec::new())
    }

    fn apply_copy_group(
        &self,
        ds: &mut DataStructure,
        mode: ApplyMode,
        source: &DataPath,
        destination: &DataPath,
    ) -> Result<Vec<ActionWarning>, ActionError> {
        // Execute replaces the destination the earlier Preflight on this
        // structure may have registered.
        if mode == ApplyMode::Execute && ds.contains(destination) {
            ds.remove(destination)?;
        }
        let report = ds.deep_copy_group(source, destination)?;
        Ok(report
            .external_references
            .into_iter()
            .map(|reference| {
                warn!(%reference, "copied subtree references data outside the subtree");
                ActionWarning::new(
                    WARN_EXTERNAL_REFERENCE,
                    format!("copy of '{source}' references external data at '{reference}'"),
                )
            })
            .collect())
    }

    fn apply_rename(
        &self,
        ds: &mut DataStructure,
        path: &DataPath,
        new_name: &str,
        overwrite: bool,
    ) -> Result<Vec<ActionWarning>, ActionError> {
        let target = ds
            .id_at(path)
            .ok_or_else(|| StructureError::NotFound { path: path.clone() })?;
        let sibling = path.with_name(new_name).map_err(StructureError::from)?;
        let mut warnings = Vec::new();

        if let Some(existing) = ds.id_at(&sibling) {
            if existing != target {
                if !overwrite {
                    return Err(StructureError::NameCollision {
                        name: new_name.to_string(),
                    }
                    .into());
                }
                warn!(victim = %sibling, "rename overwrites existing sibling");
                warnings.push(ActionWarning::new(
                    WARN_OVERWROTE_SIBLING,
                    format!("rename of '{path}' removed existing '{sibling}'"),
                ));
                ds.remove(&sibling)?;
            }
        }
        ds.rename(path, new_name)?;
        Ok(warnings)
    }

    fn apply_import(
        &self,
        ds: &mut DataStructure,
        destination: &DataPath,
        subtree: &DataStructure,
    ) -> Result<Vec<ActionWarning>, ActionError> {
        let root = match subtree.root_ids() {
            [single] => *single,
            roots => {
                return Err(ActionError::InvalidImport {
                    reason: format!(
                        "detached subtree must hold exactly one top-level object, found {}",
                        roots.len()
                    ),
                })
            }
        };
        let mut warnings = Vec::new();
        if ds.contains(destination) {
            warnings.push(ActionWarning::new(
                WARN_REPLACED_EXISTING,
                format!("import replaced existing object at '{destination}'"),
            ));
            ds.remove(destination)?;
        }
        let report = ds.import_subtree(subtree, root, destination)?;
        warnings.extend(report.external_references.into_iter().map(|reference| {
            ActionWarning::new(
                WARN_EXTERNAL_REFERENCE,
                format!("imported subtree references external data at '{reference}'"),
            )
        }));
        Ok(warnings)
    }
}

fn split_path(path: &DataPath) -> Result<(DataPath, String), ActionError> {
    let name = path
        .name()
        .ok_or_else(|| StructureError::NotFound { path: path.clone() })?
        .to_string();
    Ok((path.parent().unwrap_or_default(), name))
}

fn ensure_container_parent(ds: &DataStructure, parent: &DataPath) -> Result<(), ActionError> {
    if parent.is_root() {
        return Ok(());
    }
    let object = ds
        .get(parent)
        .ok_or_else(|| StructureError::ParentNotFound {
            path: parent.clone(),
        })?;
    if !object.is_container() {
        return Err(StructureError::NotAContainer {
            path: parent.clone(),
        }
        .into());
    }
    Ok(())
}

/// Shared skeleton for the simple creation actions: Preflight inserts the
/// planned object, Execute inserts it anew or accepts an equivalent
/// occupant left by a Preflight on the same structure.
fn apply_create(
    ds: &mut DataStructure,
    mode: ApplyMode,
    path: &DataPath,
    make: impl Fn(ApplyMode) -> DataObject,
    matches_planned: impl Fn(&DataObject) -> bool,
) -> Result<Vec<ActionWarning>, ActionError> {
    let (parent, name) = split_path(path)?;
    ensure_container_parent(ds, &parent)?;

    match ds.get(path) {
        None => {
            ds.insert(name, make(mode), &parent)?;
        }
        Some(existing) => {
            if mode == ApplyMode::Preflight || !matches_planned(existing) {
                return Err(StructureError::Occupied { path: path.clone() }.into());
            }
        }
    }
    Ok(Vec::new())
}
