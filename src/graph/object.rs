//! The node payload variants of the data structure graph.
//!
//! `DataObject` is a closed enum: the supported node kinds are fixed, and
//! everything that needs per-kind behavior matches on it. Container kinds
//! (groups, attribute matrices, geometries) carry a [`ChildIndex`], an
//! ordered child-id list plus a per-level name index, which is what keeps
//! path resolution O(depth).

use super::geometry::Geometry;
use super::id::DataId;
use super::neighbor_list::AnyNeighborList;
use crate::store::AnyStore;
use crate::types::ScalarValue;
use std::collections::HashMap;

/// Ordered children of one container level, indexed by name.
///
/// Sibling names are unique; insertion order is preserved across removals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildIndex {
    order: Vec<DataId>,
    by_name: HashMap<String, DataId>,
}

impl ChildIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Child ids in insertion order.
    pub fn ids(&self) -> &[DataId] {
        &self.order
    }

    pub fn get(&self, name: &str) -> Option<DataId> {
        self.by_name.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains_id(&self, id: DataId) -> bool {
        self.order.contains(&id)
    }

    /// Append a child. Returns `false` on a sibling name collision.
    pub fn insert(&mut self, name: impl Into<String>, id: DataId) -> bool {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return false;
        }
        self.by_name.insert(name, id);
        self.order.push(id);
        true
    }

    /// Remove a child by name, returning its id.
    pub fn remove(&mut self, name: &str) -> Option<DataId> {
        let id = self.by_name.remove(name)?;
        self.order.retain(|&c| c != id);
        Some(id)
    }

    /// Re-key a child under a new name, keeping its position.
    /// Returns `false` if `old` is absent or `new` collides.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> bool {
        let new = new.into();
        if new != old && self.by_name.contains_key(&new) {
            return false;
        }
        match self.by_name.remove(old) {
            Some(id) => {
                self.by_name.insert(new, id);
                true
            }
            None => false,
        }
    }

    /// Restore a specific child order (used by readers). Ids absent from
    /// `order` keep their relative position after the ordered ones.
    pub fn set_order(&mut self, order: &[DataId]) {
        let mut next: Vec<DataId> = order
            .iter()
            .copied()
            .filter(|id| self.order.contains(id))
            .collect();
        for &id in &self.order {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        self.order = next;
    }
}

/// What flavor of group a container node is.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKind {
    /// Plain organizational group.
    Generic,
    /// Attribute matrix: a group whose child arrays all share this tuple
    /// shape.
    AttributeMatrix { tuple_shape: Vec<usize> },
}

/// A group node: ordered children plus the group flavor.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupData {
    pub kind: GroupKind,
    pub children: ChildIndex,
}

impl GroupData {
    pub fn generic() -> Self {
        Self {
            kind: GroupKind::Generic,
            children: ChildIndex::new(),
        }
    }

    pub fn attribute_matrix(tuple_shape: Vec<usize>) -> Self {
        Self {
            kind: GroupKind::AttributeMatrix { tuple_shape },
            children: ChildIndex::new(),
        }
    }
}

/// A geometry node: structural metadata plus its own children.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryData {
    pub geometry: Geometry,
    pub children: ChildIndex,
}

impl GeometryData {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            children: ChildIndex::new(),
        }
    }
}

/// One string value per tuple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringArray {
    values: Vec<String>,
}

impl StringArray {
    pub fn new(num_tuples: usize) -> Self {
        Self {
            values: vec![String::new(); num_tuples],
        }
    }

    pub fn from_values(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn num_tuples(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [String] {
        &mut self.values
    }

    /// Resize the tuple count; new slots hold empty strings.
    pub fn resize_tuples(&mut self, num_tuples: usize) {
        self.values.resize(num_tuples, String::new());
    }
}

/// The payload of one graph node.
#[derive(Clone, PartialEq)]
pub enum DataObject {
    /// Generic group or attribute matrix.
    Group(GroupData),
    /// Geometry with structural metadata and children.
    Geometry(GeometryData),
    /// Typed array backed by one store.
    Array(AnyStore),
    /// Single unshaped value.
    Scalar(ScalarValue),
    /// Per-tuple ragged lists.
    NeighborList(AnyNeighborList),
    /// One string per tuple.
    StringArray(StringArray),
}

impl DataObject {
    /// The serialized type tag of this object.
    pub fn type_tag(&self) -> &'static str {
        match self {
            DataObject::Group(g) => match g.kind {
                GroupKind::Generic => "DataGroup",
                GroupKind::AttributeMatrix { .. } => "AttributeMatrix",
            },
            DataObject::Geometry(g) => g.geometry.type_tag(),
            DataObject::Array(_) => "DataArray",
            DataObject::Scalar(_) => "ScalarData",
            DataObject::NeighborList(_) => "NeighborList",
            DataObject::StringArray(_) => "StringArray",
        }
    }

    /// Whether this object can parent other objects.
    pub fn is_container(&self) -> bool {
        matches!(self, DataObject::Group(_) | DataObject::Geometry(_))
    }

    /// The child index, for container kinds.
    pub fn children(&self) -> Option<&ChildIndex> {
        match self {
            DataObject::Group(g) => Some(&g.children),
            DataObject::Geometry(g) => Some(&g.children),
            _ => None,
        }
    }

    /// Mutable child index, for container kinds.
    pub fn children_mut(&mut self) -> Option<&mut ChildIndex> {
        match self {
            DataObject::Group(g) => Some(&mut g.children),
            DataObject::Geometry(g) => Some(&mut g.children),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupData> {
        match self {
            DataObject::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&GeometryData> {
        match self {
            DataObject::Geometry(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&AnyStore> {
        match self {
            DataObject::Array(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut AnyStore> {
        match self {
            DataObject::Array(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarValue> {
        match self {
            DataObject::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_neighbor_list(&self) -> Option<&AnyNeighborList> {
        match self {
            DataObject::NeighborList(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_neighbor_list_mut(&mut self) -> Option<&mut AnyNeighborList> {
        match self {
            DataObject::NeighborList(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&StringArray> {
        match self {
            DataObject::StringArray(s) => Some(s),
            _ => None,
        }
    }

    /// Deep copy of the payload. Child indexes are copied verbatim; the
    /// caller (the structure's subtree copy) rewrites child ids.
    pub fn deep_copy(&self) -> Self {
        match self {
            DataObject::Group(g) => DataObject::Group(g.clone()),
            DataObject::Geometry(g) => DataObject::Geometry(g.clone()),
            DataObject::Array(s) => DataObject::Array(s.deep_copy()),
            DataObject::Scalar(v) => DataObject::Scalar(*v),
            DataObject::NeighborList(l) => DataObject::NeighborList(l.deep_copy()),
            DataObject::StringArray(s) => DataObject::StringArray(s.clone()),
        }
    }
}

impl std::fmt::Debug for DataObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataObject::Group(g) => f
                .debug_struct("Group")
                .field("kind", &g.kind)
                .field("children", &g.children.len())
                .finish(),
            DataObject::Geometry(g) => f
                .debug_struct("Geometry")
                .field("tag", &g.geometry.type_tag())
                .field("children", &g.children.len())
                .finish(),
            DataObject::Array(s) => f
                .debug_struct("Array")
                .field("type", &s.scalar_type())
                .field("tuples", &s.num_tuples())
                .field("components", &s.num_components())
                .finish(),
            DataObject::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            DataObject::NeighborList(l) => f
                .debug_struct("NeighborList")
                .field("type", &l.scalar_type())
                .field("tuples", &l.num_tuples())
                .finish(),
            DataObject::StringArray(s) => f
                .debug_struct("StringArray")
                .field("tuples", &s.num_tuples())
                .finish(),
        }
    }
}
