//! The DAG container and sole mutation point.
//!
//! All objects of one pipeline run live here, in a flat arena keyed by
//! [`DataId`]. Top-level objects sit in the structure's own root index;
//! nested objects are reached by walking per-level name indexes, so path
//! resolution costs O(depth) rather than O(graph size).
//!
//! An object stays alive while it is root-linked or has at least one
//! parent. Removing the last link destroys it and cascades to descendants
//! that were exclusively owned by it.

use super::error::StructureError;
use super::id::DataId;
use super::object::{ChildIndex, DataObject};
use crate::path::DataPath;
use crate::store::AnyStore;
use crate::types::ScalarValue;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::trace;

/// One node of the graph: identity, name, parent back-references, payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataNode {
    id: DataId,
    name: String,
    parents: Vec<DataId>,
    pub object: DataObject,
}

impl DataNode {
    pub fn id(&self) -> DataId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent ids, in link order. Empty for root-level objects.
    pub fn parents(&self) -> &[DataId] {
        &self.parents
    }
}

/// Result of a subtree deep copy.
#[derive(Debug, Clone)]
pub struct CopyReport {
    /// Id of the copied subtree's root object.
    pub root_id: DataId,
    /// Geometry references that pointed outside the copied subtree.
    /// They are kept as-is in the copy and surfaced here, never dropped.
    pub external_references: Vec<DataPath>,
}

/// The hierarchical container: owns all objects, assigns ids, indexes by
/// path, and enforces the structural invariants.
#[derive(Debug, Clone, Default)]
pub struct DataStructure {
    nodes: HashMap<DataId, DataNode>,
    root: ChildIndex,
    next_id: u64,
}

impl DataStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of top-level objects, in insertion order.
    pub fn root_ids(&self) -> &[DataId] {
        self.root.ids()
    }

    fn alloc_id(&mut self) -> DataId {
        let id = DataId(self.next_id);
        self.next_id += 1;
        id
    }

    // ---- resolution -----------------------------------------------------

    /// Resolve a path to an id. `None` when any component is missing.
    pub fn id_at(&self, path: &DataPath) -> Option<DataId> {
        let mut components = path.components().iter();
        let first = components.next()?;
        let mut current = self.root.get(first)?;
        for name in components {
            let node = self.nodes.get(&current)?;
            current = node.object.children()?.get(name)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &DataPath) -> bool {
        self.id_at(path).is_some()
    }

    /// The node with the given id.
    pub fn node(&self, id: DataId) -> Option<&DataNode> {
        self.nodes.get(&id)
    }

    /// The node at the given path.
    pub fn node_at(&self, path: &DataPath) -> Option<&DataNode> {
        self.nodes.get(&self.id_at(path)?)
    }

    /// The object at the given path.
    pub fn get(&self, path: &DataPath) -> Option<&DataObject> {
        self.node_at(path).map(|n| &n.object)
    }

    /// Mutable access to the object at the given path.
    pub fn get_mut(&mut self, path: &DataPath) -> Option<&mut DataObject> {
        let id = self.id_at(path)?;
        self.nodes.get_mut(&id).map(|n| &mut n.object)
    }

    /// Typed accessor: array store at `path`, `None` on type mismatch.
    pub fn array_at(&self, path: &DataPath) -> Option<&AnyStore> {
        self.get(path)?.as_array()
    }

    pub fn array_at_mut(&mut self, path: &DataPath) -> Option<&mut AnyStore> {
        self.get_mut(path)?.as_array_mut()
    }

    pub fn group_at(&self, path: &DataPath) -> Option<&super::object::GroupData> {
        self.get(path)?.as_group()
    }

    pub fn geometry_at(&self, path: &DataPath) -> Option<&super::object::GeometryData> {
        self.get(path)?.as_geometry()
    }

    pub fn scalar_at(&self, path: &DataPath) -> Option<ScalarValue> {
        self.get(path)?.as_scalar()
    }

    pub fn neighbor_list_at(&self, path: &DataPath) -> Option<&super::AnyNeighborList> {
        self.get(path)?.as_neighbor_list()
    }

    pub fn neighbor_list_at_mut(&mut self, path: &DataPath) -> Option<&mut super::AnyNeighborList> {
        self.get_mut(path)?.as_neighbor_list_mut()
    }

    pub fn string_array_at(&self, path: &DataPath) -> Option<&super::StringArray> {
        self.get(path)?.as_string_array()
    }

    /// Reconstruct the path of a live node, following first-parent links.
    pub fn path_of(&self, id: DataId) -> Option<DataPath> {
        let mut names = Vec::new();
        let mut current = id;
        loop {
            let node = self.nodes.get(&current)?;
            names.push(node.name.clone());
            match node.parents.first() {
                Some(&parent) => current = parent,
                None => break,
            }
        }
        names.reverse();
        DataPath::new(names).ok()
    }

    // ---- mutation -------------------------------------------------------

    /// Insert a new object under `parent_path` (the root path inserts at
    /// top level). Fails on a sibling name collision or a non-container
    /// parent. Returns the assigned id.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        object: DataObject,
        parent_path: &DataPath,
    ) -> Result<DataId, StructureError> {
        let name = name.into();
        // Validates the name (non-empty, no separator).
        parent_path.child(&name)?;

        let parent_id = if parent_path.is_root() {
            None
        } else {
            let id = self
                .id_at(parent_path)
                .ok_or_else(|| StructureError::ParentNotFound {
                    path: parent_path.clone(),
                })?;
            if !self.nodes[&id].object.is_container() {
                return Err(StructureError::NotAContainer {
                    path: parent_path.clone(),
                });
            }
            Some(id)
        };

        let occupied = match parent_id {
            Some(id) => self.nodes[&id]
                .object
                .children()
                .is_some_and(|c| c.contains_name(&name)),
            None => self.root.contains_name(&name),
        };
        if occupied {
            return Err(StructureError::Occupied {
                path: parent_path.child(&name)?,
            });
        }

        let id = self.alloc_id();
        let parents = parent_id.into_iter().collect();
        trace!(?id, name = %name, parent = %parent_path, "insert object");
        self.nodes.insert(
            id,
            DataNode {
                id,
                name: name.clone(),
                parents,
                object,
            },
        );
        match parent_id {
            Some(pid) => {
                if let Some(children) = self
                    .nodes
                    .get_mut(&pid)
                    .and_then(|n| n.object.children_mut())
                {
                    children.insert(name, id);
                }
            }
            None => {
                self.root.insert(name, id);
            }
        }
        Ok(id)
    }

    /// Unlink the object at `path` from that parent. The object (and any
    /// exclusively-owned descendants) is destroyed only when no other
    /// parent link remains.
    pub fn remove(&mut self, path: &DataPath) -> Result<(), StructureError> {
        let name = path
            .name()
            .ok_or_else(|| StructureError::NotFound { path: path.clone() })?
            .to_string();
        let parent_path = path.parent().unwrap_or_default();

        let target = if parent_path.is_root() {
            let id = self
                .root
                .get(&name)
                .ok_or_else(|| StructureError::NotFound { path: path.clone() })?;
            self.root.remove(&name);
            id
        } else {
            let parent_id = self
                .id_at(&parent_path)
                .ok_or_else(|| StructureError::NotFound { path: path.clone() })?;
            let children = self
                .nodes
                .get_mut(&parent_id)
                .and_then(|n| n.object.children_mut())
                .ok_or_else(|| StructureError::NotFound { path: path.clone() })?;
            let id = children
                .remove(&name)
                .ok_or_else(|| StructureError::NotFound { path: path.clone() })?;
            if let Some(node) = self.nodes.get_mut(&id) {
                node.parents.retain(|&p| p != parent_id);
            }
            id
        };

        trace!(?target, path = %path, "unlink object");
        if !self.is_referenced(target) {
            self.destroy(target);
        }
        Ok(())
    }

    /// Whether `needle` is `start` itself or one of its ancestors.
    fn reachable_upward(&self, start: DataId, needle: DataId) -> bool {
        let mut stack = vec![start];
        let mut seen: HashSet<DataId> = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == needle {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.parents.iter().copied());
            }
        }
        false
    }

    fn is_referenced(&self, id: DataId) -> bool {
        self.nodes
            .get(&id)
            .map(|n| !n.parents.is_empty())
            .unwrap_or(false)
            || self.root.contains_id(id)
    }

    fn destroy(&mut self, id: DataId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        trace!(?id, name = %node.name, "destroy object");
        if let Some(children) = node.object.children() {
            for &child in children.ids() {
                if let Some(child_node) = self.nodes.get_mut(&child) {
                    child_node.parents.retain(|&p| p != id);
                }
                if !self.is_referenced(child) {
                    self.destroy(child);
                }
            }
        }
    }

    /// Link the object at `target` under an additional parent container.
    /// This is what makes the graph a DAG rather than a tree.
    pub fn add_parent(
        &mut self,
        target: &DataPath,
        new_parent: &DataPath,
    ) -> Result<(), StructureError> {
        let target_id = self
            .id_at(target)
            .ok_or_else(|| StructureError::NotFound {
                path: target.clone(),
            })?;
        let name = self.nodes[&target_id].name.clone();

        if new_parent.is_root() {
            if self.root.contains_name(&name) {
                return Err(StructureError::NameCollision { name });
            }
            self.root.insert(name, target_id);
            return Ok(());
        }

        let parent_id = self
            .id_at(new_parent)
            .ok_or_else(|| StructureError::ParentNotFound {
                path: new_parent.clone(),
            })?;
        // The target must not be an ancestor of its new parent, or the
        // graph stops being a DAG and upward walks never terminate.
        if self.reachable_upward(parent_id, target_id) {
            return Err(StructureError::Cycle {
                path: new_parent.clone(),
            });
        }
        let children = self
            .nodes
            .get_mut(&parent_id)
            .and_then(|n| n.object.children_mut())
            .ok_or_else(|| StructureError::NotAContainer {
                path: new_parent.clone(),
            })?;
        if !children.insert(name.clone(), target_id) {
            return Err(StructureError::NameCollision { name });
        }
        if let Some(node) = self.nodes.get_mut(&target_id) {
            node.parents.push(parent_id);
        }
        Ok(())
    }

    /// Rename the object at `path`, checking sibling collisions under
    /// every parent (the same object may be shared by several groups).
    pub fn rename(
        &mut self,
        path: &DataPath,
        new_name: impl Into<String>,
    ) -> Result<(), StructureError> {
        let new_name = new_name.into();
        DataPath::from_name(&new_name)?;

        let id = self
            .id_at(path)
            .ok_or_else(|| StructureError::NotFound { path: path.clone() })?;
        let old_name = self.nodes[&id].name.clone();
        if old_name == new_name {
            return Ok(());
        }

        let parent_ids = self.nodes[&id].parents.clone();
        for &parent in &parent_ids {
            let collides = self.nodes[&parent]
                .object
                .children()
                .is_some_and(|c| c.contains_name(&new_name));
            if collides {
                return Err(StructureError::NameCollision { name: new_name });
            }
        }
        if self.root.contains_id(id) && self.root.contains_name(&new_name) {
            return Err(StructureError::NameCollision { name: new_name });
        }

        for &parent in &parent_ids {
            if let Some(children) = self
                .nodes
                .get_mut(&parent)
                .and_then(|n| n.object.children_mut())
            {
                children.rename(&old_name, new_name.clone());
            }
        }
        if self.root.contains_id(id) {
            self.root.rename(&old_name, new_name.clone());
        }
        trace!(?id, old = %old_name, new = %new_name, "rename object");
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = new_name;
        }
        Ok(())
    }

    // ---- deep copy / graft ----------------------------------------------

    /// Deep-copy the container at `source` (and every descendant) to
    /// `destination`. All internal id and parent references are rewritten
    /// so the copy is self-contained; geometry path references into the
    /// subtree are rebased onto `destination`, and references escaping the
    /// subtree are reported, never dropped.
    pub fn deep_copy_group(
        &mut self,
        source: &DataPath,
        destination: &DataPath,
    ) -> Result<CopyReport, StructureError> {
        let source_id = self
            .id_at(source)
            .ok_or_else(|| StructureError::NotFound {
                path: source.clone(),
            })?;
        if !self.nodes[&source_id].object.is_container() {
            return Err(StructureError::NotAContainer {
                path: source.clone(),
            });
        }
        let plan = collect_subtree(self, source_id);
        self.instantiate_subtree(plan, destination, source)
    }

    /// Graft a subtree from another structure at `destination`.
    /// `source_root` is the subtree root inside `source`.
    pub fn import_subtree(
        &mut self,
        source: &DataStructure,
        source_root: DataId,
        destination: &DataPath,
    ) -> Result<CopyReport, StructureError> {
        if !source.nodes.contains_key(&source_root) {
            return Err(StructureError::UnknownId(source_root));
        }
        let source_prefix = source
            .path_of(source_root)
            .unwrap_or_else(DataPath::root);
        let plan = collect_subtree(source, source_root);
        self.instantiate_subtree(plan, destination, &source_prefix)
    }

    fn instantiate_subtree(
        &mut self,
        plan: Vec<PlannedNode>,
        destination: &DataPath,
        source_prefix: &DataPath,
    ) -> Result<CopyReport, StructureError> {
        let dest_name = destination
            .name()
            .ok_or_else(|| StructureError::NotFound {
                path: destination.clone(),
            })?
            .to_string();
        let dest_parent = destination.parent().unwrap_or_default();

        let dest_parent_id = if dest_parent.is_root() {
            None
        } else {
            let id = self
                .id_at(&dest_parent)
                .ok_or_else(|| StructureError::ParentNotFound {
                    path: dest_parent.clone(),
                })?;
            if !self.nodes[&id].object.is_container() {
                return Err(StructureError::NotAContainer { path: dest_parent });
            }
            Some(id)
        };
        if self.contains(destination) {
            return Err(StructureError::Occupied {
                path: destination.clone(),
            });
        }

        // Fresh ids for every planned node.
        let mut id_map: HashMap<DataId, DataId> = HashMap::new();
        for planned in &plan {
            id_map.insert(planned.old_id, self.alloc_id());
        }

        let mut external_references = Vec::new();
        let in_subtree: HashSet<DataId> = plan.iter().map(|p| p.old_id).collect();

        for (index, planned) in plan.iter().enumerate() {
            let new_id = id_map[&planned.old_id];
            let is_root = index == 0;
            let name = if is_root {
                dest_name.clone()
            } else {
                planned.name.clone()
            };

            let mut object = planned.object.deep_copy();
            // Rebuild the child index with the mapped ids, same order.
            if let Some(children) = object.children_mut() {
                let mut rebuilt = ChildIndex::new();
                for (child_name, old_child) in &planned.children {
                    rebuilt.insert(child_name.clone(), id_map[old_child]);
                }
                *children = rebuilt;
            }
            // Rebase geometry references into the copy; flag escapes.
            if let DataObject::Geometry(geom) = &mut object {
                for reference in geom.geometry.referenced_paths_mut() {
                    match reference.replace_prefix(source_prefix, destination) {
                        Some(rebased) => *reference = rebased,
                        None => external_references.push(reference.clone()),
                    }
                }
            }

            let parents: Vec<DataId> = if is_root {
                dest_parent_id.into_iter().collect()
            } else {
                planned
                    .parents
                    .iter()
                    .filter(|p| in_subtree.contains(*p))
                    .map(|p| id_map[p])
                    .collect()
            };

            self.nodes.insert(
                new_id,
                DataNode {
                    id: new_id,
                    name,
                    parents,
                    object,
                },
            );
        }

        let root_id = id_map[&plan[0].old_id];
        match dest_parent_id {
            Some(pid) => {
                if let Some(children) = self
                    .nodes
                    .get_mut(&pid)
                    .and_then(|n| n.object.children_mut())
                {
                    children.insert(dest_name, root_id);
                }
            }
            None => {
                self.root.insert(dest_name, root_id);
            }
        }
        trace!(?root_id, dest = %destination, externals = external_references.len(),
               "deep copy subtree");
        Ok(CopyReport {
            root_id,
            external_references,
        })
    }

    // ---- traversal ------------------------------------------------------

    /// All live ids in breadth-first, parent-before-child order. A node
    /// shared by several parents appears once, after its first parent.
    pub fn traverse(&self) -> Vec<DataId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut seen: HashSet<DataId> = HashSet::new();
        let mut queue: VecDeque<DataId> = self.root.ids().iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            if let Some(children) = self.nodes.get(&id).and_then(|n| n.object.children()) {
                queue.extend(children.ids().iter().copied());
            }
        }
        order
    }

    // ---- hooks for IO backends -----------------------------------------

    /// Register a node under an explicit id, linking it to whichever of
    /// its parents already exist. Returns the parent ids that could not be
    /// linked yet; the reader resolves them in its fix-up pass via
    /// [`link_parent`](Self::link_parent).
    pub fn register_node(
        &mut self,
        id: DataId,
        name: impl Into<String>,
        object: DataObject,
        parents: &[DataId],
    ) -> Result<Vec<DataId>, StructureError> {
        let name = name.into();
        DataPath::from_name(&name)?;
        if self.nodes.contains_key(&id) {
            return Err(StructureError::IdInUse(id));
        }

        self.nodes.insert(
            id,
            DataNode {
                id,
                name: name.clone(),
                parents: Vec::new(),
                object,
            },
        );
        self.next_id = self.next_id.max(id.0.saturating_add(1));

        if parents.is_empty() {
            if !self.root.insert(name.clone(), id) {
                self.nodes.remove(&id);
                return Err(StructureError::NameCollision { name });
            }
            return Ok(Vec::new());
        }

        let mut missing = Vec::new();
        for &parent in parents {
            if self.nodes.contains_key(&parent) {
                self.link_parent(id, parent)?;
            } else {
                missing.push(parent);
            }
        }
        Ok(missing)
    }

    /// Add one parent link between two live nodes (IO fix-up pass).
    pub fn link_parent(&mut self, child: DataId, parent: DataId) -> Result<(), StructureError> {
        let name = self
            .nodes
            .get(&child)
            .ok_or(StructureError::UnknownId(child))?
            .name
            .clone();
        let parent_path = self.path_of(parent).unwrap_or_default();
        if self.reachable_upward(parent, child) {
            return Err(StructureError::Cycle { path: parent_path });
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(StructureError::UnknownId(parent))?;
        let children = parent_node
            .object
            .children_mut()
            .ok_or(StructureError::NotAContainer { path: parent_path })?;
        if children.contains_id(child) {
            return Ok(());
        }
        if !children.insert(name.clone(), child) {
            return Err(StructureError::NameCollision { name });
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parents.push(parent);
        }
        Ok(())
    }

    /// Restore a container's child order (IO fix-up pass).
    pub fn reorder_children(&mut self, id: DataId, order: &[DataId]) -> Result<(), StructureError> {
        let node_path = self.path_of(id).unwrap_or_default();
        let children = self
            .nodes
            .get_mut(&id)
            .ok_or(StructureError::UnknownId(id))?
            .object
            .children_mut()
            .ok_or(StructureError::NotAContainer { path: node_path })?;
        children.set_order(order);
        Ok(())
    }

    /// Restore a node's parent link order (IO fix-up pass). Parents not
    /// named in `order` keep their relative position at the end.
    pub fn reorder_parents(&mut self, id: DataId, order: &[DataId]) -> Result<(), StructureError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(StructureError::UnknownId(id))?;
        let mut rest = std::mem::take(&mut node.parents);
        let mut reordered = Vec::with_capacity(rest.len());
        for &parent in order {
            if let Some(pos) = rest.iter().position(|&p| p == parent) {
                reordered.push(rest.remove(pos));
            }
        }
        reordered.extend(rest);
        node.parents = reordered;
        Ok(())
    }

    /// Restore the top-level object order (IO fix-up pass).
    pub fn reorder_root(&mut self, order: &[DataId]) {
        self.root.set_order(order);
    }
}

/// Structural and content equality, ignoring the id allocation cursor.
impl PartialEq for DataStructure {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.root == other.root
    }
}

struct PlannedNode {
    old_id: DataId,
    name: String,
    object: DataObject,
    parents: Vec<DataId>,
    children: Vec<(String, DataId)>,
}

/// Breadth-first subtree snapshot, root first.
fn collect_subtree(source: &DataStructure, root: DataId) -> Vec<PlannedNode> {
    let mut plan = Vec::new();
    let mut seen: HashSet<DataId> = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let Some(node) = source.node(id) else {
            continue;
        };
        let children: Vec<(String, DataId)> = node
            .object
            .children()
            .map(|c| {
                c.ids()
                    .iter()
                    .map(|&child| {
                        let child_name = source
                            .node(child)
                            .map(|n| n.name().to_string())
                            .unwrap_or_default();
                        (child_name, child)
                    })
                    .collect()
            })
            .unwrap_or_default();
        for (_, child) in &children {
            queue.push_back(*child);
        }
        plan.push(PlannedNode {
            old_id: id,
            name: node.name().to_string(),
            object: node.object.clone(),
            parents: node.parents().to_vec(),
            children,
        });
    }
    plan
}
