//! The bundled binary container format.
//!
//! Layout:
//! - 4-byte magic `SBF1`, then a little-endian `u32` container version.
//! - A `u32`-length-prefixed JSON file header (format name, write
//!   timestamp, node count, top-level order).
//! - One record per node, in parent-before-child order: a `u32`-length-
//!   prefixed JSON [`NodeHeader`], then a `u64`-length-prefixed payload.
//!
//! Headers are JSON so unknown node types can still be framed and
//! skipped; payloads are raw native-order element bytes for bulk arrays.

use super::{
    FormatIoManager, IoError, IoStrategy, NodeHeader, ReadReport, SkippedNode,
};
use crate::graph::{
    AnyNeighborList, DataId, DataObject, DataStructure, GeometryData, Geometry, GroupData,
    GroupKind, StringArray, StructureError,
};
use crate::store::{AnyStore, StoreKind};
use crate::types::{ScalarType, ScalarValue};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use tracing::{debug, warn};

pub const FORMAT_NAME: &str = "strata-binary";

const MAGIC: [u8; 4] = *b"SBF1";
const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct FileHeader {
    format: String,
    version: u32,
    written_at: String,
    node_count: u64,
    root_order: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupMeta {
    /// `Some` for attribute matrices, `None` for plain groups.
    tuple_shape: Option<Vec<usize>>,
    child_order: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeometryMeta {
    geometry: Geometry,
    child_order: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArrayMeta {
    element_type: ScalarType,
    tuple_shape: Vec<usize>,
    component_shape: Vec<usize>,
    chunk_shape: Option<Vec<usize>>,
    store_kind: StoreKind,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScalarMeta {
    value: ScalarValue,
}

#[derive(Debug, Serialize, Deserialize)]
struct NeighborListMeta {
    element_type: ScalarType,
    num_tuples: usize,
    placeholder: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct StringArrayMeta {
    num_tuples: usize,
}

fn invalid_data(message: impl Into<String>) -> IoError {
    IoError::File(std::io::Error::new(ErrorKind::InvalidData, message.into()))
}

fn child_order(children: &crate::graph::ChildIndex) -> Vec<u64> {
    children.ids().iter().map(|id| id.0).collect()
}

// ---- per-type strategies ------------------------------------------------

struct GroupIo;

impl IoStrategy for GroupIo {
    fn type_tags(&self) -> &'static [&'static str] {
        &["DataGroup", "AttributeMatrix"]
    }

    fn write_data(&self, object: &DataObject) -> Result<(serde_json::Value, Vec<u8>), IoError> {
        let group = object
            .as_group()
            .ok_or_else(|| invalid_data("group strategy applied to a non-group"))?;
        let meta = GroupMeta {
            tuple_shape: match &group.kind {
                GroupKind::Generic => None,
                GroupKind::AttributeMatrix { tuple_shape } => Some(tuple_shape.clone()),
            },
            child_order: child_order(&group.children),
        };
        Ok((serde_json::to_value(meta)?, Vec::new()))
    }

    fn read_data(&self, header: &NodeHeader, _payload: &[u8]) -> Result<DataObject, IoError> {
        let meta: GroupMeta = serde_json::from_value(header.meta.clone())?;
        let group = match meta.tuple_shape {
            Some(tuple_shape) => GroupData::attribute_matrix(tuple_shape),
            None => GroupData::generic(),
        };
        Ok(DataObject::Group(group))
    }
}

struct GeometryIo;

impl IoStrategy for GeometryIo {
    fn type_tags(&self) -> &'static [&'static str] {
        &[
            "ImageGeom",
            "VertexGeom",
            "EdgeGeom",
            "TriangleGeom",
            "QuadGeom",
            "TetrahedralGeom",
            "HexahedralGeom",
        ]
    }

    fn write_data(&self, object: &DataObject) -> Result<(serde_json::Value, Vec<u8>), IoError> {
        let data = object
            .as_geometry()
            .ok_or_else(|| invalid_data("geometry strategy applied to a non-geometry"))?;
        let meta = GeometryMeta {
            geometry: data.geometry.clone(),
            child_order: child_order(&data.children),
        };
        Ok((serde_json::to_value(meta)?, Vec::new()))
    }

    fn read_data(&self, header: &NodeHeader, _payload: &[u8]) -> Result<DataObject, IoError> {
        let meta: GeometryMeta = serde_json::from_value(header.meta.clone())?;
        Ok(DataObject::Geometry(GeometryData::new(meta.geometry)))
    }
}

struct ArrayIo;

impl IoStrategy for ArrayIo {
    fn type_tags(&self) -> &'static [&'static str] {
        &["DataArray"]
    }

    fn write_data(&self, object: &DataObject) -> Result<(serde_json::Value, Vec<u8>), IoError> {
        let store = object
            .as_array()
            .ok_or_else(|| invalid_data("array strategy applied to a non-array"))?;
        let meta = ArrayMeta {
            element_type: store.scalar_type(),
            tuple_shape: store.tuple_shape().to_vec(),
            component_shape: store.component_shape().to_vec(),
            chunk_shape: store.chunk_shape().map(<[usize]>::to_vec),
            store_kind: store.kind(),
        };
        let mut payload = Vec::new();
        if !store.is_placeholder() {
            store.write_binary(&mut payload)?;
        }
        Ok((serde_json::to_value(meta)?, payload))
    }

    fn read_data(&self, header: &NodeHeader, payload: &[u8]) -> Result<DataObject, IoError> {
        let meta: ArrayMeta = serde_json::from_value(header.meta.clone())?;
        let mut store = match meta.store_kind {
            StoreKind::Empty => {
                AnyStore::empty(meta.element_type, meta.tuple_shape, meta.component_shape)
            }
            StoreKind::InMemory => AnyStore::read_binary(
                meta.element_type,
                meta.tuple_shape,
                meta.component_shape,
                payload,
            )?,
        };
        store.set_chunk_shape(meta.chunk_shape);
        Ok(DataObject::Array(store))
    }
}

struct ScalarIo;

impl IoStrategy for ScalarIo {
    fn type_tags(&self) -> &'static [&'static str] {
        &["ScalarData"]
    }

    fn write_data(&self, object: &DataObject) -> Result<(serde_json::Value, Vec<u8>), IoError> {
        let value = object
            .as_scalar()
            .ok_or_else(|| invalid_data("scalar strategy applied to a non-scalar"))?;
        Ok((serde_json::to_value(ScalarMeta { value })?, Vec::new()))
    }

    fn read_data(&self, header: &NodeHeader, _payload: &[u8]) -> Result<DataObject, IoError> {
        let meta: ScalarMeta = serde_json::from_value(header.meta.clone())?;
        Ok(DataObject::Scalar(meta.value))
    }
}

struct NeighborListIo;

impl IoStrategy for NeighborListIo {
    fn type_tags(&self) -> &'static [&'static str] {
        &["NeighborList"]
    }

    fn write_data(&self, object: &DataObject) -> Result<(serde_json::Value, Vec<u8>), IoError> {
        let lists = object
            .as_neighbor_list()
            .ok_or_else(|| invalid_data("neighbor list strategy applied to a non-list"))?;
        let meta = NeighborListMeta {
            element_type: lists.scalar_type(),
            num_tuples: lists.num_tuples(),
            placeholder: lists.is_placeholder(),
        };
        let mut payload = Vec::new();
        if !lists.is_placeholder() {
            lists.write_binary(&mut payload);
        }
        Ok((serde_json::to_value(meta)?, payload))
    }

    fn read_data(&self, header: &NodeHeader, payload: &[u8]) -> Result<DataObject, IoError> {
        let meta: NeighborListMeta = serde_json::from_value(header.meta.clone())?;
        let lists = if meta.placeholder {
            AnyNeighborList::placeholder(meta.element_type, meta.num_tuples)?
        } else {
            AnyNeighborList::read_binary(meta.element_type, meta.num_tuples, payload)?
        };
        Ok(DataObject::NeighborList(lists))
    }
}

struct StringArrayIo;

impl IoStrategy for StringArrayIo {
    fn type_tags(&self) -> &'static [&'static str] {
        &["StringArray"]
    }

    fn write_data(&self, object: &DataObject) -> Result<(serde_json::Value, Vec<u8>), IoError> {
        let strings = object
            .as_string_array()
            .ok_or_else(|| invalid_data("string strategy applied to a non-string-array"))?;
        let meta = StringArrayMeta {
            num_tuples: strings.num_tuples(),
        };
        let payload = serde_json::to_vec(strings.values())?;
        Ok((serde_json::to_value(meta)?, payload))
    }

    fn read_data(&self, header: &NodeHeader, payload: &[u8]) -> Result<DataObject, IoError> {
        let meta: StringArrayMeta = serde_json::from_value(header.meta.clone())?;
        let values: Vec<String> = serde_json::from_slice(payload)?;
        if values.len() != meta.num_tuples {
            return Err(invalid_data(format!(
                "string array declares {} tuples but payload holds {}",
                meta.num_tuples,
                values.len()
            )));
        }
        Ok(DataObject::StringArray(StringArray::from_values(values)))
    }
}

// ---- the manager --------------------------------------------------------

/// IO manager for the bundled binary container.
pub struct BinaryIoManager {
    strategies: HashMap<&'static str, Arc<dyn IoStrategy>>,
}

impl Default for BinaryIoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryIoManager {
    pub fn new() -> Self {
        let list: Vec<Arc<dyn IoStrategy>> = vec![
            Arc::new(GroupIo),
            Arc::new(GeometryIo),
            Arc::new(ArrayIo),
            Arc::new(ScalarIo),
            Arc::new(NeighborListIo),
            Arc::new(StringArrayIo),
        ];
        let mut strategies = HashMap::new();
        for strategy in list {
            for &tag in strategy.type_tags() {
                strategies.insert(tag, Arc::clone(&strategy));
            }
        }
        Self { strategies }
    }
}

impl FormatIoManager for BinaryIoManager {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn strategy_for(&self, type_tag: &str) -> Option<&dyn IoStrategy> {
        self.strategies.get(type_tag).map(Arc::as_ref)
    }

    fn write_structure(
        &self,
        structure: &DataStructure,
        writer: &mut dyn Write,
    ) -> Result<(), IoError> {
        let order = structure.traverse();
        let file_header = FileHeader {
            format: FORMAT_NAME.to_string(),
            version: VERSION,
            written_at: Utc::now().to_rfc3339(),
            node_count: order.len() as u64,
            root_order: structure.root_ids().iter().map(|id| id.0).collect(),
        };

        writer.write_all(&MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        write_json_block(writer, &file_header)?;

        for id in order {
            let node = match structure.node(id) {
                Some(node) => node,
                None => continue,
            };
            let tag = node.object.type_tag();
            let strategy = self
                .strategy_for(tag)
                .ok_or_else(|| invalid_data(format!("no write strategy for type {tag:?}")))?;
            let (meta, payload) = strategy.write_data(&node.object)?;
            let header = NodeHeader {
                id: id.0,
                parent_ids: node.parents().iter().map(|p| p.0).collect(),
                type_tag: tag.to_string(),
                name: node.name().to_string(),
                meta,
            };
            write_json_block(writer, &header)?;
            writer.write_all(&(payload.len() as u64).to_le_bytes())?;
            writer.write_all(&payload)?;
        }
        debug!(nodes = file_header.node_count, "wrote binary container");
        Ok(())
    }

    fn read_structure(&self, reader: &mut dyn Read) -> Result<ReadReport, IoError> {
        let mut magic = [0u8; 4];
        read_exact(reader, &mut magic, "magic")?;
        if magic != MAGIC {
            return Err(IoError::BadMagic);
        }
        let version = read_u32(reader, "version")?;
        if version != VERSION {
            return Err(IoError::UnsupportedVersion(version));
        }
        let file_header: FileHeader = read_json_block(reader, "file header")?;

        let mut structure = DataStructure::new();
        let mut skipped = Vec::new();
        let mut skipped_ids: HashSet<u64> = HashSet::new();
        let mut warnings = Vec::new();
        // Children registered before a later parent; resolved after the loop.
        let mut pending: Vec<(DataId, Vec<DataId>)> = Vec::new();
        let mut child_orders: Vec<(DataId, Vec<DataId>)> = Vec::new();
        // Declared parent link order for shared nodes. The fix-up pass
        // appends late-linked parents, so the order is restored afterward.
        let mut parent_orders: Vec<(DataId, Vec<DataId>)> = Vec::new();

        for _ in 0..file_header.node_count {
            let header: NodeHeader = read_json_block(reader, "node header")?;
            let payload_len = read_u64(reader, "payload length")? as usize;
            let mut payload = vec![0u8; payload_len];
            read_exact(reader, &mut payload, "payload")?;

            let Some(strategy) = self.strategy_for(&header.type_tag) else {
                warn!(id = header.id, tag = %header.type_tag, name = %header.name,
                      "skipping node with unknown type tag");
                skipped_ids.insert(header.id);
                skipped.push(SkippedNode {
                    id: header.id,
                    type_tag: header.type_tag,
                    name: header.name,
                });
                continue;
            };

            // A node all of whose parents were skipped is unreachable:
            // skip it too rather than leave a floating object.
            let parents: Vec<DataId> = header
                .parent_ids
                .iter()
                .copied()
                .filter(|p| !skipped_ids.contains(p))
                .map(DataId)
                .collect();
            if !header.parent_ids.is_empty() && parents.is_empty() {
                warnings.push(format!(
                    "skipped {:?} ({}): every parent was skipped",
                    header.name, header.id
                ));
                skipped_ids.insert(header.id);
                skipped.push(SkippedNode {
                    id: header.id,
                    type_tag: header.type_tag,
                    name: header.name,
                });
                continue;
            }
            if parents.len() != header.parent_ids.len() {
                warnings.push(format!(
                    "dropped links from {:?} ({}) to skipped parents",
                    header.name, header.id
                ));
            }

            let object = strategy.read_data(&header, &payload)?;
            let id = DataId(header.id);
            if structure.node(id).is_some() {
                return Err(IoError::DuplicateId(id));
            }
            if let Some(children) = object.children() {
                debug_assert!(children.is_empty());
                let order: Vec<DataId> = meta_child_order(&header)?
                    .into_iter()
                    .map(DataId)
                    .collect();
                child_orders.push((id, order));
            }
            if parents.len() > 1 {
                parent_orders.push((id, parents.clone()));
            }
            let missing = structure.register_node(id, header.name, object, &parents)?;
            if !missing.is_empty() {
                pending.push((id, missing));
            }
        }

        // Fix-up pass: second and later parents appear in the file after
        // the child; link them now that every node is registered.
        for (child, missing) in pending {
            for parent in missing {
                match structure.link_parent(child, parent) {
                    Ok(()) => {}
                    Err(StructureError::UnknownId(_)) => {
                        warnings.push(format!(
                            "node {} references parent {} absent from the file",
                            child.0, parent.0
                        ));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        for (id, order) in parent_orders {
            structure.reorder_parents(id, &order)?;
        }
        for (id, order) in child_orders {
            structure.reorder_children(id, &order)?;
        }
        let root_order: Vec<DataId> = file_header.root_order.iter().map(|&p| DataId(p)).collect();
        structure.reorder_root(&root_order);

        debug!(
            nodes = structure.len(),
            skipped = skipped.len(),
            "read binary container"
        );
        Ok(ReadReport {
            structure,
            skipped,
            warnings,
        })
    }
}

fn meta_child_order(header: &NodeHeader) -> Result<Vec<u64>, IoError> {
    #[derive(Deserialize)]
    struct OrderOnly {
        child_order: Vec<u64>,
    }
    let order: OrderOnly = serde_json::from_value(header.meta.clone())?;
    Ok(order.child_order)
}

// ---- framing helpers ----------------------------------------------------

fn read_exact(reader: &mut dyn Read, buf: &mut [u8], what: &'static str) -> Result<(), IoError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            IoError::Truncated { what }
        } else {
            IoError::File(e)
        }
    })
}

fn read_u32(reader: &mut dyn Read, what: &'static str) -> Result<u32, IoError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, what)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(reader: &mut dyn Read, what: &'static str) -> Result<u64, IoError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, what)?;
    Ok(u64::from_le_bytes(buf))
}

fn write_json_block<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), IoError> {
    let bytes = serde_json::to_vec(value)?;
    writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&bytes)?;
    Ok(())
}

fn read_json_block<T: for<'de> Deserialize<'de>>(
    reader: &mut dyn Read,
    what: &'static str,
) -> Result<T, IoError> {
    let len = read_u32(reader, what)? as usize;
    let mut bytes = vec![0u8; len];
    read_exact(reader, &mut bytes, what)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::DataPath;

    fn path(s: &str) -> DataPath {
        s.parse().unwrap()
    }

    fn round_trip(structure: &DataStructure) -> ReadReport {
        let manager = BinaryIoManager::new();
        let mut bytes = Vec::new();
        manager.write_structure(structure, &mut bytes).unwrap();
        manager.read_structure(&mut bytes.as_slice()).unwrap()
    }

    #[test]
    fn test_create_empty_store_allocates_placeholder() {
        let manager = BinaryIoManager::new();
        let store = manager.create_empty_store(crate::types::ScalarType::F64, vec![4, 4], vec![3]);
        assert!(store.is_placeholder());
        assert_eq!(store.scalar_type(), crate::types::ScalarType::F64);
        assert_eq!(store.tuple_shape(), &[4, 4]);
        assert_eq!(store.component_shape(), &[3]);
        assert_eq!(store.len(), 48);
    }

    fn sample_structure() -> DataStructure {
        let mut ds = DataStructure::new();
        ds.insert(
            "Geometry",
            DataObject::Geometry(GeometryData::new(Geometry::Image {
                dimensions: [2, 2, 2],
                spacing: [1.0, 1.0, 1.0],
                origin: [0.0, 0.0, 0.0],
            })),
            &DataPath::root(),
        )
        .unwrap();
        ds.insert(
            "CellData",
            DataObject::Group(GroupData::attribute_matrix(vec![8])),
            &path("Geometry"),
        )
        .unwrap();
        let mut store = AnyStore::new(ScalarType::F32, vec![8], vec![1]);
        for tuple in 0..8 {
            store.as_f32_mut().unwrap().set(tuple, 0, tuple as f32).unwrap();
        }
        ds.insert("Density", DataObject::Array(store), &path("Geometry/CellData"))
            .unwrap();
        ds.insert(
            "Label",
            DataObject::Scalar(ScalarValue::I64(-3)),
            &DataPath::root(),
        )
        .unwrap();
        ds
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let ds = sample_structure();
        let report = round_trip(&ds);
        assert!(report.is_clean());
        assert_eq!(report.structure, ds);
        assert_eq!(
            report
                .structure
                .array_at(&path("Geometry/CellData/Density"))
                .unwrap()
                .value_as_f64(5, 0),
            Some(5.0)
        );
    }

    #[test]
    fn test_round_trip_preserves_ids_and_order() {
        let mut ds = DataStructure::new();
        for name in ["c", "a", "b"] {
            ds.insert(name, DataObject::Group(GroupData::generic()), &DataPath::root())
                .unwrap();
        }
        let ids: Vec<DataId> = ds.root_ids().to_vec();
        let report = round_trip(&ds);
        assert_eq!(report.structure.root_ids(), &ids[..]);
        assert_eq!(report.structure.id_at(&path("a")), ds.id_at(&path("a")));
    }

    #[test]
    fn test_round_trip_placeholder_and_lists() {
        let mut ds = DataStructure::new();
        ds.insert(
            "Planned",
            DataObject::Array(AnyStore::empty(ScalarType::U16, vec![4], vec![3])),
            &DataPath::root(),
        )
        .unwrap();
        let mut lists = AnyNeighborList::new(ScalarType::I32, 3).unwrap();
        lists.as_i32_mut().unwrap().set_list(1, vec![7, -2]).unwrap();
        ds.insert("Neighbors", DataObject::NeighborList(lists), &DataPath::root())
            .unwrap();
        ds.insert(
            "PlannedNeighbors",
            DataObject::NeighborList(
                AnyNeighborList::placeholder(ScalarType::U64, 12).unwrap(),
            ),
            &DataPath::root(),
        )
        .unwrap();
        ds.insert(
            "Phases",
            DataObject::StringArray(StringArray::from_values(vec![
                "austenite".into(),
                "ferrite".into(),
            ])),
            &DataPath::root(),
        )
        .unwrap();

        let report = round_trip(&ds);
        assert!(report.is_clean());
        assert_eq!(report.structure, ds);
        assert!(report
            .structure
            .array_at(&path("Planned"))
            .unwrap()
            .is_placeholder());
        assert!(report
            .structure
            .neighbor_list_at(&path("PlannedNeighbors"))
            .unwrap()
            .is_placeholder());
    }

    #[test]
    fn test_round_trip_shared_child() {
        let mut ds = DataStructure::new();
        ds.insert("A", DataObject::Group(GroupData::generic()), &DataPath::root())
            .unwrap();
        ds.insert("B", DataObject::Group(GroupData::generic()), &DataPath::root())
            .unwrap();
        ds.insert(
            "shared",
            DataObject::Scalar(ScalarValue::F64(2.5)),
            &path("A"),
        )
        .unwrap();
        ds.add_parent(&path("A/shared"), &path("B")).unwrap();

        let report = round_trip(&ds);
        assert!(report.is_clean());
        assert_eq!(report.structure, ds);
        let shared = report.structure.id_at(&path("A/shared")).unwrap();
        assert_eq!(report.structure.id_at(&path("B/shared")), Some(shared));
    }

    #[test]
    fn test_round_trip_preserves_parent_link_order() {
        // The shared node's first parent sits deeper than its second, so
        // the writer emits the node before that parent and the reader can
        // only link it in the fix-up pass.
        let mut ds = DataStructure::new();
        ds.insert("B", DataObject::Group(GroupData::generic()), &DataPath::root())
            .unwrap();
        ds.insert("A1", DataObject::Group(GroupData::generic()), &DataPath::root())
            .unwrap();
        ds.insert("A2", DataObject::Group(GroupData::generic()), &path("A1"))
            .unwrap();
        let x = ds
            .insert(
                "x",
                DataObject::Scalar(ScalarValue::U32(1)),
                &path("A1/A2"),
            )
            .unwrap();
        ds.add_parent(&path("A1/A2/x"), &path("B")).unwrap();
        let declared = ds.node(x).unwrap().parents().to_vec();

        let report = round_trip(&ds);
        assert!(report.is_clean());
        assert_eq!(report.structure.node(x).unwrap().parents(), &declared[..]);
        assert_eq!(report.structure, ds);
    }

    /// Replace every occurrence of `needle`, which must have the same
    /// length as `replacement` so the framing stays valid.
    fn patch_bytes(bytes: &mut [u8], needle: &[u8], replacement: &[u8]) {
        assert_eq!(needle.len(), replacement.len());
        for start in 0..bytes.len().saturating_sub(needle.len() - 1) {
            if &bytes[start..start + needle.len()] == needle {
                bytes[start..start + needle.len()].copy_from_slice(replacement);
            }
        }
    }

    #[test]
    fn test_unknown_tag_is_skipped_with_children() {
        let ds = sample_structure();
        let manager = BinaryIoManager::new();
        let mut bytes = Vec::new();
        manager.write_structure(&ds, &mut bytes).unwrap();

        // Rewrite the geometry node's tag to something no strategy claims.
        patch_bytes(&mut bytes, b"\"ImageGeom\"", b"\"OtherGeom\"");
        let report = manager.read_structure(&mut bytes.as_slice()).unwrap();

        assert_eq!(report.skipped.len(), 3); // geometry + its two descendants
        assert_eq!(report.skipped[0].type_tag, "OtherGeom");
        assert!(!report.structure.contains(&path("Geometry")));
        assert_eq!(report.structure.scalar_at(&path("Label")), Some(ScalarValue::I64(-3)));
    }

    #[test]
    fn test_bad_magic_and_truncation() {
        let manager = BinaryIoManager::new();
        let err = manager.read_structure(&mut &b"NOPE"[..]).unwrap_err();
        assert_eq!(err.code(), -203);

        let mut bytes = Vec::new();
        manager.write_structure(&sample_structure(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 5);
        let err = manager.read_structure(&mut bytes.as_slice()).unwrap_err();
        assert_eq!(err.code(), -201);
    }

    #[test]
    fn test_child_order_survives_removal_gaps() {
        let mut ds = DataStructure::new();
        ds.insert("G", DataObject::Group(GroupData::generic()), &DataPath::root())
            .unwrap();
        for name in ["z", "m", "a"] {
            ds.insert(name, DataObject::Scalar(ScalarValue::U8(0)), &path("G"))
                .unwrap();
        }
        ds.remove(&path("G/m")).unwrap();

        let report = round_trip(&ds);
        let group = report.structure.group_at(&path("G")).unwrap();
        let names: Vec<_> = group
            .children
            .ids()
            .iter()
            .map(|&id| report.structure.node(id).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["z", "a"]);
    }
}
