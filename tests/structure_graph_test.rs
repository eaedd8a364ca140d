//! Graph-level behavior: resolution, sharing, renames, deep copies.

mod common;

use common::builders::StructureBuilder;
use common::path;
use strata_core::graph::{DataObject, GroupData, StructureError};
use strata_core::{DataPath, ScalarValue};

#[test]
fn test_path_resolution_and_typed_accessors() {
    common::init_tracing();
    let ds = StructureBuilder::new()
        .group("Scan")
        .attribute_matrix("Scan/CellData", vec![4])
        .f32_array("Scan/CellData/Confidence", &[0.1, 0.2, 0.3, 0.4])
        .scalar("Scan/Threshold", ScalarValue::F64(0.25))
        .build();

    assert_eq!(ds.len(), 4);
    let confidence = path("Scan/CellData/Confidence");
    assert!(ds.contains(&confidence));
    // The store holds f32; widening to f64 keeps only f32 precision.
    common::assert_float_eq(
        ds.array_at(&confidence).unwrap().value_as_f64(2, 0).unwrap(),
        0.3,
        1e-6,
    );
    // Wrong-type access answers None, not a panic or error.
    assert!(ds.group_at(&confidence).is_none());
    assert_eq!(
        ds.scalar_at(&path("Scan/Threshold")),
        Some(ScalarValue::F64(0.25))
    );
    assert!(!ds.contains(&path("Scan/CellData/Missing")));
}

#[test]
fn test_shared_object_survives_one_unlink() {
    let mut ds = StructureBuilder::new()
        .group("A")
        .group("B")
        .scalar("A/shared", ScalarValue::U32(7))
        .build();
    ds.add_parent(&path("A/shared"), &path("B")).unwrap();
    let id = ds.id_at(&path("A/shared")).unwrap();

    ds.remove(&path("A/shared")).unwrap();
    // Still alive through its other parent, same identity.
    assert_eq!(ds.id_at(&path("B/shared")), Some(id));

    ds.remove(&path("B/shared")).unwrap();
    assert!(ds.node(id).is_none());
}

#[test]
fn test_remove_cascades_to_exclusive_descendants() {
    let mut ds = StructureBuilder::new()
        .group("G")
        .group("G/inner")
        .f32_array("G/inner/values", &[1.0])
        .build();
    let inner = ds.id_at(&path("G/inner")).unwrap();
    let values = ds.id_at(&path("G/inner/values")).unwrap();

    ds.remove(&path("G")).unwrap();
    assert!(ds.is_empty());
    assert!(ds.node(inner).is_none());
    assert!(ds.node(values).is_none());
}

#[test]
fn test_rename_keeps_identity_and_checks_all_parents() {
    let mut ds = StructureBuilder::new()
        .group("A")
        .group("B")
        .scalar("A/x", ScalarValue::I8(1))
        .scalar("B/taken", ScalarValue::I8(2))
        .build();
    ds.add_parent(&path("A/x"), &path("B")).unwrap();
    let id = ds.id_at(&path("A/x")).unwrap();

    // The new name collides under B even though A is free.
    let err = ds.rename(&path("A/x"), "taken").unwrap_err();
    assert!(matches!(err, StructureError::NameCollision { .. }));

    ds.rename(&path("A/x"), "y").unwrap();
    assert_eq!(ds.id_at(&path("A/y")), Some(id));
    assert_eq!(ds.id_at(&path("B/y")), Some(id));
    assert!(!ds.contains(&path("A/x")));
}

#[test]
fn test_deep_copy_is_independent_and_flags_external_refs() {
    let mut ds = StructureBuilder::new()
        .group("Mesh")
        .f32_array("SharedVerts", &[0.0, 1.0, 2.0])
        .group("Mesh/Surface")
        .f32_array("Mesh/Surface/quality", &[0.5])
        .build();
    // A geometry inside the subtree referencing an array outside it.
    let vertices: DataPath = path("SharedVerts");
    let mut builder = StructureBuilder::new().build();
    builder
        .insert(
            "geom",
            DataObject::Geometry(strata_core::graph::GeometryData::new(
                strata_core::graph::Geometry::Vertex { vertices },
            )),
            &DataPath::root(),
        )
        .unwrap();
    let geom_id = builder.id_at(&path("geom")).unwrap();
    ds.import_subtree(&builder, geom_id, &path("Mesh/Surface/geom"))
        .unwrap();

    let report = ds.deep_copy_group(&path("Mesh/Surface"), &path("Copy")).unwrap();
    assert_eq!(report.external_references, vec![path("SharedVerts")]);

    // Mutating the copy leaves the source untouched.
    ds.array_at_mut(&path("Copy/quality"))
        .unwrap()
        .as_f32_mut()
        .unwrap()
        .set(0, 0, 9.0)
        .unwrap();
    common::assert_float_eq(
        ds.array_at(&path("Mesh/Surface/quality"))
            .unwrap()
            .value_as_f64(0, 0)
            .unwrap(),
        0.5,
        1e-9,
    );
}

#[test]
fn test_insert_rejects_bad_parents_and_collisions() {
    let mut ds = StructureBuilder::new()
        .group("G")
        .scalar("G/leaf", ScalarValue::Bool(true))
        .build();

    let err = ds
        .insert("x", DataObject::Group(GroupData::generic()), &path("G/leaf"))
        .unwrap_err();
    assert!(matches!(err, StructureError::NotAContainer { .. }));

    let err = ds
        .insert("x", DataObject::Group(GroupData::generic()), &path("Nope"))
        .unwrap_err();
    assert!(matches!(err, StructureError::ParentNotFound { .. }));

    let err = ds
        .insert("leaf", DataObject::Group(GroupData::generic()), &path("G"))
        .unwrap_err();
    assert_eq!(err.code(), -100);
}

#[test]
fn test_ids_are_never_reused() {
    let mut ds = StructureBuilder::new().group("a").build();
    let first = ds.id_at(&path("a")).unwrap();
    ds.remove(&path("a")).unwrap();
    let second = ds
        .insert("a", DataObject::Group(GroupData::generic()), &DataPath::root())
        .unwrap();
    assert_ne!(first, second);
}
