//! File-level round trips through the registered binary format.

mod common;

use anyhow::Result;
use common::builders::StructureBuilder;
use common::path;
use strata_core::graph::{AnyNeighborList, DataObject};
use strata_core::io::{self, BINARY_FORMAT_NAME};
use strata_core::{AnyStore, ScalarType, ScalarValue};

#[test]
fn test_write_read_file_round_trip() -> Result<()> {
    common::init_tracing();
    let mut ds = StructureBuilder::new()
        .image_geometry("Geometry", [2, 2, 2])
        .attribute_matrix("Geometry/CellData", vec![8])
        .f32_array(
            "Geometry/CellData/Density",
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )
        .strings("Geometry/CellData/PhaseNames", &["austenite", "ferrite"])
        .scalar("Iterations", ScalarValue::U64(12))
        .build();

    let mut neighbors = AnyNeighborList::new(ScalarType::I32, 8)?;
    neighbors.as_i32_mut().unwrap().set_list(0, vec![1, 2, 4])?;
    neighbors.as_i32_mut().unwrap().set_list(7, vec![3])?;
    ds.insert(
        "Neighbors",
        DataObject::NeighborList(neighbors),
        &path("Geometry/CellData"),
    )?;

    let dir = tempfile::tempdir()?;
    let file = dir.path().join("run.sbf");
    io::write_file(BINARY_FORMAT_NAME, &ds, &file)?;

    let report = io::read_file(BINARY_FORMAT_NAME, &file)?;
    assert!(report.is_clean());
    assert_eq!(report.structure, ds);

    // Spot-check content and identity, not just equality.
    let back = report.structure;
    assert_eq!(
        back.id_at(&path("Geometry/CellData/Density")),
        ds.id_at(&path("Geometry/CellData/Density"))
    );
    let lists = back.neighbor_list_at(&path("Geometry/CellData/Neighbors")).unwrap();
    assert_eq!(lists.as_i32().unwrap().list(0), Some(&[1, 2, 4][..]));
    Ok(())
}

#[test]
fn test_placeholders_round_trip_without_payload() -> Result<()> {
    let mut ds = StructureBuilder::new().group("Planned").build();
    ds.insert(
        "Future",
        DataObject::Array(AnyStore::empty(ScalarType::F64, vec![1_000_000], vec![3])),
        &path("Planned"),
    )?;

    let dir = tempfile::tempdir()?;
    let file = dir.path().join("planned.sbf");
    io::write_file(BINARY_FORMAT_NAME, &ds, &file)?;

    // A million-tuple placeholder serializes to a tiny file.
    assert!(std::fs::metadata(&file)?.len() < 1024);

    let report = io::read_file(BINARY_FORMAT_NAME, &file)?;
    let back = report.structure.array_at(&path("Planned/Future")).unwrap();
    assert!(back.is_placeholder());
    assert_eq!(back.num_tuples(), 1_000_000);
    Ok(())
}

#[test]
fn test_new_ids_continue_after_read() -> Result<()> {
    let ds = StructureBuilder::new().group("a").group("b").build();
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("ids.sbf");
    io::write_file(BINARY_FORMAT_NAME, &ds, &file)?;

    let mut back = io::read_file(BINARY_FORMAT_NAME, &file)?.structure;
    let fresh = back.insert(
        "c",
        DataObject::Scalar(ScalarValue::U8(1)),
        &strata_core::DataPath::root(),
    )?;
    // The reader bumped the id cursor past every id in the file.
    assert!(!ds.root_ids().contains(&fresh));
    Ok(())
}

#[test]
fn test_unknown_format_name_errors() {
    let ds = StructureBuilder::new().group("g").build();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("x.sbf");
    let err = io::write_file("no-such-format", &ds, &file).unwrap_err();
    assert_eq!(err.code(), -200);
    assert!(io::formats().contains(&BINARY_FORMAT_NAME));
}
