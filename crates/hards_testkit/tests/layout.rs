//! Tests against the on-disk layout.

use hards_core::{
    CoreError, CHILDREN_DIR, DATAPOINTS_DIR, DATA_FILE, FILES_DIR, MANIFEST_FILE, NODE_FILE,
};
use hards_storage::STAGING_DIR;
use hards_testkit::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::thread;

fn legacy_node(dir: &Path, dataset: bool) {
    fs::create_dir_all(dir.join(FILES_DIR)).unwrap();
    fs::write(dir.join(DATA_FILE), b"{\"legacy\": true}").unwrap();
    if dataset {
        fs::create_dir_all(dir.join(CHILDREN_DIR)).unwrap();
        fs::create_dir_all(dir.join(DATAPOINTS_DIR)).unwrap();
    }
}

#[test]
fn layout_on_disk() {
    let test_db = TestDatabase::file();
    let root = test_db.path().unwrap();

    let a = test_db.create_dataset("a").unwrap();
    let point = a.create_datapoint("p").unwrap();
    point.add_data([("k", json!(1))]).unwrap();

    assert!(root.join(MANIFEST_FILE).is_file());
    let dataset_dir = root.join(CHILDREN_DIR).join("a");
    for file in [NODE_FILE, DATA_FILE] {
        assert!(dataset_dir.join(file).is_file());
    }
    for dir in [CHILDREN_DIR, DATAPOINTS_DIR, FILES_DIR] {
        assert!(dataset_dir.join(dir).is_dir());
    }

    let point_dir = dataset_dir.join(DATAPOINTS_DIR).join("p");
    let data: serde_json::Value =
        serde_json::from_slice(&fs::read(point_dir.join(DATA_FILE)).unwrap()).unwrap();
    assert_eq!(data, json!({"k": 1}));
    assert!(!point_dir.join(CHILDREN_DIR).exists());
}

#[test]
fn staging_area_is_left_empty() {
    let test_db = TestDatabase::file();
    let assets = test_db.temp_dir().unwrap().to_path_buf();
    let source = write_asset(&assets, "f.txt", b"x");

    let a = test_db.create_dataset("a").unwrap();
    a.add_data([("k", json!(1))]).unwrap();
    a.add_file(&source, None).unwrap();
    assert!(a.create_dataset("a/b").is_err());
    assert!(test_db.create_dataset("a").is_err());
    assert!(a.add_file(&assets.join("missing"), None).is_err());

    let staging = test_db.path().unwrap().join(STAGING_DIR);
    assert_eq!(fs::read_dir(staging).unwrap().count(), 0);
}

#[test]
fn siblings_created_through_separate_handles_get_distinct_ordinals() {
    let test_db = TestDatabase::file();
    test_db.create_dataset("parent").unwrap();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let db = test_db.reopen();
            thread::spawn(move || {
                let parent = db.get_dataset("parent").unwrap();
                for j in 0..5 {
                    parent.create_datapoint(&format!("p{i}_{j}")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let points = test_db
        .path()
        .unwrap()
        .join(CHILDREN_DIR)
        .join("parent")
        .join(DATAPOINTS_DIR);
    let mut ordinals: Vec<u64> = fs::read_dir(points)
        .unwrap()
        .map(|entry| {
            let meta: serde_json::Value =
                serde_json::from_slice(&fs::read(entry.unwrap().path().join(NODE_FILE)).unwrap())
                    .unwrap();
            meta["ordinal"].as_u64().unwrap()
        })
        .collect();
    ordinals.sort_unstable();
    assert_eq!(ordinals, (0..30).collect::<Vec<u64>>());
}

#[test]
fn legacy_layout_opens() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("legacy");
    let old = root.join(CHILDREN_DIR).join("old");
    legacy_node(&old, true);
    legacy_node(&old.join(CHILDREN_DIR).join("inner"), true);
    legacy_node(&old.join(DATAPOINTS_DIR).join("b_point"), false);
    legacy_node(&old.join(DATAPOINTS_DIR).join("a_point"), false);

    let db = Database::open(&root).unwrap();
    let old = db.get_dataset("old").unwrap();
    assert_eq!(old.data().unwrap().get("legacy"), Some(&json!(true)));
    assert_eq!(old.datasets().unwrap(), vec!["inner"]);
    assert_eq!(old.datapoints().unwrap(), vec!["a_point", "b_point"]);

    // New siblings sort before unmarked ones
    old.create_datapoint("z_new").unwrap();
    assert_eq!(old.datapoints().unwrap(), vec!["z_new", "a_point", "b_point"]);
    assert_eq!(
        db.recursively_get_dataset("old/inner")
            .unwrap()
            .recursively_get_datapoints()
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn corrupt_data_is_reported_not_repaired() {
    let test_db = TestDatabase::file();
    let a = test_db.create_dataset("a").unwrap();
    let data_file = test_db
        .path()
        .unwrap()
        .join(CHILDREN_DIR)
        .join("a")
        .join(DATA_FILE);
    fs::write(&data_file, b"{ not json").unwrap();

    let err = a.data().unwrap_err();
    assert!(matches!(err, CoreError::CorruptState { .. }));
    assert!(a.add_data([("k", json!(1))]).is_err());
    assert_eq!(fs::read(&data_file).unwrap(), b"{ not json");
}

#[test]
fn incompatible_manifest_is_rejected() {
    let test_db = TestDatabase::file();
    let manifest = test_db.path().unwrap().join(MANIFEST_FILE);
    fs::write(
        &manifest,
        serde_json::to_vec(&json!({"format_version": [9, 0], "created_at_ms": 0})).unwrap(),
    )
    .unwrap();

    let err = Database::open(&test_db.path().unwrap()).unwrap_err();
    assert!(matches!(err, CoreError::CorruptState { .. }));
}
