//! Tests for configuration-driven batch runs against the file store.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::pipeline::{ImageOutcome, JobKind, run_batch};
use crate::store::{JsonStore, RoiRepository};

const CATALOG: &str = r#"{
    "datasets": [
        {"name": "Embryo_01", "images": [
            {"id": 11, "name": "embryo01_seq",
             "calibration": {"pixel_size_x": 0.1, "pixel_size_y": 0.1, "pixel_size_z": 0.3}}
        ]},
        {"name": "Embryo_02", "images": [
            {"id": 12, "name": "embryo02_seq"}
        ]}
    ]
}"#;

const TABLE: &str = "\
cell_id,chr,x_um_abs,y_um_abs,z_um_abs
3,2,1.0,2.0,0.6
3,1,1.5,2.5,0.9
";

const CONFIG: &str = r#"{
    "version": 1,
    "store": {"catalog": "catalog.json", "output_dir": "out"},
    "points": {
        "mapper": {"convention": {"kind": "calibrated"}},
        "jobs": [
            {"dataset": "Embryo_01", "image": {"exact": "embryo01_seq"}, "table": "embryo01.csv"},
            {"dataset": "Embryo_01", "image": {"exact": "embryo03_seq"}, "table": "embryo01.csv"},
            {"dataset": "Embryo_02", "image": {"contains": "_seq"}, "table": "embryo01.csv"}
        ]
    }
}"#;

fn setup(dir: &Path) -> PipelineConfig {
    std::fs::write(dir.join("catalog.json"), CATALOG).unwrap();
    std::fs::write(dir.join("embryo01.csv"), TABLE).unwrap();
    let config_path = dir.join("config.json");
    std::fs::write(&config_path, CONFIG).unwrap();
    PipelineConfig::load(&config_path).unwrap()
}

fn open(config: &PipelineConfig) -> JsonStore {
    JsonStore::open(&config.store.catalog, &config.store.output_dir).unwrap()
}

#[test]
fn test_batch_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let mut store = open(&config);

    let report = run_batch(&mut store, &config);
    let entries = report.entries();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.kind == JobKind::Points));

    assert!(matches!(
        entries[0].result,
        Ok(ImageOutcome::Completed {
            image_id: 11,
            rois: 2,
            shapes: 2
        })
    ));
    // Unknown image.
    assert_eq!(
        entries[1].result.as_ref().map_err(|e| e.kind()).unwrap_err(),
        "lookup"
    );
    // Image without calibration under the calibrated convention.
    assert_eq!(
        entries[2].result.as_ref().map_err(|e| e.kind()).unwrap_err(),
        "config"
    );
    assert_eq!(report.failed(), 2);
    assert!(report.has_failures());
    assert_eq!(store.shape_count(12).unwrap(), 0);
}

#[test]
fn test_export_file_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let mut store = open(&config);
    run_batch(&mut store, &config);

    let written = std::fs::read_to_string(store.table_path(11)).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines[0],
        "# header cell_id,l,chr,l,x_um_abs,d,y_um_abs,d,z_um_abs,d,roi_id,l,shape_id,l"
    );
    assert_eq!(lines[1], "cell_id,chr,x_um_abs,y_um_abs,z_um_abs,roi_id,shape_id");
    // chr 1 is persisted first, so the second row holds the first ids.
    assert_eq!(lines[2], "3,2,1.0,2.0,0.6,2,2");
    assert_eq!(lines[3], "3,1,1.5,2.5,0.9,1,1");
}

#[test]
fn test_rerun_after_reopen_skips() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    {
        let mut store = open(&config);
        run_batch(&mut store, &config);
    }

    let mut store = open(&config);
    let report = run_batch(&mut store, &config);
    assert!(matches!(
        report.entries()[0].result,
        Ok(ImageOutcome::AlreadyProcessed { image_id: 11 })
    ));
    assert_eq!(store.rois().len(), 2);
}
