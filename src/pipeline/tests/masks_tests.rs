//! Tests for the mask pipeline.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use ndarray::{Array3, array};
use ndarray_npy::WriteNpyExt;

use super::{DATASET, IMAGE_ID, image_match, store_with_image};
use crate::config::{ExistingShapes, MasksConfig, MasksJob};
use crate::data::LoaderRegistry;
use crate::error::PipelineError;
use crate::model::{AnnotationGroup, MaskShape, PointShape, Shape};
use crate::pipeline::{ImageOutcome, annotate_stack, run_masks_job};
use crate::store::{MemoryStore, RoiRepository};
use crate::template::Template;

fn write_stack(path: &Path, stack: &Array3<u8>) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    stack.write_npy(File::create(path).unwrap()).unwrap();
}

/// Two planes; only the second has foreground.
fn nucleus_stack() -> Array3<u8> {
    array![
        [[0, 0, 0], [0, 0, 0]],
        [[0, 0, 0], [0, 255, 255]],
    ]
}

fn config(root: &Path) -> MasksConfig {
    let mut config = MasksConfig::new(
        vec!["nucleus".into(), "npbs".into()],
        Template::parse("{fov}/{segmentation}.npy").unwrap(),
    );
    config.source_root = root.to_path_buf();
    config
}

fn job() -> MasksJob {
    MasksJob {
        dataset: DATASET.into(),
        image: image_match(),
        vars: BTreeMap::from([("fov".to_string(), "01".to_string())]),
    }
}

fn masks(store: &MemoryStore) -> Vec<MaskShape> {
    store
        .rois_for(IMAGE_ID)
        .iter()
        .flat_map(|r| r.shapes.iter())
        .filter_map(|s| match &s.shape {
            Shape::Mask(m) => Some(m.clone()),
            Shape::Point(_) => None,
        })
        .collect()
}

fn existing_point() -> Shape {
    Shape::Point(PointShape {
        x: 1.0,
        y: 1.0,
        z: 0,
        t: 0,
        label: "1 chr1".into(),
        stroke_color: None,
        fill_color: None,
    })
}

#[test]
fn test_one_roi_per_segmentation() {
    let dir = tempfile::tempdir().unwrap();
    write_stack(&dir.path().join("01/nucleus.npy"), &nucleus_stack());
    write_stack(&dir.path().join("01/npbs.npy"), &Array3::from_elem((2, 2, 3), 1));

    let mut store = store_with_image();
    let outcome =
        run_masks_job(&mut store, &LoaderRegistry::new(), &config(dir.path()), &job()).unwrap();
    assert_eq!(
        outcome,
        ImageOutcome::Completed {
            image_id: IMAGE_ID,
            rois: 2,
            shapes: 3
        }
    );

    let rois = store.rois_for(IMAGE_ID);
    assert_eq!(rois[0].name.as_deref(), Some("nucleus"));
    assert_eq!(rois[1].name.as_deref(), Some("npbs"));

    let masks = masks(&store);
    let nucleus = &masks[0];
    assert_eq!(nucleus.plane_index, 1);
    assert_eq!((nucleus.x0, nucleus.y0), (1, 1));
    assert_eq!((nucleus.width, nucleus.height), (2, 1));
    assert_eq!(nucleus.packed_bits, vec![0b1100_0000]);
    assert_eq!(nucleus.fill_color, config(dir.path()).fill_color);
}

#[test]
fn test_missing_source_fails_without_writes() {
    let dir = tempfile::tempdir().unwrap();
    write_stack(&dir.path().join("01/nucleus.npy"), &nucleus_stack());

    let mut store = store_with_image();
    let err = run_masks_job(&mut store, &LoaderRegistry::new(), &config(dir.path()), &job())
        .unwrap_err();
    match err {
        PipelineError::MissingSource { path } => assert!(path.ends_with("01/npbs.npy")),
        other => panic!("expected missing source, got {:?}", other),
    }
    assert_eq!(store.writes(), 0);
}

#[test]
fn test_allowed_missing_source_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_stack(&dir.path().join("01/nucleus.npy"), &nucleus_stack());
    let config = config(dir.path()).with_allowed_missing(dir.path().join("01/npbs.npy"));

    let mut store = store_with_image();
    let outcome = run_masks_job(&mut store, &LoaderRegistry::new(), &config, &job()).unwrap();
    assert!(matches!(outcome, ImageOutcome::Completed { rois: 1, .. }));
}

#[test]
fn test_existing_shapes_skip_image() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_with_image();
    store
        .save(&AnnotationGroup::new(IMAGE_ID, vec![existing_point()]))
        .unwrap();
    let writes = store.writes();

    // Sources are never looked at for a processed image.
    let outcome =
        run_masks_job(&mut store, &LoaderRegistry::new(), &config(dir.path()), &job()).unwrap();
    assert_eq!(outcome, ImageOutcome::AlreadyProcessed { image_id: IMAGE_ID });
    assert_eq!(store.writes(), writes);
}

#[test]
fn test_replace_masks_keeps_points() {
    let dir = tempfile::tempdir().unwrap();
    write_stack(&dir.path().join("01/nucleus.npy"), &nucleus_stack());
    let config = config(dir.path())
        .with_existing(ExistingShapes::ReplaceMasks)
        .with_allowed_missing(dir.path().join("01/npbs.npy"));

    let mut store = store_with_image();
    store
        .save(&AnnotationGroup::new(IMAGE_ID, vec![existing_point()]))
        .unwrap();

    let loaders = LoaderRegistry::new();
    run_masks_job(&mut store, &loaders, &config, &job()).unwrap();
    run_masks_job(&mut store, &loaders, &config, &job()).unwrap();

    // One point ROI and one mask ROI: the first run's masks were replaced.
    assert_eq!(store.rois_for(IMAGE_ID).len(), 2);
    assert_eq!(store.mask_roi_ids(IMAGE_ID).unwrap().len(), 1);
    assert_eq!(masks(&store).len(), 1);
}

#[test]
fn test_empty_stack_creates_no_roi() {
    let mut store = store_with_image();
    let stack = Array3::<u8>::zeros((3, 4, 4));
    let roi = annotate_stack(&mut store, IMAGE_ID, "lamin", stack.view(), None).unwrap();
    assert!(roi.is_none());
    assert_eq!(store.writes(), 0);
}

#[test]
fn test_single_cell_mask() {
    let mut store = store_with_image();
    let mut stack = Array3::<u8>::zeros((1, 5, 5));
    stack[[0, 3, 2]] = 1;

    let roi = annotate_stack(&mut store, IMAGE_ID, "cenpa", stack.view(), None)
        .unwrap()
        .unwrap();
    match &roi.shapes[0].shape {
        Shape::Mask(m) => {
            assert_eq!((m.x0, m.y0, m.width, m.height), (2, 3, 1, 1));
            assert_eq!(m.packed_bits, vec![0x80]);
            assert_eq!(m.label.as_deref(), Some("cenpa"));
        }
        other => panic!("expected mask, got {:?}", other),
    }
}

#[test]
fn test_unknown_template_field_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.path_template = Template::parse("{well}/{segmentation}.npy").unwrap();

    let mut store = store_with_image();
    let err = run_masks_job(&mut store, &LoaderRegistry::new(), &config, &job()).unwrap_err();
    assert!(matches!(err, PipelineError::Config { .. }));
}

#[test]
fn test_unsupported_source_extension_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("01")).unwrap();
    std::fs::write(dir.path().join("01/nucleus.csv"), "0,1\n1,0\n").unwrap();
    let mut config = config(dir.path());
    config.segmentations = vec!["nucleus".into()];
    config.path_template = Template::parse("{fov}/{segmentation}.csv").unwrap();

    let mut store = store_with_image();
    let err = run_masks_job(&mut store, &LoaderRegistry::new(), &config, &job()).unwrap_err();
    match err {
        PipelineError::Config { message } => assert!(message.contains("npy")),
        other => panic!("expected config error, got {:?}", other),
    }
    assert_eq!(store.writes(), 0);
}

#[test]
fn test_tiff_stack_masks_every_page() {
    use std::io::Cursor;
    use tiff::encoder::{TiffEncoder, colortype};

    let dir = tempfile::tempdir().unwrap();
    let mut bytes = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut bytes).unwrap();
        let mut second = vec![0u8; 6];
        second[4] = 255;
        encoder
            .write_image::<colortype::Gray8>(3, 2, &[0u8; 6])
            .unwrap();
        encoder
            .write_image::<colortype::Gray8>(3, 2, &second)
            .unwrap();
    }
    std::fs::create_dir_all(dir.path().join("01")).unwrap();
    std::fs::write(dir.path().join("01/nucleus.tif"), bytes.into_inner()).unwrap();

    let mut config = config(dir.path());
    config.segmentations = vec!["nucleus".into()];
    config.path_template = Template::parse("{fov}/{segmentation}.tif").unwrap();

    let mut store = store_with_image();
    run_masks_job(&mut store, &LoaderRegistry::new(), &config, &job()).unwrap();

    let masks = masks(&store);
    assert_eq!(masks.len(), 1);
    assert_eq!(masks[0].plane_index, 1);
    assert_eq!((masks[0].x0, masks[0].y0), (1, 1));
}
