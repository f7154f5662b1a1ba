//! Point annotation of one image from one measurement table.

use crate::config::{PointsConfig, PointsJob};
use crate::error::Result;
use crate::grouping::partition;
use crate::model::AnnotationGroup;
use crate::persist;
use crate::pipeline::{ImageOutcome, check_processed};
use crate::shapes::build_points;
use crate::stitch::stitch;
use crate::store::{ImageHandle, NameMatch, Store};
use crate::table::{ExportTable, RecordTable};

/// Run one configured points job, reading its table from disk.
pub fn run_points_job<S>(store: &mut S, config: &PointsConfig, job: &PointsJob) -> Result<ImageOutcome>
where
    S: Store + ?Sized,
{
    let image = store.lookup(&job.dataset, &job.image)?;
    if let Some(outcome) = check_processed(store, &image)? {
        return Ok(outcome);
    }

    log::info!("Reading {:?}", job.table);
    let table = RecordTable::read(&job.table, config.delimiter)?;
    annotate_points(store, config, &image, &table)
}

/// Look up an image and annotate it from an already loaded table.
pub fn process_points<S>(
    store: &mut S,
    config: &PointsConfig,
    dataset: &str,
    image: &NameMatch,
    table: &RecordTable,
) -> Result<ImageOutcome>
where
    S: Store + ?Sized,
{
    let image = store.lookup(dataset, image)?;
    if let Some(outcome) = check_processed(store, &image)? {
        return Ok(outcome);
    }
    annotate_points(store, config, &image, table)
}

/// Create one ROI per group of `table` on `image` and register the export
/// table.
///
/// Every group's shapes are built before anything is persisted, so bad
/// input fails the image without writes. A store failure after the first
/// ROI leaves earlier ROIs in place.
pub fn annotate_points<S>(
    store: &mut S,
    config: &PointsConfig,
    image: &ImageHandle,
    table: &RecordTable,
) -> Result<ImageOutcome>
where
    S: Store + ?Sized,
{
    let mapper = &config.mapper;
    let calibration = Some(&image.calibration);

    table.require_columns(
        mapper
            .columns
            .names()
            .into_iter()
            .chain(config.grouping.columns())
            .chain(config.style.columns()),
    )?;

    let groups = partition(&config.grouping, table.records())?;
    let built = groups
        .iter()
        .map(|group| Ok((group, build_points(group, mapper, calibration, &config.style)?)))
        .collect::<Result<Vec<_>>>()?;

    log::info!(
        "Image {} ('{}'): {} rows in {} groups ({} convention)",
        image.id,
        image.name,
        table.len(),
        groups.len(),
        mapper.convention.name()
    );

    if built.is_empty() {
        log::warn!("Image {}: table has no rows, nothing to do", image.id);
        return Ok(ImageOutcome::Completed {
            image_id: image.id,
            rois: 0,
            shapes: 0,
        });
    }

    let mut rows = Vec::with_capacity(table.len());
    let mut shapes = 0;
    for (group, points) in built {
        let annotation = AnnotationGroup::new(image.id, points);
        let roi = persist::submit(store, &annotation)?;
        persist::verify_planes(mapper, calibration, &group.records, &roi)?;
        log::debug!("Group {} -> ROI {}", group.key, roi.id);

        shapes += roi.shapes.len();
        rows.extend(stitch(&group.records, &roi)?);
    }

    let export = ExportTable::new(table.schema(), rows);
    store.bulk_register(image.id, &export)?;
    log::info!(
        "Image {}: registered export table with {} rows",
        image.id,
        export.len()
    );

    Ok(ImageOutcome::Completed {
        image_id: image.id,
        rois: groups.len(),
        shapes,
    })
}
