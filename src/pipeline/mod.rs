//! Batch orchestration.
//!
//! Images are processed one at a time. A failing image is logged and
//! recorded in the [`BatchReport`]; the batch continues with the next job.

mod masks;
mod points;
mod report;

#[cfg(test)]
mod tests;

pub use masks::{MaskSource, annotate_stack, resolve_sources, run_masks_job};
pub use points::{annotate_points, process_points, run_points_job};
pub use report::{BatchReport, ImageOutcome, ImageReport, JobKind};

use crate::config::PipelineConfig;
use crate::data::LoaderRegistry;
use crate::error::Result;
use crate::store::{ImageHandle, RoiRepository, Store};

/// `Some(AlreadyProcessed)` when the image carries any persisted shape.
pub(crate) fn check_processed<R>(repo: &R, image: &ImageHandle) -> Result<Option<ImageOutcome>>
where
    R: RoiRepository + ?Sized,
{
    let count = repo.shape_count(image.id)?;
    if count > 0 {
        log::warn!(
            "Image {} ('{}') already has {} shapes, skipping",
            image.id,
            image.name,
            count
        );
        return Ok(Some(ImageOutcome::AlreadyProcessed { image_id: image.id }));
    }
    Ok(None)
}

/// Run every job of `config` against `store`.
pub fn run_batch<S>(store: &mut S, config: &PipelineConfig) -> BatchReport
where
    S: Store + ?Sized,
{
    let mut report = BatchReport::new();

    if let Some(points) = &config.points {
        for job in &points.jobs {
            log::info!(
                "Points: dataset '{}', image {}",
                job.dataset,
                job.image
            );
            let result = run_points_job(store, points, job);
            report.record(JobKind::Points, &job.dataset, job.image.to_string(), result);
        }
    }

    if let Some(masks) = &config.masks {
        let loaders = LoaderRegistry::new();
        for job in &masks.jobs {
            log::info!("Masks: dataset '{}', image {}", job.dataset, job.image);
            let result = run_masks_job(store, &loaders, masks, job);
            report.record(JobKind::Masks, &job.dataset, job.image.to_string(), result);
        }
    }

    log::info!("{}", report);
    report
}
