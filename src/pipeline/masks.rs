//! Mask annotation of one image from segmentation stacks.

use std::path::PathBuf;

use ndarray::{Array3, ArrayView3};

use crate::config::{ExistingShapes, MasksConfig, MasksJob};
use crate::data::LoaderRegistry;
use crate::error::{PipelineError, Result};
use crate::model::{AnnotationGroup, ImageId, PersistedRoi, Rgba};
use crate::persist;
use crate::pipeline::{ImageOutcome, check_processed};
use crate::shapes::build_masks;
use crate::store::{ImageHandle, RoiRepository, Store};

/// A segmentation kind and the file it is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSource {
    pub segmentation: String,
    pub path: PathBuf,
}

/// Render the source path of every configured segmentation.
///
/// A path whose extension no loader handles is a configuration error.
/// Absent sources on the allow-list are dropped with a warning; any other
/// absent source fails with [`PipelineError::MissingSource`].
pub fn resolve_sources(
    loaders: &LoaderRegistry,
    config: &MasksConfig,
    job: &MasksJob,
    image: &ImageHandle,
) -> Result<Vec<MaskSource>> {
    let mut sources = Vec::with_capacity(config.segmentations.len());

    for segmentation in &config.segmentations {
        let rendered = config.path_template.render(|name| match name {
            "dataset" => Some(job.dataset.as_str()),
            "image" => Some(image.name.as_str()),
            "segmentation" => Some(segmentation.as_str()),
            other => job.vars.get(other).map(String::as_str),
        })?;
        let path = config.source_path(&rendered);
        if !loaders.is_supported_file(&rendered) {
            return Err(PipelineError::config(format!(
                "Source {:?} for '{}' has no supported extension (expected one of: {})",
                path,
                segmentation,
                loaders.supported_extensions().join(", ")
            )));
        }

        if !path.exists() {
            if config.allow_missing.contains(&path) {
                log::warn!("Skipping allowed missing source {:?}", path);
                continue;
            }
            return Err(PipelineError::MissingSource { path });
        }

        sources.push(MaskSource {
            segmentation: segmentation.clone(),
            path,
        });
    }

    Ok(sources)
}

/// Persist the masks of one stack as a single ROI.
///
/// Returns `None` when no plane has foreground.
pub fn annotate_stack<R>(
    repo: &mut R,
    image_id: ImageId,
    segmentation: &str,
    stack: ArrayView3<'_, u8>,
    fill_color: Option<Rgba>,
) -> Result<Option<PersistedRoi>>
where
    R: RoiRepository + ?Sized,
{
    let shapes = build_masks(stack, Some(segmentation), fill_color);
    if shapes.is_empty() {
        log::warn!(
            "Image {}: '{}' stack has no foreground, no ROI created",
            image_id,
            segmentation
        );
        return Ok(None);
    }

    let roi = persist::submit(repo, &AnnotationGroup::new(image_id, shapes))?;
    Ok(Some(roi))
}

/// Run one configured masks job.
///
/// All sources are resolved and loaded before the store is touched.
pub fn run_masks_job<S>(
    store: &mut S,
    loaders: &LoaderRegistry,
    config: &MasksConfig,
    job: &MasksJob,
) -> Result<ImageOutcome>
where
    S: Store + ?Sized,
{
    let image = store.lookup(&job.dataset, &job.image)?;
    if config.existing == ExistingShapes::Skip {
        if let Some(outcome) = check_processed(store, &image)? {
            return Ok(outcome);
        }
    }

    let stacks = resolve_sources(loaders, config, job, &image)?
        .into_iter()
        .map(|source| {
            let stack: Array3<u8> = loaders.load_path(&source.path)?;
            log::debug!(
                "Loaded '{}' stack {:?} from {:?}",
                source.segmentation,
                stack.shape(),
                source.path
            );
            Ok((source.segmentation, stack))
        })
        .collect::<Result<Vec<_>>>()?;

    if config.existing == ExistingShapes::ReplaceMasks {
        let ids = store.mask_roi_ids(image.id)?;
        if !ids.is_empty() {
            log::info!("Image {}: deleting {} existing mask ROIs", image.id, ids.len());
            store.delete_rois(&ids)?;
        }
    }

    let mut rois = 0;
    let mut shapes = 0;
    for (segmentation, stack) in &stacks {
        if let Some(roi) =
            annotate_stack(store, image.id, segmentation, stack.view(), config.fill_color)?
        {
            rois += 1;
            shapes += roi.shapes.len();
        }
    }

    log::info!(
        "Image {} ('{}'): {} mask ROIs with {} masks",
        image.id,
        image.name,
        rois,
        shapes
    );
    Ok(ImageOutcome::Completed {
        image_id: image.id,
        rois,
        shapes,
    })
}
