//! Post-condition-checked ROI persistence.
//!
//! The store is required to return persisted shapes one-to-one and in
//! submission order. Both are checked after every save; a violation is an
//! integrity error and is never retried.

use crate::coords::{Calibration, CoordinateMapper};
use crate::error::{PipelineError, Result};
use crate::model::{AnnotationGroup, PersistedRoi, Shape};
use crate::store::RoiRepository;
use crate::table::Record;

/// Order-relevant fingerprint of a shape: type, plane and mask origin.
fn signature(shape: &Shape) -> String {
    let kind = shape.type_name();
    match shape {
        Shape::Point(p) => format!("{} z={}", kind, p.z),
        Shape::Mask(m) => format!("{} plane={} at ({}, {})", kind, m.plane_index, m.x0, m.y0),
    }
}

/// Save `group` and check the returned shapes against the submitted ones.
pub fn submit<R>(repo: &mut R, group: &AnnotationGroup) -> Result<PersistedRoi>
where
    R: RoiRepository + ?Sized,
{
    let roi = repo.save(group)?;

    if roi.shapes.len() != group.len() {
        return Err(PipelineError::ShapeCountMismatch {
            expected: group.len(),
            found: roi.shapes.len(),
        });
    }

    for (index, (submitted, persisted)) in group.shapes().iter().zip(&roi.shapes).enumerate() {
        let expected = signature(submitted);
        let found = signature(&persisted.shape);
        if expected != found {
            log::error!(
                "ROI {} on image {}: shape {} came back as {} (submitted {})",
                roi.id,
                group.image_id(),
                index,
                found,
                expected
            );
            return Err(PipelineError::integrity(index, expected, found));
        }
    }

    log::info!(
        "Saved ROI {} ({} shapes) on image {}",
        roi.id,
        roi.shapes.len(),
        group.image_id()
    );
    Ok(roi)
}

/// Recompute each record's plane and compare it with the persisted shape in
/// the same position.
pub fn verify_planes(
    mapper: &CoordinateMapper,
    calibration: Option<&Calibration>,
    records: &[&Record],
    roi: &PersistedRoi,
) -> Result<()> {
    if records.len() != roi.shapes.len() {
        return Err(PipelineError::ShapeCountMismatch {
            expected: records.len(),
            found: roi.shapes.len(),
        });
    }

    for (index, (record, persisted)) in records.iter().zip(&roi.shapes).enumerate() {
        let expected = mapper.plane(record, calibration)?;
        let found = persisted.shape.plane();
        if expected != found {
            log::error!(
                "ROI {}: row {} expects plane {}, persisted shape {} has plane {}",
                roi.id,
                record.origin(),
                expected,
                persisted.id,
                found
            );
            return Err(PipelineError::integrity(index, expected, found));
        }
    }
    Ok(())
}
