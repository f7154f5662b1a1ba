//! Merging persisted identifiers back into input rows.

use crate::error::{PipelineError, Result};
use crate::model::PersistedRoi;
use crate::table::{ExportRow, Record};

/// Pair each record of a group with the persisted shape in the same position.
///
/// `roi` must already be order-verified against the group.
pub fn stitch(records: &[&Record], roi: &PersistedRoi) -> Result<Vec<ExportRow>> {
    if records.len() != roi.shapes.len() {
        return Err(PipelineError::ShapeCountMismatch {
            expected: records.len(),
            found: roi.shapes.len(),
        });
    }

    Ok(records
        .iter()
        .zip(&roi.shapes)
        .map(|(record, shape)| ExportRow::new(record, roi.id, shape.id))
        .collect())
}
