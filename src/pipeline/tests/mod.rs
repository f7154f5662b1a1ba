//! End-to-end tests for the point and mask pipelines.
//!
//! These drive whole images through [`MemoryStore`] (or stores that misbehave
//! on purpose) and check what ends up persisted and registered.

mod batch_tests;
mod masks_tests;

use crate::coords::Calibration;
use crate::error::Result;
use crate::model::{AnnotationGroup, ImageId, PersistedRoi, RoiId};
use crate::store::{
    AnnotationStore, ImageHandle, ImageRepository, MemoryStore, NameMatch, RoiRepository,
};
use crate::table::ExportTable;

const DATASET: &str = "Embryo_01";
const IMAGE_NAME: &str = "embryo01_seq";
const IMAGE_ID: ImageId = 1;

/// Store with one image in one dataset.
fn store_with_image() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_image(
        DATASET,
        ImageHandle {
            id: IMAGE_ID,
            name: IMAGE_NAME.to_string(),
            calibration: Calibration::new(0.5, 0.5, 2.0),
        },
    );
    store
}

fn image_match() -> NameMatch {
    NameMatch::Exact(IMAGE_NAME.to_string())
}

/// Store that rewrites every persisted ROI before returning it.
struct Tampering {
    inner: MemoryStore,
    tamper: fn(&mut PersistedRoi),
}

impl Tampering {
    fn new(tamper: fn(&mut PersistedRoi)) -> Self {
        Self {
            inner: store_with_image(),
            tamper,
        }
    }
}

impl ImageRepository for Tampering {
    fn lookup(&self, dataset: &str, name: &NameMatch) -> Result<ImageHandle> {
        self.inner.lookup(dataset, name)
    }
}

impl RoiRepository for Tampering {
    fn save(&mut self, group: &AnnotationGroup) -> Result<PersistedRoi> {
        let mut roi = self.inner.save(group)?;
        (self.tamper)(&mut roi);
        Ok(roi)
    }

    fn shape_count(&self, image_id: ImageId) -> Result<usize> {
        self.inner.shape_count(image_id)
    }

    fn mask_roi_ids(&self, image_id: ImageId) -> Result<Vec<RoiId>> {
        self.inner.mask_roi_ids(image_id)
    }

    fn delete_rois(&mut self, ids: &[RoiId]) -> Result<()> {
        self.inner.delete_rois(ids)
    }
}

impl AnnotationStore for Tampering {
    fn bulk_register(&mut self, image_id: ImageId, table: &ExportTable) -> Result<()> {
        self.inner.bulk_register(image_id, table)
    }
}
