//! Local file-backed store.
//!
//! Images come from a catalog JSON file. Persisted ROIs live in
//! `<output_dir>/rois.json`, rewritten after every change so a later run sees
//! what an earlier run created. Registered export tables are written as
//! `<output_dir>/image_<id>.csv`.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{AnnotationGroup, ImageId, PersistedRoi, RoiId};
use crate::store::{
    AnnotationStore, Catalog, ImageHandle, ImageRepository, MemoryStore, NameMatch, RoiRepository,
};
use crate::table::ExportTable;

/// File name of the persisted ROI list inside the output directory.
pub const ROIS_FILE: &str = "rois.json";

/// Store backed by a catalog file and an output directory.
#[derive(Debug)]
pub struct JsonStore {
    inner: MemoryStore,
    output_dir: PathBuf,
}

impl JsonStore {
    /// Open the store, loading ROIs persisted by earlier runs.
    pub fn open(catalog_path: &Path, output_dir: &Path) -> Result<Self> {
        log::info!("Opening catalog {:?}", catalog_path);
        let catalog: Catalog = serde_json::from_str(&std::fs::read_to_string(catalog_path)?)?;
        std::fs::create_dir_all(output_dir)?;

        let rois_path = output_dir.join(ROIS_FILE);
        let rois: Vec<PersistedRoi> = if rois_path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&rois_path)?)?
        } else {
            Vec::new()
        };
        log::info!(
            "Catalog has {} datasets; {} ROIs already persisted",
            catalog.datasets.len(),
            rois.len()
        );

        Ok(Self {
            inner: MemoryStore::from_catalog(catalog).with_rois(rois),
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path an image's export table is written to.
    pub fn table_path(&self, image_id: ImageId) -> PathBuf {
        self.output_dir.join(format!("image_{}.csv", image_id))
    }

    pub fn rois(&self) -> &[PersistedRoi] {
        self.inner.rois()
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self.inner.rois())?;
        std::fs::write(self.output_dir.join(ROIS_FILE), json)?;
        Ok(())
    }

    /// Flush after a change; on failure the in-memory ROIs go back to
    /// `snapshot` so they keep matching the file.
    fn flush_or_restore(&mut self, snapshot: Vec<PersistedRoi>) -> Result<()> {
        if let Err(e) = self.flush() {
            log::error!("Failed to write {:?}: {}", self.output_dir.join(ROIS_FILE), e);
            self.inner.restore_rois(snapshot);
            return Err(e);
        }
        Ok(())
    }
}

impl ImageRepository for JsonStore {
    fn lookup(&self, dataset: &str, name: &NameMatch) -> Result<ImageHandle> {
        self.inner.lookup(dataset, name)
    }
}

impl RoiRepository for JsonStore {
    fn save(&mut self, group: &AnnotationGroup) -> Result<PersistedRoi> {
        let snapshot = self.inner.rois().to_vec();
        let roi = self.inner.save(group)?;
        self.flush_or_restore(snapshot)?;
        Ok(roi)
    }

    fn shape_count(&self, image_id: ImageId) -> Result<usize> {
        self.inner.shape_count(image_id)
    }

    fn mask_roi_ids(&self, image_id: ImageId) -> Result<Vec<RoiId>> {
        self.inner.mask_roi_ids(image_id)
    }

    fn delete_rois(&mut self, ids: &[RoiId]) -> Result<()> {
        let snapshot = self.inner.rois().to_vec();
        self.inner.delete_rois(ids)?;
        self.flush_or_restore(snapshot)
    }
}

impl AnnotationStore for JsonStore {
    fn bulk_register(&mut self, image_id: ImageId, table: &ExportTable) -> Result<()> {
        table.write(&self.table_path(image_id))?;
        self.inner.bulk_register(image_id, table)
    }
}
