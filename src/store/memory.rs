//! In-memory store.

use std::collections::{BTreeMap, HashMap};

use crate::error::{PipelineError, Result};
use crate::model::{AnnotationGroup, ImageId, PersistedRoi, PersistedShape, RoiId};
use crate::store::{AnnotationStore, Catalog, ImageHandle, ImageRepository, NameMatch, RoiRepository};
use crate::table::ExportTable;

/// Store keeping images, ROIs and registered tables in memory.
///
/// Identifiers are assigned sequentially starting at 1. Every mutating call
/// increments [`MemoryStore::writes`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: BTreeMap<String, Vec<ImageHandle>>,
    rois: Vec<PersistedRoi>,
    tables: HashMap<ImageId, ExportTable>,
    next_roi_id: i64,
    next_shape_id: i64,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed datasets and images from a catalog.
    pub fn from_catalog(catalog: Catalog) -> Self {
        let mut store = Self::new();
        for dataset in catalog.datasets {
            store
                .datasets
                .entry(dataset.name)
                .or_default()
                .extend(dataset.images);
        }
        store
    }

    /// Add an image to a dataset.
    pub fn add_image(&mut self, dataset: &str, image: ImageHandle) {
        self.datasets
            .entry(dataset.to_string())
            .or_default()
            .push(image);
    }

    /// Restore previously persisted ROIs, continuing id assignment after them.
    pub fn with_rois(mut self, rois: Vec<PersistedRoi>) -> Self {
        self.next_roi_id = rois.iter().map(|r| r.id).max().unwrap_or(0);
        self.next_shape_id = rois
            .iter()
            .flat_map(|r| r.shapes.iter().map(|s| s.id))
            .max()
            .unwrap_or(0);
        self.rois = rois;
        self
    }

    pub fn rois(&self) -> &[PersistedRoi] {
        &self.rois
    }

    /// Put back an earlier ROI list. Id counters keep their values, so ids
    /// handed out in between are never reused.
    pub(crate) fn restore_rois(&mut self, rois: Vec<PersistedRoi>) {
        self.rois = rois;
    }

    /// ROIs attached to one image, in creation order.
    pub fn rois_for(&self, image_id: ImageId) -> Vec<&PersistedRoi> {
        self.rois.iter().filter(|r| r.image_id == image_id).collect()
    }

    /// Export table registered for an image, if any.
    pub fn table(&self, image_id: ImageId) -> Option<&ExportTable> {
        self.tables.get(&image_id)
    }

    /// Number of mutating calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ImageRepository for MemoryStore {
    fn lookup(&self, dataset: &str, name: &NameMatch) -> Result<ImageHandle> {
        let images = self
            .datasets
            .get(dataset)
            .ok_or_else(|| PipelineError::lookup(format!("dataset '{}' not found", dataset)))?;

        let mut matches = images.iter().filter(|i| name.matches(&i.name));
        let first = matches.next().ok_or_else(|| {
            PipelineError::lookup(format!("no image {} in dataset '{}'", name, dataset))
        })?;
        if let Some(second) = matches.next() {
            return Err(PipelineError::lookup(format!(
                "image {} in dataset '{}' is ambiguous ('{}', '{}', ...)",
                name, dataset, first.name, second.name
            )));
        }
        Ok(first.clone())
    }
}

impl RoiRepository for MemoryStore {
    fn save(&mut self, group: &AnnotationGroup) -> Result<PersistedRoi> {
        self.next_roi_id += 1;
        let shapes = group
            .shapes()
            .iter()
            .map(|shape| {
                self.next_shape_id += 1;
                PersistedShape {
                    id: self.next_shape_id,
                    shape: shape.clone(),
                }
            })
            .collect();

        let roi = PersistedRoi {
            id: self.next_roi_id,
            image_id: group.image_id(),
            name: group.name().map(str::to_string),
            shapes,
        };
        self.rois.push(roi.clone());
        self.writes += 1;
        Ok(roi)
    }

    fn shape_count(&self, image_id: ImageId) -> Result<usize> {
        Ok(self
            .rois
            .iter()
            .filter(|r| r.image_id == image_id)
            .map(|r| r.shapes.len())
            .sum())
    }

    fn mask_roi_ids(&self, image_id: ImageId) -> Result<Vec<RoiId>> {
        Ok(self
            .rois
            .iter()
            .filter(|r| r.image_id == image_id && r.has_mask())
            .map(|r| r.id)
            .collect())
    }

    fn delete_rois(&mut self, ids: &[RoiId]) -> Result<()> {
        let before = self.rois.len();
        self.rois.retain(|r| !ids.contains(&r.id));
        if self.rois.len() != before {
            self.writes += 1;
        }
        Ok(())
    }
}

impl AnnotationStore for MemoryStore {
    fn bulk_register(&mut self, image_id: ImageId, table: &ExportTable) -> Result<()> {
        self.tables.insert(image_id, table.clone());
        self.writes += 1;
        Ok(())
    }
}
