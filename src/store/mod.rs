//! Interfaces to the image/ROI server and local implementations.
//!
//! The pipeline only talks to the three traits below. [`MemoryStore`] keeps
//! everything in memory; [`JsonStore`] adds a catalog file and persists ROIs
//! and export tables to an output directory.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::coords::Calibration;
use crate::error::Result;
use crate::model::{AnnotationGroup, ImageId, PersistedRoi, RoiId};
use crate::table::ExportTable;

/// How an image name is matched within a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    Exact(String),
    Contains(String),
}

impl NameMatch {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatch::Exact(expected) => name == expected,
            NameMatch::Contains(part) => name.contains(part.as_str()),
        }
    }
}

impl std::fmt::Display for NameMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameMatch::Exact(name) => write!(f, "'{}'", name),
            NameMatch::Contains(part) => write!(f, "containing '{}'", part),
        }
    }
}

/// A resolved target image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub id: ImageId,
    pub name: String,
    #[serde(default)]
    pub calibration: Calibration,
}

/// Resolves target images by dataset and name.
pub trait ImageRepository {
    /// Find the single image of `dataset` matching `name`.
    ///
    /// No match or more than one match is a lookup error.
    fn lookup(&self, dataset: &str, name: &NameMatch) -> Result<ImageHandle>;
}

/// Persists ROIs.
///
/// Contract: `save` returns the persisted shapes in the order they were
/// submitted. Callers verify this on every call.
pub trait RoiRepository {
    fn save(&mut self, group: &AnnotationGroup) -> Result<PersistedRoi>;

    /// Number of persisted shapes attached to an image.
    fn shape_count(&self, image_id: ImageId) -> Result<usize>;

    /// Ids of the image's ROIs that contain at least one mask.
    fn mask_roi_ids(&self, image_id: ImageId) -> Result<Vec<RoiId>>;

    fn delete_rois(&mut self, ids: &[RoiId]) -> Result<()>;
}

/// Ingests export tables as per-shape queryable metadata.
pub trait AnnotationStore {
    fn bulk_register(&mut self, image_id: ImageId, table: &ExportTable) -> Result<()>;
}

/// Everything the pipeline needs from one store session.
pub trait Store: ImageRepository + RoiRepository + AnnotationStore {}

impl<T: ImageRepository + RoiRepository + AnnotationStore + ?Sized> Store for T {}

/// Dataset listing used to seed a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub datasets: Vec<DatasetEntry>,
}

/// One dataset and its images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    #[serde(default)]
    pub images: Vec<ImageHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_match() {
        assert!(NameMatch::Exact("embryo01_seq".into()).matches("embryo01_seq"));
        assert!(!NameMatch::Exact("embryo01".into()).matches("embryo01_seq"));
        assert!(NameMatch::Contains("_processed".into()).matches("cell001_processed"));
    }

    #[test]
    fn test_catalog_json() {
        let json = r#"{
            "datasets": [
                {"name": "Embryo_01", "images": [
                    {"id": 7, "name": "embryo01_seq",
                     "calibration": {"pixel_size_x": 0.1, "pixel_size_y": 0.1, "pixel_size_z": 0.3}}
                ]}
            ]
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let image = &catalog.datasets[0].images[0];
        assert_eq!(image.id, 7);
        assert_eq!(image.calibration.pixel_size_z, Some(0.3));

        let m: NameMatch = serde_json::from_str(r#"{"contains":"_seq"}"#).unwrap();
        assert!(m.matches(&image.name));
    }
}
