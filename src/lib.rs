//! locus-rois - genomic locus ROI pipeline
//!
//! Turns tables of 3D locus measurements into point annotations on a target
//! image, and binary segmentation stacks into mask annotations. Every group of
//! rows becomes one ROI; the identifiers the store assigns are stitched back
//! into an export table for bulk metadata registration.
//!
//! ```rust,ignore
//! use locus_rois::{MemoryStore, PointsConfig, process_points, RecordTable, NameMatch};
//!
//! let table = RecordTable::read(Path::new("embryo01_traces.csv"), ',')?;
//! let mut store = MemoryStore::from_catalog(catalog);
//! let outcome = process_points(
//!     &mut store,
//!     &PointsConfig::default(),
//!     "Embryo_01",
//!     &NameMatch::Exact("embryo01_seq".into()),
//!     &table,
//! )?;
//! ```

pub mod config;
pub mod coords;
pub mod data;
pub mod error;
pub mod grouping;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod shapes;
pub mod stitch;
pub mod store;
pub mod table;
pub mod template;

pub use config::{
    CONFIG_VERSION, ExistingShapes, LogLevel, MasksConfig, MasksJob, PipelineConfig, PointsConfig,
    PointsJob, StoreConfig,
};
pub use coords::{
    Calibration, CoordinateColumns, CoordinateConvention, CoordinateMapper, MappedPoint,
    RoundingPolicy,
};
pub use error::{PipelineError, Result};
pub use grouping::{Group, GroupKey, GroupKeyRule, partition};
pub use model::{
    AnnotationGroup, MaskShape, Palette, PersistedRoi, PersistedShape, PointShape, Rgba, Shape,
};
pub use pipeline::{BatchReport, ImageOutcome, process_points, run_batch};
pub use store::{JsonStore, MemoryStore, NameMatch, Store};
pub use table::{ExportTable, Record, RecordTable};
pub use template::Template;
