//! Data models for shapes and ROIs.

mod palette;
mod roi;
mod shape;

pub use palette::Palette;
pub use roi::{AnnotationGroup, ImageId, PersistedRoi, PersistedShape, RoiId, ShapeId};
pub use shape::{MaskShape, PointShape, Rgba, Shape};
