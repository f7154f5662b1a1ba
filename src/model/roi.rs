//! ROI (annotation group) types.

use serde::{Deserialize, Serialize};

use crate::model::Shape;

/// Identifier of a target image in the store.
pub type ImageId = i64;

/// Identifier assigned to a persisted ROI.
pub type RoiId = i64;

/// Identifier assigned to a persisted shape.
pub type ShapeId = i64;

/// Ordered bundle of shapes bound to one target image.
///
/// Shape order is the order the shapes were built in and is carried
/// unchanged through persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationGroup {
    image_id: ImageId,
    shapes: Vec<Shape>,
    name: Option<String>,
}

impl AnnotationGroup {
    /// Create a group; its name is taken from the first shape's label.
    pub fn new(image_id: ImageId, shapes: Vec<Shape>) -> Self {
        let name = shapes
            .first()
            .and_then(|s| s.label())
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        Self {
            image_id,
            shapes,
            name,
        }
    }

    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// A shape as returned by the store, with its assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedShape {
    pub id: ShapeId,
    pub shape: Shape,
}

/// A persisted ROI with its shapes in store order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRoi {
    pub id: RoiId,
    pub image_id: ImageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub shapes: Vec<PersistedShape>,
}

impl PersistedRoi {
    /// Whether any shape of this ROI is a mask.
    pub fn has_mask(&self) -> bool {
        self.shapes.iter().any(|s| s.shape.is_mask())
    }
}
