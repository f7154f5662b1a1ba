//! Shape types and data structures.

use serde::{Deserialize, Serialize};

/// RGBA color with 8 bits per channel.
///
/// Serialized in its packed integer form, the representation stores use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    /// Opaque color from RGB components.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self([red, green, blue, 255])
    }

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self([red, green, blue, alpha])
    }

    /// Packed signed 32-bit integer, channels big-endian (`0xRRGGBBAA`).
    pub fn to_packed(self) -> i32 {
        i32::from_be_bytes(self.0)
    }

    pub fn from_packed(value: i32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<i32> for Rgba {
    fn from(value: i32) -> Self {
        Self::from_packed(value)
    }
}

impl From<Rgba> for i32 {
    fn from(color: Rgba) -> Self {
        color.to_packed()
    }
}

/// Single point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointShape {
    pub x: f64,
    pub y: f64,
    /// Plane index (discretized z).
    pub z: i64,
    /// Timepoint index.
    pub t: i64,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Rgba>,
}

/// Bit-packed binary mask cropped to its bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskShape {
    /// Plane index within the source stack.
    pub plane_index: usize,
    /// Column of the crop's left edge.
    pub x0: usize,
    /// Row of the crop's top edge.
    pub y0: usize,
    pub width: usize,
    pub height: usize,
    /// Row-major bits of the cropped region, MSB first, 8 per byte.
    pub packed_bits: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Rgba>,
}

impl MaskShape {
    /// Whether the cell at crop-relative `(row, col)` is set.
    pub fn is_set(&self, row: usize, col: usize) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        let bit = row * self.width + col;
        self.packed_bits
            .get(bit / 8)
            .is_some_and(|byte| byte & (0x80 >> (bit % 8)) != 0)
    }

    /// Number of set cells.
    pub fn area(&self) -> usize {
        self.packed_bits
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum()
    }
}

/// Geometric annotation attached to an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Point(PointShape),
    Mask(MaskShape),
}

impl Shape {
    /// Name of the shape type (for logging and error messages).
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Point(_) => "point",
            Shape::Mask(_) => "mask",
        }
    }

    /// Text label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Shape::Point(p) => Some(p.label.as_str()),
            Shape::Mask(m) => m.label.as_deref(),
        }
    }

    /// Discretized plane coordinate.
    pub fn plane(&self) -> i64 {
        match self {
            Shape::Point(p) => p.z,
            Shape::Mask(m) => m.plane_index as i64,
        }
    }

    pub fn is_mask(&self) -> bool {
        matches!(self, Shape::Mask(_))
    }
}
