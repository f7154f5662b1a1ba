//! Shape builders: points from table groups, masks from binary stacks.

mod mask;
mod points;

pub use mask::{BoundingBox, bounding_box, build_masks, mask_from_plane, pack_bits};
pub use points::{PointStyle, build_points};
