//! Mask shapes from stacks of binary planes.
//!
//! Each non-empty plane is cropped to the tight bounding box of its nonzero
//! cells and bit-packed row-major, most significant bit first. Only the
//! crop is encoded; offset and size travel with it.

use ndarray::{ArrayView2, ArrayView3, s};

use crate::model::{MaskShape, Rgba, Shape};

/// Tight bounds of the nonzero cells of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

/// Bounding box of nonzero cells, or `None` for an all-zero plane.
pub fn bounding_box(plane: ArrayView2<'_, u8>) -> Option<BoundingBox> {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;

    for ((row, col), &value) in plane.indexed_iter() {
        if value == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (row, row, col, col),
            Some((r0, r1, c0, c1)) => (r0.min(row), r1.max(row), c0.min(col), c1.max(col)),
        });
    }

    bounds.map(|(r0, r1, c0, c1)| BoundingBox {
        x0: c0,
        y0: r0,
        width: c1 - c0 + 1,
        height: r1 - r0 + 1,
    })
}

/// Pack cells row-major into bytes, 8 per byte, MSB first.
///
/// Any nonzero cell is a set bit. The final byte is zero-padded.
pub fn pack_bits(region: ArrayView2<'_, u8>) -> Vec<u8> {
    let mut bytes = vec![0u8; region.len().div_ceil(8)];
    for (i, &value) in region.iter().enumerate() {
        if value != 0 {
            bytes[i / 8] |= 0x80 >> (i % 8);
        }
    }
    bytes
}

/// Build the mask for one plane; an all-zero plane yields `None`.
pub fn mask_from_plane(
    plane: ArrayView2<'_, u8>,
    plane_index: usize,
    label: Option<&str>,
    fill_color: Option<Rgba>,
) -> Option<MaskShape> {
    let bbox = bounding_box(plane)?;
    let crop = plane.slice(s![
        bbox.y0..bbox.y0 + bbox.height,
        bbox.x0..bbox.x0 + bbox.width
    ]);

    Some(MaskShape {
        plane_index,
        x0: bbox.x0,
        y0: bbox.y0,
        width: bbox.width,
        height: bbox.height,
        packed_bits: pack_bits(crop),
        label: label.map(str::to_string),
        fill_color,
    })
}

/// Build one mask per non-empty plane of a `(plane, row, col)` stack.
pub fn build_masks(
    stack: ArrayView3<'_, u8>,
    label: Option<&str>,
    fill_color: Option<Rgba>,
) -> Vec<Shape> {
    let masks: Vec<Shape> = stack
        .outer_iter()
        .enumerate()
        .filter_map(|(z, plane)| mask_from_plane(plane, z, label, fill_color))
        .map(Shape::Mask)
        .collect();

    log::debug!(
        "Built {} masks from {} planes{}",
        masks.len(),
        stack.shape()[0],
        label.map(|l| format!(" ({})", l)).unwrap_or_default()
    );
    masks
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3, array};

    #[test]
    fn test_all_zero_plane_yields_nothing() {
        let plane = Array2::<u8>::zeros((4, 5));
        assert_eq!(bounding_box(plane.view()), None);
        assert!(mask_from_plane(plane.view(), 0, None, None).is_none());
    }

    #[test]
    fn test_single_cell() {
        let mut plane = Array2::<u8>::zeros((6, 8));
        plane[[4, 2]] = 1;
        let mask = mask_from_plane(plane.view(), 3, Some("nucleus"), None).unwrap();

        assert_eq!((mask.x0, mask.y0), (2, 4));
        assert_eq!((mask.width, mask.height), (1, 1));
        assert_eq!(mask.plane_index, 3);
        assert_eq!(mask.packed_bits, vec![0x80]);
        assert_eq!(mask.label.as_deref(), Some("nucleus"));
    }

    #[test]
    fn test_crop_and_pack() {
        let plane: Array2<u8> = array![
            [0, 0, 0, 0, 0],
            [0, 1, 0, 1, 0],
            [0, 0, 1, 0, 0],
            [0, 1, 0, 1, 0],
            [0, 0, 0, 0, 0],
        ];
        let mask = mask_from_plane(plane.view(), 0, None, None).unwrap();
        assert_eq!((mask.x0, mask.y0, mask.width, mask.height), (1, 1, 3, 3));
        // 101 010 101 -> 1010_1010 1000_0000
        assert_eq!(mask.packed_bits, vec![0b1010_1010, 0b1000_0000]);
        assert!(mask.is_set(1, 1));
        assert_eq!(mask.area(), 5);
    }

    #[test]
    fn test_nonzero_values_are_foreground() {
        let plane: Array2<u8> = array![[255, 0], [0, 7]];
        assert_eq!(pack_bits(plane.view()), vec![0b1001_0000]);
    }

    #[test]
    fn test_exact_byte_multiple() {
        let plane = Array2::<u8>::ones((2, 8));
        assert_eq!(pack_bits(plane.view()), vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_stack_skips_empty_planes() {
        let mut stack = Array3::<u8>::zeros((3, 4, 4));
        stack[[0, 1, 1]] = 1;
        stack[[2, 0, 3]] = 1;
        stack[[2, 3, 3]] = 1;
        let fill = Rgba::rgba(255, 255, 255, 128);

        let shapes = build_masks(stack.view(), Some("lamin"), Some(fill));
        assert_eq!(shapes.len(), 2);
        match (&shapes[0], &shapes[1]) {
            (Shape::Mask(a), Shape::Mask(b)) => {
                assert_eq!(a.plane_index, 0);
                assert_eq!(b.plane_index, 2);
                assert_eq!((b.x0, b.y0, b.width, b.height), (3, 0, 1, 4));
                assert_eq!(b.packed_bits, vec![0b1001_0000]);
                assert_eq!(b.fill_color, Some(fill));
            }
            _ => panic!("expected masks"),
        }
    }
}
