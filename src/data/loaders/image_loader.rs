//! Loader for single-plane raster images (PNG, BMP).

use ndarray::Array3;

use crate::data::loader::StackLoader;
use crate::error::Result;

/// Loader for standard image formats.
///
/// Decodes the first frame as 16-bit luminance so that both `0/1` and
/// `0/255` binary images keep every foreground pixel nonzero. The result is
/// a stack with one plane. Multi-plane stacks come from `.npy` or TIFF files.
pub struct ImageLoader;

impl StackLoader for ImageLoader {
    fn id(&self) -> &'static str {
        "image"
    }

    fn display_name(&self) -> &'static str {
        "Standard Image (single plane)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png", "bmp"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        if data.len() < 8 {
            return false;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return true;
        }

        // BMP: 42 4D (BM)
        data.starts_with(&[0x42, 0x4D])
    }

    fn load(&self, data: &[u8]) -> Result<Array3<u8>> {
        let img = image::load_from_memory(data)?.to_luma16();

        let width = img.width() as usize;
        let height = img.height() as usize;

        let mut stack = Array3::<u8>::zeros((1, height, width));
        for (x, y, pixel) in img.enumerate_pixels() {
            if pixel[0] != 0 {
                stack[[0, y as usize, x as usize]] = 1;
            }
        }

        log::trace!("ImageLoader: loaded {}x{} plane", width, height);
        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(img: &image::GrayImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_loader_metadata() {
        let loader = ImageLoader;
        assert_eq!(loader.id(), "image");
        assert!(loader.extensions().contains(&"png"));
        assert!(!loader.extensions().contains(&"tif"));
        assert_eq!(loader.priority(), 0);
    }

    #[test]
    fn test_magic_detection() {
        let loader = ImageLoader;
        assert!(loader.can_load(&[0x42, 0x4D, 0, 0, 0, 0, 0, 0]));
        assert!(!loader.can_load(&[0x49, 0x49, 0x2A, 0x00, 0, 0, 0, 0]));
        assert!(!loader.can_load(&[0u8; 8]));
    }

    #[test]
    fn test_load_binary_png() {
        let mut img = image::GrayImage::new(4, 3);
        img.put_pixel(1, 2, image::Luma([1]));
        img.put_pixel(3, 0, image::Luma([255]));

        let stack = ImageLoader.load(&png_bytes(&img)).unwrap();
        assert_eq!(stack.shape(), &[1, 3, 4]);
        assert_eq!(stack[[0, 2, 1]], 1);
        assert_eq!(stack[[0, 0, 3]], 1);
        assert_eq!(stack.sum(), 2);
    }
}
