//! Loader for multi-page TIFF segmentation stacks.

use std::io::Cursor;

use ndarray::Array3;
use tiff::decoder::{Decoder, DecodingResult};

use crate::data::loader::StackLoader;
use crate::error::{PipelineError, Result};

/// Loader for TIFF files where every page (IFD) is one plane.
///
/// All pages must share the same dimensions. Pixels with several samples
/// count as foreground when any sample is nonzero.
pub struct TiffLoader;

/// Nonzero flag per sample of one decoded page.
fn foreground(page: DecodingResult) -> Vec<bool> {
    match page {
        DecodingResult::U8(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::U16(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::I8(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::I16(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|s| s != 0).collect(),
        DecodingResult::F16(v) => v.into_iter().map(|s| s.to_f32() != 0.0).collect(),
        DecodingResult::F32(v) => v.into_iter().map(|s| s != 0.0).collect(),
        DecodingResult::F64(v) => v.into_iter().map(|s| s != 0.0).collect(),
    }
}

impl StackLoader for TiffLoader {
    fn id(&self) -> &'static str {
        "tiff"
    }

    fn display_name(&self) -> &'static str {
        "TIFF Stack"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tif", "tiff"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        // 49 49 2A 00 (little endian) or 4D 4D 00 2A (big endian)
        data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    }

    fn load(&self, data: &[u8]) -> Result<Array3<u8>> {
        let mut decoder = Decoder::new(Cursor::new(data))?;
        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);
        let pixels = width * height;

        let mut planes: Vec<Vec<bool>> = Vec::new();
        loop {
            let page = planes.len();
            let dims = decoder.dimensions()?;
            if dims != (width as u32, height as u32) {
                return Err(PipelineError::config(format!(
                    "TIFF page {} is {}x{}, expected {}x{} like page 0",
                    page, dims.0, dims.1, width, height
                )));
            }

            let samples = foreground(decoder.read_image()?);
            if pixels == 0 || samples.len() % pixels != 0 {
                return Err(PipelineError::config(format!(
                    "TIFF page {} holds {} samples for {}x{} pixels",
                    page,
                    samples.len(),
                    width,
                    height
                )));
            }
            let per_pixel = samples.len() / pixels;
            planes.push(
                samples
                    .chunks(per_pixel)
                    .map(|pixel| pixel.iter().any(|s| *s))
                    .collect(),
            );

            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
        }

        let mut stack = Array3::<u8>::zeros((planes.len(), height, width));
        for (z, plane) in planes.iter().enumerate() {
            for (i, _) in plane.iter().enumerate().filter(|(_, on)| **on) {
                stack[[z, i / width, i % width]] = 1;
            }
        }

        log::trace!(
            "TiffLoader: loaded {} pages of {}x{}",
            planes.len(),
            width,
            height
        );
        Ok(stack)
    }

    fn priority(&self) -> i32 {
        5
    }
}
