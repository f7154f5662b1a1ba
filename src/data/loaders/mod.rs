//! Built-in segmentation stack loaders.

mod image_loader;
mod npy_loader;
mod tiff_loader;

pub use image_loader::ImageLoader;
pub use npy_loader::NpyLoader;
pub use tiff_loader::TiffLoader;
