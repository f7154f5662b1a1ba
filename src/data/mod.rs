//! Loading of binary segmentation stacks for mask building.
//!
//! This module provides:
//! - `StackLoader`: trait implemented per file format
//! - `LoaderRegistry`: format detection by extension, then magic bytes
//! - Built-in loaders for NumPy (.npy) stacks, multi-page TIFF stacks and
//!   single-plane PNG/BMP images
//!
//! ```rust,ignore
//! use locus_rois::data::LoaderRegistry;
//!
//! let registry = LoaderRegistry::new();
//! let stack = registry.load_path(Path::new("seg_nucleus.npy"))?;
//! ```

mod loader;
pub mod loaders;

pub use loader::{LoaderRegistry, StackLoader};
