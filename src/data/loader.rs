//! Trait-based loading of binary segmentation stacks.
//!
//! A stack is a `(plane, row, col)` array of `u8` where any nonzero cell is
//! foreground. New formats are added by implementing [`StackLoader`] and
//! registering the loader in [`LoaderRegistry::new`].

use std::path::Path;

use ndarray::Array3;

use crate::error::{PipelineError, Result};

/// Trait for segmentation stack loaders.
pub trait StackLoader: Send + Sync {
    /// Unique identifier for this loader (e.g., "image", "npy").
    fn id(&self) -> &'static str;

    /// Human-readable name for log messages.
    fn display_name(&self) -> &'static str;

    /// File extensions this loader handles (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Check magic bytes; used when the extension is unknown.
    fn can_load(&self, data: &[u8]) -> bool;

    /// Decode raw file bytes into a stack.
    fn load(&self, data: &[u8]) -> Result<Array3<u8>>;

    /// Priority for format detection (higher = checked first).
    fn priority(&self) -> i32 {
        0
    }
}

/// Registry of available stack loaders.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn StackLoader>>,
}

impl LoaderRegistry {
    /// Create a new registry with all built-in loaders.
    pub fn new() -> Self {
        let mut registry = Self {
            loaders: Vec::new(),
        };

        registry.register(Box::new(super::loaders::ImageLoader));
        registry.register(Box::new(super::loaders::TiffLoader));
        registry.register(Box::new(super::loaders::NpyLoader));

        registry
    }

    /// Register a new loader.
    pub fn register(&mut self, loader: Box<dyn StackLoader>) {
        self.loaders.push(loader);
        self.loaders.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Get all supported file extensions.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = self
            .loaders
            .iter()
            .flat_map(|l| l.extensions().iter().copied())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    fn loader_for_extension(&self, ext: &str) -> Option<&dyn StackLoader> {
        let ext_lower = ext.to_lowercase();
        self.loaders
            .iter()
            .find(|l| l.extensions().iter().any(|e| *e == ext_lower))
            .map(|l| l.as_ref())
    }

    fn detect_loader(&self, data: &[u8]) -> Option<&dyn StackLoader> {
        self.loaders
            .iter()
            .find(|l| l.can_load(data))
            .map(|l| l.as_ref())
    }

    /// Decode bytes, choosing the loader by extension, then by magic bytes.
    ///
    /// Unlike a best-effort viewer, a decode failure of the chosen loader is
    /// returned as is: a corrupt segmentation must fail the image.
    pub fn load(&self, data: &[u8], filename: Option<&str>) -> Result<Array3<u8>> {
        let by_extension = filename
            .and_then(|f| Path::new(f).extension())
            .and_then(|e| e.to_str())
            .and_then(|ext| self.loader_for_extension(ext));

        let loader = by_extension
            .or_else(|| self.detect_loader(data))
            .ok_or_else(|| {
                PipelineError::config(format!(
                    "No loader could handle the data{}",
                    filename
                        .map(|f| format!(" (file: {})", f))
                        .unwrap_or_default()
                ))
            })?;

        let stack = loader.load(data)?;
        log::debug!(
            "Loaded {} planes of {}x{} with {} ({})",
            stack.shape()[0],
            stack.shape()[2],
            stack.shape()[1],
            loader.display_name(),
            loader.id()
        );
        Ok(stack)
    }

    /// Read and decode a stack file.
    pub fn load_path(&self, path: &Path) -> Result<Array3<u8>> {
        let data = std::fs::read(path)?;
        let name = path.file_name().and_then(|n| n.to_str());
        self.load(&data, name)
    }

    /// Check if a filename has a supported extension.
    pub fn is_supported_file(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        self.supported_extensions()
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }

    /// Get all registered loaders.
    pub fn loaders(&self) -> &[Box<dyn StackLoader>] {
        &self.loaders
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_by_priority() {
        let registry = LoaderRegistry::new();
        let ids: Vec<&str> = registry.loaders().iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec!["npy", "tiff", "image"]);
    }

    #[test]
    fn test_supported_extensions() {
        let registry = LoaderRegistry::new();
        let extensions = registry.supported_extensions();
        assert!(extensions.contains(&"tif"));
        assert!(extensions.contains(&"tiff"));
        assert!(extensions.contains(&"png"));
        assert!(extensions.contains(&"npy"));
    }

    #[test]
    fn test_is_supported_file() {
        let registry = LoaderRegistry::new();
        assert!(registry.is_supported_file("seg_nucleus.tif"));
        assert!(registry.is_supported_file("SEG.NPY"));
        assert!(!registry.is_supported_file("table.csv"));
    }

    #[test]
    fn test_unknown_data_rejected() {
        let registry = LoaderRegistry::new();
        let err = registry.load(&[1, 2, 3, 4], Some("data.bin")).unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }
}
