//! Error types for the ROI pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning tables and stacks into ROIs.
///
/// Every variant is fatal for the image being processed; the batch runner
/// records it and moves on to the next image.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration is incomplete or inconsistent (missing calibration,
    /// unknown column, bad template).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Target dataset or image could not be resolved to exactly one object.
    #[error("Lookup failed: {message}")]
    Lookup {
        /// Description of what was looked up
        message: String,
    },

    /// A persisted shape does not match the shape submitted in its position.
    #[error("Integrity violation at shape {index}: expected {expected}, found {found}")]
    Integrity {
        /// Position of the shape within its ROI
        index: usize,
        /// Value recomputed from the originating input
        expected: String,
        /// Value returned by the store
        found: String,
    },

    /// Number of persisted shapes differs from the number submitted.
    #[error("Shape count mismatch: expected {expected}, found {found}")]
    ShapeCountMismatch {
        /// Number of shapes (or rows) expected
        expected: usize,
        /// Number of shapes actually returned
        found: usize,
    },

    /// Segmentation source file is absent and not allow-listed.
    #[error("Missing source file: {path:?}")]
    MissingSource {
        /// Path where the source was expected
        path: PathBuf,
    },

    /// Malformed delimited input.
    #[error("Table error on line {line}: {message}")]
    Table {
        /// 1-based line number in the input
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// Persistence backend failure.
    #[error("Store error: {0}")]
    Store(String),

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raster image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Multi-page TIFF decoding error
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// NumPy array decoding error
    #[error("NumPy error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),
}

impl PipelineError {
    /// Create a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a lookup error with a message.
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup {
            message: message.into(),
        }
    }

    /// Create an integrity error for the shape at `index`.
    pub fn integrity(index: usize, expected: impl ToString, found: impl ToString) -> Self {
        Self::Integrity {
            index,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create a table error for the given 1-based line.
    pub fn table(line: usize, message: impl Into<String>) -> Self {
        Self::Table {
            line,
            message: message.into(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Short machine-friendly name of the error class, used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Lookup { .. } => "lookup",
            Self::Integrity { .. } => "integrity",
            Self::ShapeCountMismatch { .. } => "shape_count_mismatch",
            Self::MissingSource { .. } => "missing_source",
            Self::Table { .. } => "table",
            Self::Store(_) => "store",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Image(_) => "image",
            Self::Tiff(_) => "tiff",
            Self::Npy(_) => "npy",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
