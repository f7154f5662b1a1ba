//! Per-image outcomes of a batch run.

use std::fmt;

use crate::error::PipelineError;
use crate::model::ImageId;

/// What happened to one image that was processed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// ROIs were created.
    Completed {
        image_id: ImageId,
        rois: usize,
        shapes: usize,
    },
    /// The image already carried shapes; nothing was written.
    AlreadyProcessed { image_id: ImageId },
}

/// Which kind of job produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Points,
    Masks,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Points => write!(f, "points"),
            JobKind::Masks => write!(f, "masks"),
        }
    }
}

/// Result of one job.
#[derive(Debug)]
pub struct ImageReport {
    pub kind: JobKind,
    pub dataset: String,
    /// Display form of the image selector.
    pub image: String,
    pub result: Result<ImageOutcome, PipelineError>,
}

impl ImageReport {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Collected outcomes of a batch, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    entries: Vec<ImageReport>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a job result, logging failures.
    pub fn record(
        &mut self,
        kind: JobKind,
        dataset: &str,
        image: String,
        result: Result<ImageOutcome, PipelineError>,
    ) {
        if let Err(e) = &result {
            log::error!(
                "{} job for image {} in dataset '{}' failed ({}): {}",
                kind,
                image,
                dataset,
                e.kind(),
                e
            );
        }
        self.entries.push(ImageReport {
            kind,
            dataset: dataset.to_string(),
            image,
            result,
        });
    }

    pub fn entries(&self) -> &[ImageReport] {
        &self.entries
    }

    pub fn completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(ImageOutcome::Completed { .. })))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(ImageOutcome::AlreadyProcessed { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} jobs: {} completed, {} already processed, {} failed",
            self.entries.len(),
            self.completed(),
            self.skipped(),
            self.failed()
        )
    }
}
