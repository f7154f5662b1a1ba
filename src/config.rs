//! Pipeline configuration file.
//!
//! A single JSON document describes the store, the point jobs and the mask
//! jobs of one batch. Relative paths are resolved against the directory of
//! the configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::coords::CoordinateMapper;
use crate::error::{PipelineError, Result};
use crate::grouping::GroupKeyRule;
use crate::model::Rgba;
use crate::shapes::PointStyle;
use crate::store::NameMatch;
use crate::template::Template;

/// Log level setting for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Configuration of one pipeline batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub log_level: LogLevel,

    pub store: StoreConfig,

    #[serde(default)]
    pub points: Option<PointsConfig>,

    #[serde(default)]
    pub masks: Option<MasksConfig>,
}

/// Local store locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Catalog JSON listing datasets, images and calibration.
    pub catalog: PathBuf,

    /// Directory receiving persisted ROIs and export tables.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Point annotation from measurement tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Field delimiter of the input tables.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default)]
    pub mapper: CoordinateMapper,

    #[serde(default)]
    pub grouping: GroupKeyRule,

    #[serde(default)]
    pub style: PointStyle,

    #[serde(default)]
    pub jobs: Vec<PointsJob>,
}

fn default_delimiter() -> char {
    ','
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            mapper: CoordinateMapper::default(),
            grouping: GroupKeyRule::default(),
            style: PointStyle::default(),
            jobs: Vec::new(),
        }
    }
}

impl PointsConfig {
    pub fn with_mapper(mut self, mapper: CoordinateMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_grouping(mut self, grouping: GroupKeyRule) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_style(mut self, style: PointStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_job(mut self, job: PointsJob) -> Self {
        self.jobs.push(job);
        self
    }
}

/// One measurement table to attach to one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsJob {
    pub dataset: String,
    pub image: NameMatch,
    pub table: PathBuf,
}

/// What to do with an image that already carries shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExistingShapes {
    /// Skip the image entirely.
    #[default]
    Skip,
    /// Delete the image's mask ROIs, then annotate.
    ReplaceMasks,
}

/// Mask annotation from segmentation stacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasksConfig {
    /// Segmentation kinds to load; each becomes one ROI labelled by its kind.
    pub segmentations: Vec<String>,

    /// Source path template with `{dataset}`, `{image}`, `{segmentation}`
    /// and any job variable as placeholders.
    pub path_template: Template,

    /// Sources that may be absent without failing the image.
    #[serde(default)]
    pub allow_missing: Vec<PathBuf>,

    #[serde(default = "default_fill_color")]
    pub fill_color: Option<Rgba>,

    #[serde(default)]
    pub existing: ExistingShapes,

    #[serde(default)]
    pub jobs: Vec<MasksJob>,

    /// Directory rendered relative source paths are joined to.
    #[serde(skip)]
    pub source_root: PathBuf,
}

fn default_fill_color() -> Option<Rgba> {
    Some(Rgba::rgba(255, 255, 255, 128))
}

impl MasksConfig {
    pub fn new(segmentations: Vec<String>, path_template: Template) -> Self {
        Self {
            segmentations,
            path_template,
            allow_missing: Vec::new(),
            fill_color: default_fill_color(),
            existing: ExistingShapes::default(),
            jobs: Vec::new(),
            source_root: PathBuf::new(),
        }
    }

    /// Resolve a rendered source path against [`MasksConfig::source_root`].
    pub fn source_path(&self, rendered: &str) -> PathBuf {
        self.source_root.join(rendered)
    }

    pub fn with_existing(mut self, existing: ExistingShapes) -> Self {
        self.existing = existing;
        self
    }

    pub fn with_allowed_missing(mut self, path: impl Into<PathBuf>) -> Self {
        self.allow_missing.push(path.into());
        self
    }

    pub fn with_job(mut self, job: MasksJob) -> Self {
        self.jobs.push(job);
        self
    }
}

/// One image to receive segmentation masks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasksJob {
    pub dataset: String,
    pub image: NameMatch,

    /// Extra placeholder values for the path template.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl PipelineConfig {
    /// Create a configuration with no jobs.
    pub fn new(store: StoreConfig) -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            store,
            points: None,
            masks: None,
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(PipelineError::config(format!(
                "configuration file version {} is newer than supported version {}",
                config.version, CONFIG_VERSION
            )));
        }

        Ok(config)
    }

    /// Load a configuration file, resolving relative paths against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&json)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Make every relative path absolute with respect to `base`.
    ///
    /// The mask path template is left untouched; its rendered paths are
    /// joined with `base` when used.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        resolve(&mut self.store.catalog);
        resolve(&mut self.store.output_dir);
        if let Some(points) = &mut self.points {
            points.jobs.iter_mut().for_each(|job| resolve(&mut job.table));
        }
        if let Some(masks) = &mut self.masks {
            masks.allow_missing.iter_mut().for_each(resolve);
            masks.source_root = base.to_path_buf();
        }
    }
}
