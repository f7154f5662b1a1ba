//! Conversion from physical measurement units to image pixel coordinates.
//!
//! Each [`CoordinateConvention`] variant owns its transform parameters and is
//! chosen explicitly in the configuration. The z coordinate is discretized to
//! a plane index with the convention's [`RoundingPolicy`]; the same mapping is
//! recomputed after persistence to verify that the store kept shape order.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::table::Record;

/// Rounding used to turn a scaled z value into a plane index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// 2.5 -> 3, -2.5 -> -3
    #[default]
    HalfAwayFromZero,
    /// 2.5 -> 2, 3.5 -> 4
    HalfEven,
}

impl RoundingPolicy {
    pub fn round(self, value: f64) -> f64 {
        match self {
            RoundingPolicy::HalfAwayFromZero => value.round(),
            RoundingPolicy::HalfEven => value.round_ties_even(),
        }
    }

    /// Round to an integer index. Non-finite input is rejected.
    pub fn discretize(self, value: f64) -> Result<i64> {
        if !value.is_finite() {
            return Err(PipelineError::config(format!(
                "cannot discretize non-finite value {}",
                value
            )));
        }
        Ok(self.round(value) as i64)
    }
}

/// Physical size of one pixel along each axis, as stored with the image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub pixel_size_x: Option<f64>,
    #[serde(default)]
    pub pixel_size_y: Option<f64>,
    #[serde(default)]
    pub pixel_size_z: Option<f64>,
}

impl Calibration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            pixel_size_x: Some(x),
            pixel_size_y: Some(y),
            pixel_size_z: Some(z),
        }
    }
}

/// Named coordinate conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordinateConvention {
    /// Divide by the target image's own per-axis pixel size.
    Calibrated {
        #[serde(default)]
        swap_axes: bool,
        #[serde(default)]
        z_rounding: RoundingPolicy,
    },
    /// Divide by a fixed pixel size; `z_step` defaults to `pixel_size`.
    Fixed {
        pixel_size: f64,
        #[serde(default)]
        z_step: Option<f64>,
        #[serde(default)]
        swap_axes: bool,
        #[serde(default)]
        z_rounding: RoundingPolicy,
    },
}

impl Default for CoordinateConvention {
    fn default() -> Self {
        CoordinateConvention::Calibrated {
            swap_axes: false,
            z_rounding: RoundingPolicy::default(),
        }
    }
}

impl CoordinateConvention {
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateConvention::Calibrated { .. } => "calibrated",
            CoordinateConvention::Fixed { .. } => "fixed",
        }
    }

    pub fn swap_axes(&self) -> bool {
        match self {
            CoordinateConvention::Calibrated { swap_axes, .. }
            | CoordinateConvention::Fixed { swap_axes, .. } => *swap_axes,
        }
    }

    pub fn z_rounding(&self) -> RoundingPolicy {
        match self {
            CoordinateConvention::Calibrated { z_rounding, .. }
            | CoordinateConvention::Fixed { z_rounding, .. } => *z_rounding,
        }
    }

    /// Per-axis divisors `[x, y, z]`.
    ///
    /// Fails when a calibrated convention has no calibration value for an
    /// axis, or when any divisor is not strictly positive.
    pub fn divisors(&self, calibration: Option<&Calibration>) -> Result<[f64; 3]> {
        let divisors = match self {
            CoordinateConvention::Calibrated { .. } => {
                let cal = calibration.ok_or_else(|| {
                    PipelineError::config("calibrated convention requires image calibration")
                })?;
                let axis = |value: Option<f64>, name: &str| {
                    value.ok_or_else(|| {
                        PipelineError::config(format!("image has no pixel size for axis {}", name))
                    })
                };
                [
                    axis(cal.pixel_size_x, "x")?,
                    axis(cal.pixel_size_y, "y")?,
                    axis(cal.pixel_size_z, "z")?,
                ]
            }
            CoordinateConvention::Fixed {
                pixel_size, z_step, ..
            } => [*pixel_size, *pixel_size, z_step.unwrap_or(*pixel_size)],
        };

        if let Some(bad) = divisors.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
            return Err(PipelineError::config(format!(
                "{} convention has invalid pixel size {}",
                self.name(),
                bad
            )));
        }
        Ok(divisors)
    }
}

/// Input columns holding the physical coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateColumns {
    #[serde(default = "default_x_column")]
    pub x: String,
    #[serde(default = "default_y_column")]
    pub y: String,
    #[serde(default = "default_z_column")]
    pub z: String,
    /// Optional timepoint column; points are placed at t = 0 without it.
    #[serde(default)]
    pub t: Option<String>,
}

fn default_x_column() -> String {
    "x_um_abs".to_string()
}

fn default_y_column() -> String {
    "y_um_abs".to_string()
}

fn default_z_column() -> String {
    "z_um_abs".to_string()
}

impl Default for CoordinateColumns {
    fn default() -> Self {
        Self {
            x: default_x_column(),
            y: default_y_column(),
            z: default_z_column(),
            t: None,
        }
    }
}

impl CoordinateColumns {
    /// All column names the mapper reads.
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.x.as_str(), self.y.as_str(), self.z.as_str()];
        if let Some(t) = &self.t {
            names.push(t.as_str());
        }
        names
    }
}

/// Image-space coordinate of one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedPoint {
    pub x: f64,
    pub y: f64,
    pub z: i64,
    pub t: i64,
}

/// Maps records to image coordinates under one convention.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateMapper {
    #[serde(default)]
    pub columns: CoordinateColumns,
    #[serde(default)]
    pub convention: CoordinateConvention,
}

impl CoordinateMapper {
    pub fn new(columns: CoordinateColumns, convention: CoordinateConvention) -> Self {
        Self {
            columns,
            convention,
        }
    }

    /// Map one record to image coordinates.
    pub fn map(&self, record: &Record, calibration: Option<&Calibration>) -> Result<MappedPoint> {
        let [dx, dy, dz] = self.convention.divisors(calibration)?;

        let x = record.f64(&self.columns.x)? / dx;
        let y = record.f64(&self.columns.y)? / dy;
        let z = self
            .convention
            .z_rounding()
            .discretize(record.f64(&self.columns.z)? / dz)?;
        let t = match &self.columns.t {
            Some(column) => record.i64(column)?,
            None => 0,
        };

        let (x, y) = if self.convention.swap_axes() {
            (y, x)
        } else {
            (x, y)
        };

        Ok(MappedPoint { x, y, z, t })
    }

    /// Recompute only the discretized plane of a record.
    pub fn plane(&self, record: &Record, calibration: Option<&Calibration>) -> Result<i64> {
        let [_, _, dz] = self.convention.divisors(calibration)?;
        self.convention
            .z_rounding()
            .discretize(record.f64(&self.columns.z)? / dz)
    }
}
