//! Loader for NumPy `.npy` segmentation stacks.

use std::io::Cursor;

use ndarray::{Array3, ArrayD, Axis, Ix2, Ix3};
use ndarray_npy::{ReadNpyError, ReadNpyExt};

use crate::data::loader::StackLoader;
use crate::error::{PipelineError, Result};

/// Loader for NumPy `.npy` files.
///
/// **Expected array shapes**:
/// - 2D `(rows, cols)`: a single plane
/// - 3D `(planes, rows, cols)`: a plane stack
///
/// Supported data types: `bool`, `u8`, `u16`, `i32`, `i64`, `f32`, `f64`.
/// Any nonzero value is foreground.
pub struct NpyLoader;

impl NpyLoader {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    fn to_stack<T>(array: ArrayD<T>) -> Result<Array3<u8>>
    where
        T: Foreground + Copy,
    {
        let binary = array.mapv(|v| u8::from(v.is_foreground()));
        match binary.ndim() {
            2 => {
                let plane = binary
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| PipelineError::config(format!("bad 2D array: {}", e)))?;
                Ok(plane.insert_axis(Axis(0)))
            }
            3 => binary
                .into_dimensionality::<Ix3>()
                .map_err(|e| PipelineError::config(format!("bad 3D array: {}", e))),
            n => Err(PipelineError::config(format!(
                "Unsupported array dimensions: {} (expected 2 or 3)",
                n
            ))),
        }
    }

    fn read<T>(data: &[u8]) -> std::result::Result<ArrayD<T>, ReadNpyError>
    where
        T: ndarray_npy::ReadableElement,
    {
        ArrayD::<T>::read_npy(Cursor::new(data))
    }
}

impl StackLoader for NpyLoader {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn display_name(&self) -> &'static str {
        "NumPy Array (.npy)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        data.len() >= Self::MAGIC.len() && data.starts_with(Self::MAGIC)
    }

    fn load(&self, data: &[u8]) -> Result<Array3<u8>> {
        // u8 first: the usual dtype of exported segmentations
        let first_err = match Self::read::<u8>(data) {
            Ok(array) => return Self::to_stack(array),
            Err(e) => e,
        };
        if let Ok(array) = Self::read::<bool>(data) {
            return Self::to_stack(array);
        }
        if let Ok(array) = Self::read::<u16>(data) {
            return Self::to_stack(array);
        }
        if let Ok(array) = Self::read::<i32>(data) {
            return Self::to_stack(array);
        }
        if let Ok(array) = Self::read::<i64>(data) {
            return Self::to_stack(array);
        }
        if let Ok(array) = Self::read::<f32>(data) {
            return Self::to_stack(array);
        }
        if let Ok(array) = Self::read::<f64>(data) {
            return Self::to_stack(array);
        }

        Err(first_err.into())
    }

    fn priority(&self) -> i32 {
        10
    }
}

/// Nonzero test across element types.
trait Foreground {
    fn is_foreground(self) -> bool;
}

impl Foreground for bool {
    fn is_foreground(self) -> bool {
        self
    }
}

macro_rules! impl_foreground {
    ($($t:ty),*) => {
        $(impl Foreground for $t {
            fn is_foreground(self) -> bool {
                self != (0 as $t)
            }
        })*
    };
}

impl_foreground!(u8, u16, i32, i64, f32, f64);
