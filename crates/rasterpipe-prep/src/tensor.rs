//! Tensor results produced by the pipeline.
//!
//! A [`Tensor`] is a plain numeric array in planar layout: `(C, H, W)` for a
//! single image, `(N, C, H, W)` for a batch. There is no dependency on any ML
//! framework; downstream consumers construct their own tensors from the
//! underlying `ndarray` storage.

use half::f16;
use ndarray::{ArrayD, Axis};

use crate::config::OutputDtype;
use crate::error::{PrepError, PrepResult};

/// A processed image (or batch) in planar layout.
///
/// The variant matches the configured
/// [`output_dtype`](crate::PreprocessConfig::output_dtype).
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    /// 32-bit float data.
    F32(ArrayD<f32>),
    /// 16-bit float data.
    F16(ArrayD<f16>),
    /// Byte data.
    U8(ArrayD<u8>),
}

impl Tensor {
    /// Tensor shape: `(C, H, W)` for a single image, `(N, C, H, W)` for a
    /// batch.
    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::F32(a) => a.shape(),
            Tensor::F16(a) => a.shape(),
            Tensor::U8(a) => a.shape(),
        }
    }

    /// Element type of this tensor.
    pub fn dtype(&self) -> OutputDtype {
        match self {
            Tensor::F32(_) => OutputDtype::F32,
            Tensor::F16(_) => OutputDtype::F16,
            Tensor::U8(_) => OutputDtype::U8,
        }
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        match self {
            Tensor::F32(a) => a.len(),
            Tensor::F16(a) => a.len(),
            Tensor::U8(a) => a.len(),
        }
    }

    /// `true` if the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the f32 storage, if this is an [`Tensor::F32`].
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Tensor::F32(a) => Some(a),
            _ => None,
        }
    }

    /// Borrows the f16 storage, if this is an [`Tensor::F16`].
    pub fn as_f16(&self) -> Option<&ArrayD<f16>> {
        match self {
            Tensor::F16(a) => Some(a),
            _ => None,
        }
    }

    /// Borrows the byte storage, if this is an [`Tensor::U8`].
    pub fn as_u8(&self) -> Option<&ArrayD<u8>> {
        match self {
            Tensor::U8(a) => Some(a),
            _ => None,
        }
    }

    /// Stacks per-image tensors along a new leading axis.
    ///
    /// All inputs must share dtype and shape; the result of stacking `N`
    /// `(C, H, W)` tensors is `(N, C, H, W)`.
    ///
    /// # Errors
    ///
    /// [`PrepError::EmptyBatch`] on an empty input,
    /// [`PrepError::InvalidShape`] on a dtype or shape disagreement.
    pub fn stack(tensors: Vec<Tensor>) -> PrepResult<Tensor> {
        let first = tensors.first().ok_or(PrepError::EmptyBatch)?;
        let dtype = first.dtype();
        let shape = first.shape().to_vec();
        for (i, t) in tensors.iter().enumerate() {
            if t.dtype() != dtype || t.shape() != shape {
                return Err(PrepError::InvalidShape(format!(
                    "batch item {} is {:?} {:?}, expected {:?} {:?}",
                    i,
                    t.dtype(),
                    t.shape(),
                    dtype,
                    shape
                )));
            }
        }

        match dtype {
            OutputDtype::F32 => stack_arrays(tensors, |t| match t {
                Tensor::F32(a) => a,
                _ => unreachable!("dtype checked above"),
            })
            .map(Tensor::F32),
            OutputDtype::F16 => stack_arrays(tensors, |t| match t {
                Tensor::F16(a) => a,
                _ => unreachable!("dtype checked above"),
            })
            .map(Tensor::F16),
            OutputDtype::U8 => stack_arrays(tensors, |t| match t {
                Tensor::U8(a) => a,
                _ => unreachable!("dtype checked above"),
            })
            .map(Tensor::U8),
        }
    }
}

fn stack_arrays<T: Clone>(
    tensors: Vec<Tensor>,
    unwrap: impl Fn(Tensor) -> ArrayD<T>,
) -> PrepResult<ArrayD<T>> {
    let arrays: Vec<ArrayD<T>> = tensors.into_iter().map(unwrap).collect();
    let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| PrepError::InvalidShape(e.to_string()))
}
