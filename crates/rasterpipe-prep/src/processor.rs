//! Safe wrapper owning one bridge handle.
//!
//! [`Processor`] is the binding layer between caller-side arrays and the
//! C-ABI bridge: it coerces grayscale/RGB/RGBA input into RGBA8, pushes the
//! bytes across [`rasterpipe_capi`], and reads results back out. Each
//! instance owns at most one handle; the handle is released exactly once, on
//! [`release`](Processor::release) or on drop, whichever comes first.
//!
//! A `Processor` holds a raw handle pointer and is deliberately not `Send` or
//! `Sync`: use one instance per thread.
//!
//! # Example
//!
//! ```rust
//! use ndarray::ArrayD;
//! use rasterpipe_prep::Processor;
//!
//! let image = ArrayD::<u8>::zeros(ndarray::IxDyn(&[4, 4, 3]));
//! let mut processor = Processor::new();
//! processor.load(&image).unwrap();
//! processor.grayscale().unwrap().invert().unwrap();
//! let out = processor.read_out().unwrap();
//! assert_eq!(out.shape(), &[4, 4, 4]);
//! ```

use std::ffi::CStr;
use std::ptr::NonNull;

use ndarray::{Array3, ArrayD};
use rasterpipe_capi as capi;
use rasterpipe_core::FilterOp;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::config::parse_filter;
use crate::error::{PrepError, PrepResult};

/// Safe owner of at most one bridge handle.
///
/// See the module docs for the ownership rules.
#[derive(Debug, Default)]
pub struct Processor {
    handle: Option<NonNull<capi::RasterHandle>>,
}

impl Processor {
    /// Creates a processor with no image loaded.
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Loads an image, replacing (and releasing) any previous buffer.
    ///
    /// Accepted shapes:
    /// - rank 2 `(h, w)` - grayscale, duplicated into R,G,B with alpha 255
    /// - rank 3 `(h, w, 3)` - RGB, alpha 255 appended
    /// - rank 3 `(h, w, 4)` - RGBA, passed through
    ///
    /// # Errors
    ///
    /// - [`PrepError::InvalidShape`] on any other rank or channel count
    /// - [`PrepError::InvalidDimensions`] on zero area
    /// - [`PrepError::OperationFailed`] if the bridge refuses the buffer
    pub fn load(&mut self, image: &ArrayD<u8>) -> PrepResult<&mut Self> {
        let (height, width, rgba) = coerce_rgba8(image)?;
        self.release();

        let handle = unsafe { capi::rasterpipe_create(rgba.as_ptr(), width, height) };
        self.handle = Some(NonNull::new(handle).ok_or(PrepError::OperationFailed {
            op: "create",
            code: capi::RASTERPIPE_ERR_OPERATION,
        })?);
        trace!(width, height, "image loaded");
        Ok(self)
    }

    /// Current `(width, height)`, or `None` with no image loaded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.handle.map(|h| unsafe {
            (
                capi::rasterpipe_get_width(h.as_ptr()),
                capi::rasterpipe_get_height(h.as_ptr()),
            )
        })
    }

    /// Reads the current buffer back out as an `(h, w, 4)` RGBA8 array.
    ///
    /// Dimensions reflect any resize applied since loading.
    ///
    /// # Errors
    ///
    /// [`PrepError::NotLoaded`] with no image, [`PrepError::OperationFailed`]
    /// if the bridge copy fails.
    pub fn read_out(&self) -> PrepResult<Array3<u8>> {
        let handle = self.handle.ok_or(PrepError::NotLoaded)?;
        let (width, height, size) = unsafe {
            (
                capi::rasterpipe_get_width(handle.as_ptr()) as usize,
                capi::rasterpipe_get_height(handle.as_ptr()) as usize,
                capi::rasterpipe_get_data_size(handle.as_ptr()),
            )
        };

        let mut out = vec![0u8; size];
        let code = unsafe { capi::rasterpipe_copy_to(handle.as_ptr(), out.as_mut_ptr(), size) };
        check("copy_to", code)?;

        Array3::from_shape_vec((height, width, 4), out)
            .map_err(|e| PrepError::InvalidShape(e.to_string()))
    }

    /// Applies one typed filter operation.
    ///
    /// # Errors
    ///
    /// [`PrepError::NotLoaded`] with no image, [`PrepError::OperationFailed`]
    /// on a non-zero bridge result.
    pub fn apply(&mut self, op: FilterOp) -> PrepResult<&mut Self> {
        let handle = self.handle.ok_or(PrepError::NotLoaded)?.as_ptr();
        trace!(op = op.name(), "applying filter");
        let code = unsafe {
            match op {
                FilterOp::Grayscale => capi::rasterpipe_grayscale(handle),
                FilterOp::Brightness(value) => capi::rasterpipe_brightness(handle, value),
                FilterOp::Contrast(value) => capi::rasterpipe_contrast(handle, value),
                FilterOp::Blur(sigma) => capi::rasterpipe_blur(handle, sigma),
                FilterOp::Sharpen => capi::rasterpipe_sharpen(handle),
                FilterOp::EdgeDetect => capi::rasterpipe_edge_detect(handle),
                FilterOp::Invert => capi::rasterpipe_invert(handle),
                FilterOp::Sepia => capi::rasterpipe_sepia(handle),
            }
        };
        check(op.name(), code)?;
        Ok(self)
    }

    /// Parses and applies text filter tokens one at a time, in order.
    ///
    /// Tokens already applied stay applied when a later token fails to parse
    /// or to run; the error identifies the failing token.
    pub fn apply_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> PrepResult<&mut Self> {
        for token in tokens {
            let op = parse_filter(token.as_ref())?;
            self.apply(op)?;
        }
        Ok(self)
    }

    /// Converts R,G,B to luma in place.
    pub fn grayscale(&mut self) -> PrepResult<&mut Self> {
        self.apply(FilterOp::Grayscale)
    }

    /// Adjusts brightness; `value` in `[-1, 1]`.
    pub fn brightness(&mut self, value: f32) -> PrepResult<&mut Self> {
        self.apply(FilterOp::Brightness(value))
    }

    /// Adjusts contrast; `value >= 0`, 1 is identity.
    pub fn contrast(&mut self, value: f32) -> PrepResult<&mut Self> {
        self.apply(FilterOp::Contrast(value))
    }

    /// Applies a Gaussian blur with the given sigma.
    pub fn blur(&mut self, sigma: f32) -> PrepResult<&mut Self> {
        self.apply(FilterOp::Blur(sigma))
    }

    /// Sharpens with the fixed unsharp kernel.
    pub fn sharpen(&mut self) -> PrepResult<&mut Self> {
        self.apply(FilterOp::Sharpen)
    }

    /// Runs Sobel edge detection.
    pub fn edge_detect(&mut self) -> PrepResult<&mut Self> {
        self.apply(FilterOp::EdgeDetect)
    }

    /// Inverts R,G,B.
    pub fn invert(&mut self) -> PrepResult<&mut Self> {
        self.apply(FilterOp::Invert)
    }

    /// Applies the sepia tone matrix.
    pub fn sepia(&mut self) -> PrepResult<&mut Self> {
        self.apply(FilterOp::Sepia)
    }

    /// Resizes the buffer (bilinear policy, fixed).
    ///
    /// # Errors
    ///
    /// [`PrepError::NotLoaded`] with no image; [`PrepError::OperationFailed`]
    /// on zero target area (the buffer is left unchanged).
    pub fn resize(&mut self, width: u32, height: u32) -> PrepResult<&mut Self> {
        let handle = self.handle.ok_or(PrepError::NotLoaded)?.as_ptr();
        let code = unsafe { capi::rasterpipe_resize(handle, width, height) };
        check("resize", code)?;
        Ok(self)
    }

    /// Releases the handle now. Safe to call repeatedly; later calls and the
    /// eventual drop are no-ops.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            unsafe { capi::rasterpipe_free(handle.as_ptr()) };
        }
    }

    /// Build identifier of the underlying bridge.
    pub fn version() -> &'static str {
        let raw = unsafe { CStr::from_ptr(capi::rasterpipe_version()) };
        raw.to_str().unwrap_or("unknown")
    }
}

impl Drop for Processor {
    fn drop(&mut self) {
        self.release();
    }
}

/// Maps a bridge result code to the error taxonomy.
#[inline]
fn check(op: &'static str, code: i32) -> PrepResult<()> {
    if code == capi::RASTERPIPE_OK {
        Ok(())
    } else {
        Err(PrepError::OperationFailed { op, code })
    }
}

/// Coerces a rank-2 or rank-3 byte array into `(height, width, rgba_bytes)`.
fn coerce_rgba8(image: &ArrayD<u8>) -> PrepResult<(u32, u32, Vec<u8>)> {
    let shape = image.shape();
    let (height, width, channels) = match *shape {
        [h, w] => (h, w, 1usize),
        [h, w, c @ (3 | 4)] => (h, w, c),
        [_, _, c] => {
            return Err(PrepError::InvalidShape(format!(
                "expected 3 or 4 channels, got {c}"
            )));
        }
        _ => {
            return Err(PrepError::InvalidShape(format!(
                "expected rank 2 or 3, got rank {}",
                shape.len()
            )));
        }
    };
    if height == 0 || width == 0 {
        return Err(PrepError::InvalidDimensions {
            width: width as u32,
            height: height as u32,
        });
    }

    // Logical (row-major) iteration order is independent of the array's
    // memory layout, so non-contiguous views coerce correctly too.
    let flat: Vec<u8> = image.iter().copied().collect();
    let mut rgba = Vec::with_capacity(height * width * 4);
    match channels {
        1 => {
            for &v in &flat {
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
        }
        3 => {
            for px in flat.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        }
        _ => rgba = flat,
    }

    Ok((height as u32, width as u32, rgba))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    fn rgb_image(h: usize, w: usize, rgb: [u8; 3]) -> ArrayD<u8> {
        Array::from_shape_fn(IxDyn(&[h, w, 3]), |idx| rgb[idx[2]])
    }

    #[test]
    fn test_load_read_out_roundtrip_rgba() {
        let image = Array::from_shape_fn(IxDyn(&[3, 5, 4]), |idx| {
            (idx[0] * 37 + idx[1] * 11 + idx[2] * 3) as u8
        });
        let mut p = Processor::new();
        p.load(&image).unwrap();
        let out = p.read_out().unwrap();
        assert_eq!(out.shape(), &[3, 5, 4]);
        assert_eq!(out.into_dyn(), image);
    }

    #[test]
    fn test_load_grayscale_duplicates_channels() {
        let image = Array::from_shape_fn(IxDyn(&[2, 2]), |idx| (idx[0] * 2 + idx[1]) as u8 * 10);
        let mut p = Processor::new();
        p.load(&image).unwrap();
        let out = p.read_out().unwrap();
        assert_eq!(out.shape(), &[2, 2, 4]);
        for (i, px) in out.as_slice().unwrap().chunks(4).enumerate() {
            let v = (i as u8) * 10;
            assert_eq!(px, &[v, v, v, 255]);
        }
    }

    #[test]
    fn test_load_rgb_appends_alpha() {
        let image = rgb_image(2, 2, [9, 8, 7]);
        let mut p = Processor::new();
        p.load(&image).unwrap();
        let out = p.read_out().unwrap();
        for px in out.as_slice().unwrap().chunks(4) {
            assert_eq!(px, &[9, 8, 7, 255]);
        }
    }

    #[test]
    fn test_load_rejects_bad_shapes() {
        let mut p = Processor::new();

        let rank1 = Array::from_vec(vec![1u8, 2, 3]).into_dyn();
        assert!(matches!(
            p.load(&rank1).unwrap_err(),
            PrepError::InvalidShape(_)
        ));

        let rank4 = Array::<u8, _>::zeros(IxDyn(&[1, 2, 2, 3]));
        assert!(matches!(
            p.load(&rank4).unwrap_err(),
            PrepError::InvalidShape(_)
        ));

        let two_channels = Array::<u8, _>::zeros(IxDyn(&[2, 2, 2]));
        assert!(matches!(
            p.load(&two_channels).unwrap_err(),
            PrepError::InvalidShape(_)
        ));

        let empty = Array::<u8, _>::zeros(IxDyn(&[0, 4, 3]));
        assert!(matches!(
            p.load(&empty).unwrap_err(),
            PrepError::InvalidDimensions { .. }
        ));
    }

    #[test]
    fn test_operations_without_load_fail_not_loaded() {
        let mut p = Processor::new();
        assert!(matches!(p.grayscale().unwrap_err(), PrepError::NotLoaded));
        assert!(matches!(p.resize(2, 2).unwrap_err(), PrepError::NotLoaded));
        assert!(matches!(p.read_out().unwrap_err(), PrepError::NotLoaded));
        assert!(p.dimensions().is_none());
    }

    #[test]
    fn test_chaining_and_resize_updates_dimensions() {
        let image = rgb_image(8, 6, [100, 100, 100]);
        let mut p = Processor::new();
        p.load(&image).unwrap();
        p.brightness(0.1).unwrap().contrast(1.2).unwrap();
        p.resize(3, 4).unwrap();
        assert_eq!(p.dimensions(), Some((3, 4)));
        assert_eq!(p.read_out().unwrap().shape(), &[4, 3, 4]);
    }

    #[test]
    fn test_resize_to_zero_is_operation_failed() {
        let image = rgb_image(4, 4, [1, 2, 3]);
        let mut p = Processor::new();
        p.load(&image).unwrap();
        let err = p.resize(0, 4).unwrap_err();
        assert!(matches!(
            err,
            PrepError::OperationFailed { op: "resize", .. }
        ));
        // Buffer still usable afterwards.
        assert_eq!(p.dimensions(), Some((4, 4)));
    }

    #[test]
    fn test_release_is_idempotent() {
        let image = rgb_image(2, 2, [0, 0, 0]);
        let mut p = Processor::new();
        p.load(&image).unwrap();
        p.release();
        p.release();
        assert!(matches!(p.read_out().unwrap_err(), PrepError::NotLoaded));
        // Drop after release is also a no-op.
    }

    #[test]
    fn test_load_replaces_previous_buffer() {
        let mut p = Processor::new();
        p.load(&rgb_image(4, 4, [1, 1, 1])).unwrap();
        p.load(&rgb_image(2, 6, [2, 2, 2])).unwrap();
        assert_eq!(p.dimensions(), Some((6, 2)));
        let out = p.read_out().unwrap();
        assert_eq!(&out.as_slice().unwrap()[..4], &[2, 2, 2, 255]);
    }

    #[test]
    fn test_apply_tokens_partial_effect_on_unknown() {
        let mut p = Processor::new();
        p.load(&rgb_image(2, 2, [200, 100, 50])).unwrap();
        let err = p
            .apply_tokens(&["grayscale", "foo", "invert"])
            .unwrap_err();
        assert!(matches!(err, PrepError::UnknownFilter(ref t) if t == "foo"));
        // Grayscale stuck; invert never ran.
        let out = p.read_out().unwrap();
        assert_eq!(&out.as_slice().unwrap()[..4], &[124, 124, 124, 255]);
    }

    #[test]
    fn test_version_reports_build() {
        assert!(Processor::version().starts_with("rasterpipe "));
    }
}
