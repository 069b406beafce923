//! Owned RGBA8 pixel buffer.
//!
//! [`PixelBuffer`] is the single container every filter in this crate operates
//! on: a contiguous, row-major RGBA8 byte buffer with no row padding.
//!
//! # Memory Layout
//!
//! ```text
//! Memory: [R G B A R G B A ...]  <- Row 0
//!         [R G B A R G B A ...]  <- Row 1
//!         ...
//! ```
//!
//! # Invariant
//!
//! `data.len() == width * height * 4` holds at every observable point. Any
//! operation that changes dimensions builds the new buffer off to the side and
//! swaps it in on success, so a failed operation leaves the previous pixels
//! untouched.
//!
//! # Example
//!
//! ```rust
//! use rasterpipe_core::PixelBuffer;
//!
//! let mut buf = PixelBuffer::from_rgba8(vec![0, 0, 0, 255], 1, 1).unwrap();
//! buf.invert();
//! assert_eq!(buf.as_bytes(), &[255, 255, 255, 255]);
//! ```

use crate::error::{CoreError, CoreResult};
use crate::filters::FilterOp;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Owned, contiguous RGBA8 image buffer.
///
/// All filters mutate the buffer in place; see the module docs for the layout
/// and the buffer invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a buffer from raw RGBA8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDimensions`] if the area is zero, the
    /// byte count does not equal `width * height * 4`, or the size
    /// calculation overflows `usize`.
    pub fn from_rgba8(data: Vec<u8>, width: u32, height: u32) -> CoreResult<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(CoreError::invalid_dimensions(
                width,
                height,
                format!("expected {} bytes, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a zero-filled buffer (transparent black).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDimensions`] on zero area or overflow.
    pub fn new(width: u32, height: u32) -> CoreResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Buffer width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Buffer size in bytes (`width * height * 4`).
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Read-only view of the pixel bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view of the pixel bytes.
    ///
    /// The length of the slice must not be changed through this reference;
    /// point filters use it directly.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer and returns the raw bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Copies the pixel bytes into a caller-supplied buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SizeMismatch`] unless `dst.len()` equals
    /// [`byte_len`](Self::byte_len) exactly. Nothing is written on failure.
    pub fn copy_to(&self, dst: &mut [u8]) -> CoreResult<()> {
        if dst.len() != self.data.len() {
            return Err(CoreError::size_mismatch(self.data.len(), dst.len()));
        }
        dst.copy_from_slice(&self.data);
        Ok(())
    }

    /// Applies a single filter operation in place.
    ///
    /// Dispatches to the corresponding filter method; every [`FilterOp`] is
    /// total over a valid buffer.
    pub fn apply(&mut self, op: FilterOp) {
        match op {
            FilterOp::Grayscale => self.grayscale(),
            FilterOp::Brightness(value) => self.brightness(value),
            FilterOp::Contrast(value) => self.contrast(value),
            FilterOp::Blur(sigma) => self.blur(sigma),
            FilterOp::Sharpen => self.sharpen(),
            FilterOp::EdgeDetect => self.edge_detect(),
            FilterOp::Invert => self.invert(),
            FilterOp::Sepia => self.sepia(),
        }
    }

    /// Replaces the contents atomically after a dimension-changing op.
    ///
    /// Internal use only; `data.len()` must equal `width * height * 4`.
    pub(crate) fn replace(&mut self, data: Vec<u8>, width: u32, height: u32) {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * BYTES_PER_PIXEL
        );
        self.data = data;
        self.width = width;
        self.height = height;
    }
}

/// Validated byte length for a `width x height` RGBA8 buffer.
fn byte_len(width: u32, height: u32) -> CoreResult<usize> {
    if width == 0 || height == 0 {
        return Err(CoreError::invalid_dimensions(width, height, "zero area"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| CoreError::invalid_dimensions(width, height, "byte size overflows usize"))
}
