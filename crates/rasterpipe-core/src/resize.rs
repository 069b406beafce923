//! Bilinear resize for RGBA8 buffers.
//!
//! Interpolation policy is fixed: **bilinear**. Destination pixel centers map
//! to source space with the half-pixel convention
//! `src = (dst + 0.5) * scale - 0.5`, the four surrounding samples are
//! clamped to the image and blended per channel. The same policy applies to
//! upscaling and downscaling.
//!
//! Resizing to the current dimensions is an exact no-op.
//!
//! # Example
//!
//! ```rust
//! use rasterpipe_core::PixelBuffer;
//!
//! let mut buf = PixelBuffer::new(8, 8).unwrap();
//! buf.resize(4, 4).unwrap();
//! assert_eq!((buf.width(), buf.height()), (4, 4));
//! ```

use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::buffer::{PixelBuffer, BYTES_PER_PIXEL};
use crate::error::{CoreError, CoreResult};

impl PixelBuffer {
    /// Resizes the buffer to `new_width x new_height` using bilinear
    /// interpolation.
    ///
    /// The buffer is reallocated; on success dimensions and data change
    /// together, on failure the buffer is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDimensions`] if the target area is zero or
    /// the target byte size overflows `usize`.
    pub fn resize(&mut self, new_width: u32, new_height: u32) -> CoreResult<()> {
        if new_width == 0 || new_height == 0 {
            return Err(CoreError::invalid_dimensions(
                new_width,
                new_height,
                "zero area",
            ));
        }
        if new_width == self.width() && new_height == self.height() {
            return Ok(());
        }
        let new_len = (new_width as usize)
            .checked_mul(new_height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| {
                CoreError::invalid_dimensions(new_width, new_height, "byte size overflows usize")
            })?;

        debug!(
            from_w = self.width(),
            from_h = self.height(),
            to_w = new_width,
            to_h = new_height,
            "bilinear resize"
        );

        let src = self.as_bytes();
        let src_w = self.width() as usize;
        let src_h = self.height() as usize;
        let dst_w = new_width as usize;
        let dst_h = new_height as usize;
        let scale_x = src_w as f32 / dst_w as f32;
        let scale_y = src_h as f32 / dst_h as f32;

        let mut dst = vec![0u8; new_len];
        dst.par_chunks_mut(dst_w * BYTES_PER_PIXEL)
            .enumerate()
            .for_each(|(y, row)| {
                let center_y = (y as f32 + 0.5) * scale_y - 0.5;
                let y0 = (center_y.floor() as isize).clamp(0, src_h as isize - 1) as usize;
                let y1 = (y0 + 1).min(src_h - 1);
                let fy = (center_y - y0 as f32).clamp(0.0, 1.0);

                for x in 0..dst_w {
                    let center_x = (x as f32 + 0.5) * scale_x - 0.5;
                    let x0 = (center_x.floor() as isize).clamp(0, src_w as isize - 1) as usize;
                    let x1 = (x0 + 1).min(src_w - 1);
                    let fx = (center_x - x0 as f32).clamp(0.0, 1.0);

                    let p00 = &src[(y0 * src_w + x0) * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
                    let p10 = &src[(y0 * src_w + x1) * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
                    let p01 = &src[(y1 * src_w + x0) * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
                    let p11 = &src[(y1 * src_w + x1) * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];

                    let idx = x * BYTES_PER_PIXEL;
                    for c in 0..BYTES_PER_PIXEL {
                        let top = p00[c] as f32 + (p10[c] as f32 - p00[c] as f32) * fx;
                        let bottom = p01[c] as f32 + (p11[c] as f32 - p01[c] as f32) * fx;
                        let value = top + (bottom - top) * fy;
                        row[idx + c] = value.clamp(0.0, 255.0).round() as u8;
                    }
                }
            });

        self.replace(dst, new_width, new_height);
        Ok(())
    }
}
