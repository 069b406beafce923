//! In-place pixel filters.
//!
//! Every filter here mutates a [`PixelBuffer`] in place and is total over any
//! valid buffer: there are no failure cases and no panics for defined input
//! ranges. Point operations run data-parallel over pixels; convolutions run
//! row-parallel into a scratch buffer that is swapped in whole, so no partial
//! result is ever observable.
//!
//! # Semantics
//!
//! - [`grayscale`](PixelBuffer::grayscale) - BT.601 luma `0.299R + 0.587G + 0.114B`,
//!   rounded to the nearest byte, alpha unchanged
//! - [`brightness`](PixelBuffer::brightness) - adds `v * 255` to R,G,B, clamped
//! - [`contrast`](PixelBuffer::contrast) - scales R,G,B about midpoint 128
//! - [`blur`](PixelBuffer::blur) - separable Gaussian, clamp-to-edge sampling
//! - [`sharpen`](PixelBuffer::sharpen) - fixed 3x3 unsharp kernel
//! - [`edge_detect`](PixelBuffer::edge_detect) - Sobel magnitude on luma
//! - [`invert`](PixelBuffer::invert) - `255 - c` for R,G,B
//! - [`sepia`](PixelBuffer::sepia) - fixed 3x3 color matrix
//!
//! # Example
//!
//! ```rust
//! use rasterpipe_core::{FilterOp, PixelBuffer};
//!
//! let mut buf = PixelBuffer::from_rgba8(vec![200, 100, 50, 255], 1, 1).unwrap();
//! buf.apply(FilterOp::Grayscale);
//! buf.apply(FilterOp::Invert);
//! assert_eq!(buf.as_bytes(), &[131, 131, 131, 255]);
//! ```

use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::buffer::{PixelBuffer, BYTES_PER_PIXEL};

/// A single filter operation.
///
/// The typed equivalent of the `"name"` / `"name:value"` tokens accepted at
/// the configuration boundary; text is parsed into this enum exactly once, at
/// that boundary. Resize is a geometry operation and deliberately not a
/// `FilterOp`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterOp {
    /// Replace R,G,B with BT.601 luma.
    Grayscale,
    /// Additive brightness adjustment, value in `[-1, 1]`.
    Brightness(f32),
    /// Contrast scaling about midpoint 128, value `>= 0` (1 = identity).
    Contrast(f32),
    /// Gaussian blur with the given sigma; `sigma <= 0` is a no-op.
    Blur(f32),
    /// Fixed 3x3 unsharp-mask kernel.
    Sharpen,
    /// Sobel gradient magnitude on luma, written back as gray.
    EdgeDetect,
    /// Invert R,G,B.
    Invert,
    /// Fixed sepia color matrix.
    Sepia,
}

impl FilterOp {
    /// Stable lowercase name of the operation, matching the text form used at
    /// configuration boundaries.
    pub fn name(&self) -> &'static str {
        match self {
            FilterOp::Grayscale => "grayscale",
            FilterOp::Brightness(_) => "brightness",
            FilterOp::Contrast(_) => "contrast",
            FilterOp::Blur(_) => "blur",
            FilterOp::Sharpen => "sharpen",
            FilterOp::EdgeDetect => "edge_detect",
            FilterOp::Invert => "invert",
            FilterOp::Sepia => "sepia",
        }
    }
}

/// BT.601 luma weights for R, G, B.
pub const LUMA_R: f32 = 0.299;
/// Green luma weight.
pub const LUMA_G: f32 = 0.587;
/// Blue luma weight.
pub const LUMA_B: f32 = 0.114;

/// BT.601 luma of an RGB byte triple, rounded to the nearest byte.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    (LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32).round() as u8
}

impl PixelBuffer {
    /// Replaces each pixel's R,G,B with its BT.601 luma; alpha unchanged.
    pub fn grayscale(&mut self) {
        self.as_bytes_mut()
            .par_chunks_mut(BYTES_PER_PIXEL)
            .for_each(|px| {
                let y = luma(px[0], px[1], px[2]);
                px[0] = y;
                px[1] = y;
                px[2] = y;
            });
    }

    /// Adds `value * 255` to R,G,B, clamped to `[0, 255]`; alpha unchanged.
    ///
    /// `value` is nominally in `[-1, 1]`; values outside still clamp safely.
    pub fn brightness(&mut self, value: f32) {
        let adjustment = (value * 255.0).round() as i32;
        self.as_bytes_mut()
            .par_chunks_mut(BYTES_PER_PIXEL)
            .for_each(|px| {
                for c in &mut px[..3] {
                    *c = (*c as i32 + adjustment).clamp(0, 255) as u8;
                }
            });
    }

    /// Scales R,G,B about midpoint 128: `clamp(128 + (c - 128) * value)`.
    ///
    /// `value` of 0 collapses to flat gray, 1 is identity, larger values
    /// increase contrast. Alpha unchanged.
    pub fn contrast(&mut self, value: f32) {
        self.as_bytes_mut()
            .par_chunks_mut(BYTES_PER_PIXEL)
            .for_each(|px| {
                for c in &mut px[..3] {
                    *c = (128.0 + (*c as f32 - 128.0) * value).clamp(0.0, 255.0) as u8;
                }
            });
    }

    /// Separable Gaussian blur with the given sigma.
    ///
    /// Kernel radius is `ceil(3 * sigma)`; samples outside the image clamp to
    /// the nearest edge pixel. All four channels participate, so transparent
    /// regions soften like color does. `sigma <= 0` is a no-op.
    pub fn blur(&mut self, sigma: f32) {
        if sigma <= 0.0 {
            return;
        }
        let kernel = gaussian_kernel(sigma);
        debug!(sigma, taps = kernel.len(), "gaussian blur");

        let horizontal = convolve_rows_1d(self.as_bytes(), self.width(), &kernel);
        let vertical = convolve_cols_1d(&horizontal, self.width(), self.height(), &kernel);
        let (w, h) = (self.width(), self.height());
        self.replace(vertical, w, h);
    }

    /// Sharpens with a fixed 3x3 unsharp-mask kernel.
    ///
    /// The kernel is `[0,-1,0; -1,5,-1; 0,-1,0]`: center weight exceeds the
    /// neighbor sum and the weights sum to 1, so flat regions pass through
    /// unchanged. Edge samples clamp; alpha unchanged.
    pub fn sharpen(&mut self) {
        const KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
        let out = convolve_rgb_3x3(self.as_bytes(), self.width(), self.height(), &KERNEL);
        let (w, h) = (self.width(), self.height());
        self.replace(out, w, h);
    }

    /// Sobel edge detection.
    ///
    /// Policy: the gradient is computed on the BT.601 luma plane (not per
    /// channel); the clamped magnitude is written to R,G,B and the original
    /// alpha is preserved. Border samples clamp to the nearest edge pixel, so
    /// the operator is defined for any buffer size.
    pub fn edge_detect(&mut self) {
        const SOBEL_X: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
        const SOBEL_Y: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

        let w = self.width() as usize;
        let h = self.height() as usize;
        let src = self.as_bytes();

        let plane: Vec<i32> = src
            .par_chunks(BYTES_PER_PIXEL)
            .map(|px| luma(px[0], px[1], px[2]) as i32)
            .collect();

        let row_bytes = w * BYTES_PER_PIXEL;
        let mut out = vec![0u8; src.len()];
        out.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    let mut gx = 0i32;
                    let mut gy = 0i32;
                    for ky in 0..3 {
                        for kx in 0..3 {
                            let sx = (x as isize + kx as isize - 1).clamp(0, w as isize - 1);
                            let sy = (y as isize + ky as isize - 1).clamp(0, h as isize - 1);
                            let v = plane[sy as usize * w + sx as usize];
                            gx += v * SOBEL_X[ky * 3 + kx];
                            gy += v * SOBEL_Y[ky * 3 + kx];
                        }
                    }
                    let magnitude =
                        ((gx * gx + gy * gy) as f32).sqrt().clamp(0.0, 255.0).round() as u8;
                    let idx = x * BYTES_PER_PIXEL;
                    row[idx] = magnitude;
                    row[idx + 1] = magnitude;
                    row[idx + 2] = magnitude;
                    row[idx + 3] = src[y * row_bytes + idx + 3];
                }
            });

        let (bw, bh) = (self.width(), self.height());
        self.replace(out, bw, bh);
    }

    /// Inverts R,G,B (`255 - c`); alpha unchanged.
    pub fn invert(&mut self) {
        self.as_bytes_mut()
            .par_chunks_mut(BYTES_PER_PIXEL)
            .for_each(|px| {
                px[0] = 255 - px[0];
                px[1] = 255 - px[1];
                px[2] = 255 - px[2];
            });
    }

    /// Applies the fixed sepia color matrix, clamped to `[0, 255]`.
    pub fn sepia(&mut self) {
        self.as_bytes_mut()
            .par_chunks_mut(BYTES_PER_PIXEL)
            .for_each(|px| {
                let r = px[0] as f32;
                let g = px[1] as f32;
                let b = px[2] as f32;
                px[0] = (0.393 * r + 0.769 * g + 0.189 * b).clamp(0.0, 255.0) as u8;
                px[1] = (0.349 * r + 0.686 * g + 0.168 * b).clamp(0.0, 255.0) as u8;
                px[2] = (0.272 * r + 0.534 * g + 0.131 * b).clamp(0.0, 255.0) as u8;
            });
    }
}

/// Builds a normalized 1-D Gaussian kernel with radius `ceil(3 * sigma)`.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    let size = radius * 2 + 1;
    let sigma2 = 2.0 * sigma * sigma;

    let mut kernel = Vec::with_capacity(size);
    let mut sum = 0.0f32;
    for i in 0..size {
        let x = i as f32 - radius as f32;
        let w = (-x * x / sigma2).exp();
        kernel.push(w);
        sum += w;
    }
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Horizontal 1-D convolution pass over all four channels, row-parallel.
fn convolve_rows_1d(src: &[u8], width: u32, kernel: &[f32]) -> Vec<u8> {
    let w = width as usize;
    let radius = (kernel.len() / 2) as isize;
    let row_bytes = w * BYTES_PER_PIXEL;

    let mut dst = vec![0u8; src.len()];
    dst.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * row_bytes..][..row_bytes];
            for x in 0..w {
                let mut acc = [0.0f32; BYTES_PER_PIXEL];
                for (i, &weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + i as isize - radius).clamp(0, w as isize - 1) as usize;
                    let px = &src_row[sx * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
                    for c in 0..BYTES_PER_PIXEL {
                        acc[c] += px[c] as f32 * weight;
                    }
                }
                for c in 0..BYTES_PER_PIXEL {
                    row[x * BYTES_PER_PIXEL + c] = acc[c].clamp(0.0, 255.0).round() as u8;
                }
            }
        });
    dst
}

/// Vertical 1-D convolution pass over all four channels, row-parallel.
fn convolve_cols_1d(src: &[u8], width: u32, height: u32, kernel: &[f32]) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let radius = (kernel.len() / 2) as isize;
    let row_bytes = w * BYTES_PER_PIXEL;

    let mut dst = vec![0u8; src.len()];
    dst.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let mut acc = [0.0f32; BYTES_PER_PIXEL];
                for (i, &weight) in kernel.iter().enumerate() {
                    let sy = (y as isize + i as isize - radius).clamp(0, h as isize - 1) as usize;
                    let px = &src[(sy * w + x) * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
                    for c in 0..BYTES_PER_PIXEL {
                        acc[c] += px[c] as f32 * weight;
                    }
                }
                for c in 0..BYTES_PER_PIXEL {
                    row[x * BYTES_PER_PIXEL + c] = acc[c].clamp(0.0, 255.0).round() as u8;
                }
            }
        });
    dst
}

/// 3x3 convolution on R,G,B with clamp-to-edge sampling; alpha copied through.
fn convolve_rgb_3x3(src: &[u8], width: u32, height: u32, kernel: &[f32; 9]) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let row_bytes = w * BYTES_PER_PIXEL;

    let mut dst = vec![0u8; src.len()];
    dst.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let mut acc = [0.0f32; 3];
                for ky in 0..3 {
                    for kx in 0..3 {
                        let sx = (x as isize + kx as isize - 1).clamp(0, w as isize - 1) as usize;
                        let sy = (y as isize + ky as isize - 1).clamp(0, h as isize - 1) as usize;
                        let px = &src[(sy * w + sx) * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
                        let weight = kernel[ky * 3 + kx];
                        for c in 0..3 {
                            acc[c] += px[c] as f32 * weight;
                        }
                    }
                }
                let idx = x * BYTES_PER_PIXEL;
                for c in 0..3 {
                    row[idx + c] = acc[c].clamp(0.0, 255.0).round() as u8;
                }
                row[idx + 3] = src[y * row_bytes + idx + 3];
            }
        });
    dst
}
