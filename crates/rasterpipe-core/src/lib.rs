//! # rasterpipe-core
//!
//! Owned RGBA8 pixel buffers and the filter kernels that operate on them.
//!
//! This crate is the numeric heart of rasterpipe: it defines exact, documented
//! semantics for every filter and owns all pixel memory. Everything above it
//! (the C-ABI bridge, the safe wrapper, the ML preprocessing pipeline) drives
//! this code.
//!
//! # Types
//!
//! - [`PixelBuffer`] - contiguous row-major RGBA8 buffer with its size
//!   invariant enforced at every observable point
//! - [`FilterOp`] - typed tagged filter operation (no strings)
//! - [`CoreError`] / [`CoreResult`] - geometry and copy-out failures
//!
//! # Guarantees
//!
//! - Filters are total over valid buffers: no panics, no failures.
//! - Dimension-changing operations (resize) build the result in scratch and
//!   swap on success; a failed call leaves the buffer in its last-valid state.
//! - Point operations are data-parallel, convolutions row-parallel (rayon).
//!
//! # Example
//!
//! ```rust
//! use rasterpipe_core::{FilterOp, PixelBuffer};
//!
//! let mut buf = PixelBuffer::from_rgba8(vec![0u8; 8 * 8 * 4], 8, 8).unwrap();
//! buf.apply(FilterOp::Brightness(0.25));
//! buf.resize(4, 4).unwrap();
//! assert_eq!(buf.byte_len(), 4 * 4 * 4);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod filters;
pub mod resize;

pub use buffer::{PixelBuffer, BYTES_PER_PIXEL};
pub use error::{CoreError, CoreResult};
pub use filters::{luma, FilterOp, LUMA_B, LUMA_G, LUMA_R};
