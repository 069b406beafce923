//! # rasterpipe-capi
//!
//! C-ABI handle bridge over [`rasterpipe_core`] pixel buffers.
//!
//! This crate is the stable boundary surface of rasterpipe: callers that
//! cannot share Rust objects (foreign runtimes, dynamic loading) work with an
//! opaque [`RasterHandle`] pointer and a fixed operation set.
//!
//! # Contract
//!
//! - Pixel format is RGBA8, row-major, no row padding,
//!   `width * height * 4` bytes.
//! - [`rasterpipe_create`] copies the caller's bytes; the handle owns its
//!   buffer and never aliases caller memory after the call returns.
//! - Every handle must be released exactly once with [`rasterpipe_free`];
//!   freeing a null handle is a no-op.
//! - Mutating operations return `0` on success and a non-zero code on
//!   failure. The codes carry no finer meaning; callers must treat any
//!   non-zero result as a single failure kind.
//! - [`rasterpipe_get_data`] returns a read-only view that is invalidated by
//!   the next mutating call on the same handle.
//!
//! # Example
//!
//! ```rust
//! use rasterpipe_capi::*;
//!
//! let pixels = vec![0u8; 2 * 2 * 4];
//! unsafe {
//!     let handle = rasterpipe_create(pixels.as_ptr(), 2, 2);
//!     assert!(!handle.is_null());
//!     assert_eq!(rasterpipe_invert(handle), 0);
//!     rasterpipe_free(handle);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::ffi::c_char;
use std::slice;

use rasterpipe_core::PixelBuffer;
use tracing::trace;

/// Success result code.
pub const RASTERPIPE_OK: i32 = 0;
/// A null handle (or null data pointer) was passed.
pub const RASTERPIPE_ERR_NULL: i32 = -1;
/// The operation itself failed (bad geometry, mismatched size).
pub const RASTERPIPE_ERR_OPERATION: i32 = -2;

/// Opaque handle owning exactly one pixel buffer.
///
/// Foreign callers only ever see `*mut RasterHandle`; the layout is not part
/// of the ABI.
pub struct RasterHandle {
    buffer: PixelBuffer,
}

/// Runs `f` against the handle's buffer, mapping a null handle to
/// [`RASTERPIPE_ERR_NULL`].
///
/// # Safety
///
/// `handle` must be null or a live pointer from [`rasterpipe_create`].
unsafe fn with_buffer<F>(handle: *mut RasterHandle, f: F) -> i32
where
    F: FnOnce(&mut PixelBuffer) -> i32,
{
    match unsafe { handle.as_mut() } {
        Some(h) => f(&mut h.buffer),
        None => RASTERPIPE_ERR_NULL,
    }
}

/// Creates a handle from raw RGBA8 data.
///
/// The `width * height * 4` bytes at `data` are copied; the caller keeps
/// ownership of its own memory. Returns null on a null `data` pointer, zero
/// area, or a byte size that overflows.
///
/// # Safety
///
/// - `data` must be null or valid for reads of `width * height * 4` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_create(
    data: *const u8,
    width: u32,
    height: u32,
) -> *mut RasterHandle {
    if data.is_null() {
        return std::ptr::null_mut();
    }
    let len = match (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
    {
        Some(len) if len > 0 => len,
        _ => return std::ptr::null_mut(),
    };

    let bytes = unsafe { slice::from_raw_parts(data, len) };
    match PixelBuffer::from_rgba8(bytes.to_vec(), width, height) {
        Ok(buffer) => {
            trace!(width, height, "handle created");
            Box::into_raw(Box::new(RasterHandle { buffer }))
        }
        Err(_) => std::ptr::null_mut(),
    }
}

/// Releases a handle. Idempotent no-op on null; a non-null handle must be
/// released exactly once.
///
/// # Safety
///
/// `handle` must be null or a live pointer from [`rasterpipe_create`] that
/// has not been freed before.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_free(handle: *mut RasterHandle) {
    if !handle.is_null() {
        trace!("handle freed");
        drop(unsafe { Box::from_raw(handle) });
    }
}

/// Current buffer width in pixels; 0 on a null handle.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_get_width(handle: *const RasterHandle) -> u32 {
    match unsafe { handle.as_ref() } {
        Some(h) => h.buffer.width(),
        None => 0,
    }
}

/// Current buffer height in pixels; 0 on a null handle.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_get_height(handle: *const RasterHandle) -> u32 {
    match unsafe { handle.as_ref() } {
        Some(h) => h.buffer.height(),
        None => 0,
    }
}

/// Current buffer size in bytes (`width * height * 4`); 0 on a null handle.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_get_data_size(handle: *const RasterHandle) -> usize {
    match unsafe { handle.as_ref() } {
        Some(h) => h.buffer.byte_len(),
        None => 0,
    }
}

/// Read-only pointer to the pixel bytes; null on a null handle.
///
/// The pointer is valid until the next mutating call (any filter, resize, or
/// free) on the same handle.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_get_data(handle: *const RasterHandle) -> *const u8 {
    match unsafe { handle.as_ref() } {
        Some(h) => h.buffer.as_bytes().as_ptr(),
        None => std::ptr::null(),
    }
}

/// Applies the grayscale filter.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_grayscale(handle: *mut RasterHandle) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.grayscale();
            RASTERPIPE_OK
        })
    }
}

/// Applies the brightness filter; `value` nominally in `[-1, 1]`.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_brightness(handle: *mut RasterHandle, value: f32) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.brightness(value);
            RASTERPIPE_OK
        })
    }
}

/// Applies the contrast filter; `value >= 0`, 1 is identity.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_contrast(handle: *mut RasterHandle, value: f32) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.contrast(value);
            RASTERPIPE_OK
        })
    }
}

/// Applies a Gaussian blur; `sigma <= 0` is a successful no-op.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_blur(handle: *mut RasterHandle, sigma: f32) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.blur(sigma);
            RASTERPIPE_OK
        })
    }
}

/// Applies the sharpen filter.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_sharpen(handle: *mut RasterHandle) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.sharpen();
            RASTERPIPE_OK
        })
    }
}

/// Applies Sobel edge detection.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_edge_detect(handle: *mut RasterHandle) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.edge_detect();
            RASTERPIPE_OK
        })
    }
}

/// Inverts R,G,B.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_invert(handle: *mut RasterHandle) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.invert();
            RASTERPIPE_OK
        })
    }
}

/// Applies the sepia tone matrix.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_sepia(handle: *mut RasterHandle) -> i32 {
    unsafe {
        with_buffer(handle, |buf| {
            buf.sepia();
            RASTERPIPE_OK
        })
    }
}

/// Resizes the buffer (bilinear). Fails on zero target area; on failure the
/// buffer and its dimensions are unchanged.
///
/// # Safety
///
/// `handle` must be null or a live handle pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_resize(
    handle: *mut RasterHandle,
    new_width: u32,
    new_height: u32,
) -> i32 {
    unsafe {
        with_buffer(handle, |buf| match buf.resize(new_width, new_height) {
            Ok(()) => RASTERPIPE_OK,
            Err(_) => RASTERPIPE_ERR_OPERATION,
        })
    }
}

/// Copies the pixel bytes into a caller-supplied buffer.
///
/// `dst_len` must equal [`rasterpipe_get_data_size`] exactly; on any failure
/// nothing is written to `dst`.
///
/// # Safety
///
/// - `handle` must be null or a live handle pointer.
/// - `dst` must be null or valid for writes of `dst_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rasterpipe_copy_to(
    handle: *const RasterHandle,
    dst: *mut u8,
    dst_len: usize,
) -> i32 {
    let Some(h) = (unsafe { handle.as_ref() }) else {
        return RASTERPIPE_ERR_NULL;
    };
    if dst.is_null() {
        return RASTERPIPE_ERR_NULL;
    }
    let out = unsafe { slice::from_raw_parts_mut(dst, dst_len) };
    match h.buffer.copy_to(out) {
        Ok(()) => RASTERPIPE_OK,
        Err(_) => RASTERPIPE_ERR_OPERATION,
    }
}

/// Static NUL-terminated build identifier.
#[unsafe(no_mangle)]
pub extern "C" fn rasterpipe_version() -> *const c_char {
    static VERSION: &[u8] = concat!("rasterpipe ", env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
