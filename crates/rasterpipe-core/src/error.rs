//! Error types for pixel buffer operations.
//!
//! Every fallible operation in this crate reports one of the variants below.
//! Filters themselves are total over valid buffers and cannot fail; errors
//! only arise from geometry (construction, resize) and copy-out sizing.

use thiserror::Error;

/// Result type alias using [`CoreError`] as the error type.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while constructing or copying pixel buffers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Buffer geometry is unusable: zero area, a byte length that disagrees
    /// with `width * height * 4`, or dimensions that overflow the buffer
    /// size calculation.
    #[error("invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// A caller-supplied destination buffer has the wrong size.
    ///
    /// Copy-out requires an exact match; nothing is written on failure.
    #[error("size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch {
        /// Required byte count
        expected: usize,
        /// Byte count supplied by the caller
        got: usize,
    },
}

impl CoreError {
    /// Creates an [`CoreError::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`CoreError::SizeMismatch`] error.
    #[inline]
    pub fn size_mismatch(expected: usize, got: usize) -> Self {
        Self::SizeMismatch { expected, got }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions_message() {
        let err = CoreError::invalid_dimensions(0, 7, "zero area");
        let msg = err.to_string();
        assert!(msg.contains("0x7"));
        assert!(msg.contains("zero area"));
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = CoreError::size_mismatch(16, 12);
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("12"));
    }
}
