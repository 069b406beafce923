//! Error taxonomy for the wrapper and pipeline layers.
//!
//! The bridge below reports success or failure only; this crate translates
//! those results, plus its own marshalling checks, into the variants here.
//! There is no automatic retry anywhere: every failure is fatal to the
//! current call and surfaced to the caller.

use thiserror::Error;

/// Result type alias using [`PrepError`] as the error type.
pub type PrepResult<T> = std::result::Result<T, PrepError>;

/// Errors raised by the processor wrapper and preprocessing pipeline.
#[derive(Debug, Error)]
pub enum PrepError {
    /// The input array has an unsupported rank or channel count.
    ///
    /// `load` accepts rank-2 (grayscale) and rank-3 with 3 or 4 channels on
    /// the last axis.
    #[error("invalid input shape: {0}")]
    InvalidShape(String),

    /// The input image has zero area.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Input width
        width: u32,
        /// Input height
        height: u32,
    },

    /// An operation was requested with no image loaded.
    #[error("no image loaded")]
    NotLoaded,

    /// The bridge returned a non-zero result code.
    ///
    /// Codes are not distinguished further; all non-zero results map here.
    #[error("operation '{op}' failed with code {code}")]
    OperationFailed {
        /// Name of the failed operation
        op: &'static str,
        /// Bridge result code
        code: i32,
    },

    /// A filter token at the text configuration boundary did not parse.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// `process_batch` was called with no images.
    #[error("empty batch")]
    EmptyBatch,
}
