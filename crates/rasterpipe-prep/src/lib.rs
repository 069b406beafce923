//! # rasterpipe-prep
//!
//! Safe wrapper and ML preprocessing pipeline over the rasterpipe bridge.
//!
//! This crate is the caller-facing surface of rasterpipe. It marshals
//! decoded images (grayscale, RGB, or RGBA byte arrays) across the C-ABI
//! handle bridge, drives the native filter set, and turns the results into
//! planar tensors ready for ML-framework consumption.
//!
//! # Layers
//!
//! - [`Processor`] - owns exactly one bridge handle; load, chainable
//!   filters, read-out; the handle is freed exactly once
//! - [`PreprocessConfig`] / [`parse_filter`] - typed configuration with a
//!   thin text boundary for `"name:value"` filter tokens
//! - [`Preprocessor`] - the configuration-driven pipeline: filters, resize,
//!   channel selection, normalization, dtype cast, planar layout, batching
//! - [`Tensor`] - planar `(C, H, W)` / `(N, C, H, W)` results in f32, f16,
//!   or u8
//!
//! # Example
//!
//! ```rust
//! use ndarray::ArrayD;
//! use rasterpipe_prep::{parse_filters, PreprocessConfig, Preprocessor};
//!
//! let config = PreprocessConfig {
//!     target_size: Some((224, 224)),
//!     filters: parse_filters(&["sharpen", "contrast:1.1"]).unwrap(),
//!     ..PreprocessConfig::default()
//! };
//! let mut pre = Preprocessor::new(config);
//!
//! let image = ArrayD::<u8>::zeros(ndarray::IxDyn(&[480, 640, 3]));
//! let tensor = pre.process(&image).unwrap();
//! assert_eq!(tensor.shape(), &[3, 224, 224]);
//! ```
//!
//! # Concurrency
//!
//! Everything here is single-threaded and synchronous. A [`Processor`] (and
//! therefore a [`Preprocessor`]) is not `Send`: use one instance per thread.
//! Batch processing is sequential by design; parallelize across images by
//! giving each worker its own instance.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod tensor;

pub use config::{
    parse_filter, parse_filters, OutputChannels, OutputDtype, PreprocessConfig, IMAGENET_MEAN,
    IMAGENET_STD,
};
pub use error::{PrepError, PrepResult};
pub use pipeline::Preprocessor;
pub use processor::Processor;
pub use tensor::Tensor;

// The typed filter operation is part of this crate's public API surface.
pub use rasterpipe_core::FilterOp;
