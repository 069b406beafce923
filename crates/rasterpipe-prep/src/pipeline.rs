//! Configuration-driven preprocessing pipeline.
//!
//! [`Preprocessor`] turns decoded images into ML-ready planar tensors. Each
//! [`process`](Preprocessor::process) call runs a fixed step order:
//!
//! 1. load (format coercion to RGBA8)
//! 2. configured filter chain, in order
//! 3. resize to `target_size`, if set
//! 4. grayscale, if `to_grayscale`
//! 5. read out RGBA8
//! 6. channel selection (4 keep / 3 drop alpha / 1 gray-or-mean)
//! 7. normalization (`x/255`, then `(x - mean[c]) / std[c]`)
//! 8. dtype cast (f32, f16, or u8 with denormalization)
//! 9. planar `(C, H, W)` layout
//!
//! A filter failure aborts the current image immediately; filters already
//! applied remain applied (no rollback). Batches are strictly sequential and
//! atomic: one failing image fails the whole call with no partial result.
//!
//! # Example
//!
//! ```rust
//! use ndarray::ArrayD;
//! use rasterpipe_prep::{OutputChannels, PreprocessConfig, Preprocessor};
//!
//! let config = PreprocessConfig {
//!     target_size: Some((4, 4)),
//!     normalize: false,
//!     output_channels: OutputChannels::Gray,
//!     to_grayscale: true,
//!     ..PreprocessConfig::default()
//! };
//! let mut pre = Preprocessor::new(config);
//! let image = ArrayD::<u8>::zeros(ndarray::IxDyn(&[8, 8, 3]));
//! let tensor = pre.process(&image).unwrap();
//! assert_eq!(tensor.shape(), &[1, 4, 4]);
//! ```

use half::f16;
use ndarray::{ArrayD, IxDyn};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::config::{OutputChannels, OutputDtype, PreprocessConfig};
use crate::error::{PrepError, PrepResult};
use crate::processor::Processor;
use crate::tensor::Tensor;

/// Configuration-driven image preprocessor.
///
/// Owns one [`Processor`] which is fully reloaded per image, so no pixel
/// data leaks between items; only the handle slot is reused. Construct
/// explicitly and pass where needed; there is no global instance.
#[derive(Debug, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
    processor: Processor,
}

impl Preprocessor {
    /// Creates a preprocessor with the given configuration.
    pub fn new(config: PreprocessConfig) -> Self {
        Self {
            config,
            processor: Processor::new(),
        }
    }

    /// The active configuration (read-only for this instance's lifetime).
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Processes a single image into a planar `(C, H, W)` tensor.
    ///
    /// # Errors
    ///
    /// Any taxonomy member from loading or filtering; the first failure
    /// aborts the call.
    pub fn process(&mut self, image: &ArrayD<u8>) -> PrepResult<Tensor> {
        self.processor.load(image)?;
        for &op in &self.config.filters {
            self.processor.apply(op)?;
        }
        if let Some((width, height)) = self.config.target_size {
            self.processor.resize(width, height)?;
        }
        if self.config.to_grayscale {
            self.processor.grayscale()?;
        }

        let rgba = self.processor.read_out()?;
        let (height, width) = (rgba.shape()[0], rgba.shape()[1]);
        debug!(
            width,
            height,
            filters = self.config.filters.len(),
            "image processed"
        );

        let channels = self.config.output_channels.count();
        let interleaved = self.select_channels(rgba.iter().copied().collect::<Vec<u8>>());
        let planar = self.finalize(interleaved, channels, height, width);
        let shape = IxDyn(&[channels, height, width]);

        match self.config.output_dtype {
            OutputDtype::F32 => ArrayD::from_shape_vec(shape, planar)
                .map(Tensor::F32)
                .map_err(|e| PrepError::InvalidShape(e.to_string())),
            OutputDtype::F16 => {
                let halves: Vec<f16> = planar.iter().map(|&v| f16::from_f32(v)).collect();
                ArrayD::from_shape_vec(shape, halves)
                    .map(Tensor::F16)
                    .map_err(|e| PrepError::InvalidShape(e.to_string()))
            }
            OutputDtype::U8 => {
                let bytes: Vec<u8> = planar
                    .iter()
                    .map(|&v| v.round().clamp(0.0, 255.0) as u8)
                    .collect();
                ArrayD::from_shape_vec(shape, bytes)
                    .map(Tensor::U8)
                    .map_err(|e| PrepError::InvalidShape(e.to_string()))
            }
        }
    }

    /// Processes a batch of images, strictly in input order.
    ///
    /// Returns a tensor with a new leading batch axis `(N, C, H, W)`. Fails
    /// atomically: if any image fails, no partial batch is returned.
    pub fn process_batch(&mut self, images: &[ArrayD<u8>]) -> PrepResult<Tensor> {
        self.process_batch_with_progress(images, |_, _| {})
    }

    /// Like [`process_batch`](Self::process_batch), invoking
    /// `progress(completed, total)` after each image: 1-based, monotonically
    /// increasing, exactly once per image, in order.
    pub fn process_batch_with_progress<F>(
        &mut self,
        images: &[ArrayD<u8>],
        mut progress: F,
    ) -> PrepResult<Tensor>
    where
        F: FnMut(usize, usize),
    {
        if images.is_empty() {
            return Err(PrepError::EmptyBatch);
        }
        let total = images.len();
        let mut results = Vec::with_capacity(total);
        for (i, image) in images.iter().enumerate() {
            results.push(self.process(image)?);
            progress(i + 1, total);
        }
        Tensor::stack(results)
    }

    /// Step 6: interleaved RGBA bytes to interleaved f32 with the configured
    /// channel count.
    fn select_channels(&self, raw: Vec<u8>) -> Vec<f32> {
        match self.config.output_channels {
            OutputChannels::Rgba => raw.iter().map(|&b| b as f32).collect(),
            OutputChannels::Rgb => raw
                .chunks_exact(4)
                .flat_map(|px| [px[0] as f32, px[1] as f32, px[2] as f32])
                .collect(),
            OutputChannels::Gray => raw
                .chunks_exact(4)
                .map(|px| {
                    if self.config.to_grayscale {
                        // Channels are already equal; take the gray channel.
                        px[0] as f32
                    } else {
                        (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0
                    }
                })
                .collect(),
        }
    }

    /// Steps 7 and 9: normalization (and u8 denormalization) plus the
    /// interleaved-to-planar transpose.
    fn finalize(&self, values: Vec<f32>, channels: usize, height: usize, width: usize) -> Vec<f32> {
        let plane = height * width;
        let mut planar = vec![0.0f32; values.len()];
        for c in 0..channels {
            // Alpha (channel 3) has no configured statistics; it passes
            // through normalization untouched.
            let (mean, std) = if c < 3 {
                (self.config.mean[c], self.config.std[c])
            } else {
                (0.0, 1.0)
            };
            for i in 0..plane {
                let mut v = values[i * channels + c];
                if self.config.normalize {
                    v = (v / 255.0 - mean) / std;
                    if self.config.output_dtype == OutputDtype::U8 {
                        // Cast target is bytes: invert the normalization to
                        // land back in [0, 255].
                        v = (v * std + mean) * 255.0;
                    }
                }
                planar[c * plane + i] = v;
            }
        }
        planar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_filters;
    use approx::assert_relative_eq;
    use ndarray::{Array, IxDyn};
    use rasterpipe_core::FilterOp;

    fn solid_rgb(h: usize, w: usize, rgb: [u8; 3]) -> ArrayD<u8> {
        Array::from_shape_fn(IxDyn(&[h, w, 3]), |idx| rgb[idx[2]])
    }

    #[test]
    fn test_output_shape_matches_target_size() {
        // target_size is (width, height); output is (C, H, W).
        let config = PreprocessConfig {
            target_size: Some((4, 6)),
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let tensor = pre.process(&solid_rgb(10, 12, [50, 100, 150])).unwrap();
        assert_eq!(tensor.shape(), &[3, 6, 4]);
    }

    #[test]
    fn test_normalization_math() {
        let config = PreprocessConfig {
            normalize: true,
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let tensor = pre.process(&solid_rgb(2, 2, [255, 0, 128])).unwrap();
        let arr = tensor.as_f32().unwrap();
        assert_relative_eq!(arr[[0, 0, 0]], 1.0, epsilon = 1e-6);
        assert_relative_eq!(arr[[1, 0, 0]], -1.0, epsilon = 1e-6);
        assert_relative_eq!(arr[[2, 0, 0]], (128.0 / 255.0 - 0.5) / 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_no_normalize_keeps_byte_range() {
        let config = PreprocessConfig {
            normalize: false,
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let tensor = pre.process(&solid_rgb(2, 2, [7, 77, 177])).unwrap();
        let arr = tensor.as_f32().unwrap();
        assert_eq!(arr[[0, 1, 1]], 7.0);
        assert_eq!(arr[[1, 0, 1]], 77.0);
        assert_eq!(arr[[2, 1, 0]], 177.0);
    }

    #[test]
    fn test_u8_output_denormalizes_back_to_bytes() {
        let config = PreprocessConfig {
            normalize: true,
            output_dtype: OutputDtype::U8,
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let tensor = pre.process(&solid_rgb(2, 2, [13, 130, 250])).unwrap();
        let arr = tensor.as_u8().unwrap();
        assert_eq!(arr[[0, 0, 0]], 13);
        assert_eq!(arr[[1, 0, 0]], 130);
        assert_eq!(arr[[2, 0, 0]], 250);
    }

    #[test]
    fn test_f16_output_narrows() {
        let config = PreprocessConfig {
            normalize: false,
            output_dtype: OutputDtype::F16,
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let tensor = pre.process(&solid_rgb(2, 2, [64, 0, 0])).unwrap();
        let arr = tensor.as_f16().unwrap();
        assert_eq!(arr[[0, 0, 0]], f16::from_f32(64.0));
    }

    #[test]
    fn test_rgba_output_keeps_alpha_plane() {
        let config = PreprocessConfig {
            normalize: false,
            output_channels: OutputChannels::Rgba,
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let tensor = pre.process(&solid_rgb(2, 3, [10, 20, 30])).unwrap();
        assert_eq!(tensor.shape(), &[4, 2, 3]);
        let arr = tensor.as_f32().unwrap();
        assert_eq!(arr[[3, 1, 2]], 255.0);
    }

    #[test]
    fn test_gray_output_uses_gray_channel_when_grayscaled() {
        let config = PreprocessConfig {
            normalize: false,
            to_grayscale: true,
            output_channels: OutputChannels::Gray,
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        // luma(200,100,50) = 124
        let tensor = pre.process(&solid_rgb(3, 3, [200, 100, 50])).unwrap();
        let arr = tensor.as_f32().unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 3]);
        assert!(arr.iter().all(|&v| v == 124.0));
    }

    #[test]
    fn test_gray_output_means_rgb_without_grayscale() {
        let config = PreprocessConfig {
            normalize: false,
            to_grayscale: false,
            output_channels: OutputChannels::Gray,
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let tensor = pre.process(&solid_rgb(2, 2, [30, 60, 90])).unwrap();
        let arr = tensor.as_f32().unwrap();
        assert!(arr.iter().all(|&v| (v - 60.0).abs() < 1e-5));
    }

    #[test]
    fn test_string_and_typed_filters_agree() {
        let image = solid_rgb(4, 4, [90, 140, 30]);

        let typed = PreprocessConfig {
            normalize: false,
            filters: vec![FilterOp::Brightness(0.5)],
            ..PreprocessConfig::default()
        };
        let parsed = PreprocessConfig {
            normalize: false,
            filters: parse_filters(&["brightness:0.5"]).unwrap(),
            ..PreprocessConfig::default()
        };

        let a = Preprocessor::new(typed).process(&image).unwrap();
        let b = Preprocessor::new(parsed).process(&image).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_filter_chain_composes_with_resize() {
        // Contrast 0 collapses every channel to exactly 128; the downscale
        // of a flat image is still flat, so the result is exact.
        let config = PreprocessConfig {
            normalize: false,
            filters: vec![FilterOp::Contrast(0.0)],
            target_size: Some((2, 2)),
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let image = Array::from_shape_fn(IxDyn(&[8, 8, 3]), |idx| (idx[0] * 30 + idx[1]) as u8);
        let tensor = pre.process(&image).unwrap();
        let arr = tensor.as_f32().unwrap();
        assert!(arr.iter().all(|&v| v == 128.0));
    }

    #[test]
    fn test_zero_target_size_surfaces_operation_failed() {
        let config = PreprocessConfig {
            target_size: Some((0, 4)),
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config);
        let err = pre.process(&solid_rgb(4, 4, [1, 2, 3])).unwrap_err();
        assert!(matches!(
            err,
            PrepError::OperationFailed { op: "resize", .. }
        ));

        // The same failure aborts a batch with no partial result.
        let err = pre
            .process_batch(&[solid_rgb(4, 4, [1, 2, 3])])
            .unwrap_err();
        assert!(matches!(err, PrepError::OperationFailed { .. }));
    }

    #[test]
    fn test_batch_progress_and_order() {
        let config = PreprocessConfig {
            normalize: false,
            target_size: Some((2, 2)),
            ..PreprocessConfig::default()
        };
        let mut pre = Preprocessor::new(config.clone());
        let images = vec![
            solid_rgb(4, 4, [10, 10, 10]),
            solid_rgb(6, 6, [20, 20, 20]),
            solid_rgb(8, 8, [30, 30, 30]),
        ];

        let mut calls = Vec::new();
        let batch = pre
            .process_batch_with_progress(&images, |done, total| calls.push((done, total)))
            .unwrap();
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(batch.shape(), &[3, 3, 2, 2]);

        // Each slice equals the individually processed image.
        let arr = batch.as_f32().unwrap();
        for (i, image) in images.iter().enumerate() {
            let single = Preprocessor::new(config.clone()).process(image).unwrap();
            let single = single.as_f32().unwrap().clone();
            let slice = arr.index_axis(ndarray::Axis(0), i);
            assert_eq!(slice, single.view());
        }
    }

    #[test]
    fn test_batch_fails_atomically() {
        let mut pre = Preprocessor::new(PreprocessConfig::default());
        let bad = Array::<u8, _>::zeros(IxDyn(&[2, 2, 2])).into_dyn();
        let images = vec![solid_rgb(4, 4, [1, 1, 1]), bad, solid_rgb(4, 4, [2, 2, 2])];

        let mut calls = Vec::new();
        let err = pre
            .process_batch_with_progress(&images, |done, total| calls.push((done, total)))
            .unwrap_err();
        assert!(matches!(err, PrepError::InvalidShape(_)));
        // Only the image before the failure reported progress.
        assert_eq!(calls, vec![(1, 3)]);
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let mut pre = Preprocessor::new(PreprocessConfig::default());
        assert!(matches!(
            pre.process_batch(&[]).unwrap_err(),
            PrepError::EmptyBatch
        ));
    }
}
